//! Just enough HTTP/1.1 for a browser preview talking to localhost:
//! one request per connection, `Content-Length` bodies, JSON responses.

use std::io::{self, BufRead, Read, Write};

use serde::Serialize;

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
const MAX_LINE_BYTES: u64 = 8 * 1024;
const MAX_HEADERS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Request body exceeds {MAX_BODY_BYTES} bytes")]
    BodyTooLarge,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl HttpError {
    pub fn status(&self) -> u16 {
        match self {
            HttpError::Malformed(_) | HttpError::Io(_) => 400,
            HttpError::BodyTooLarge => 413,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Path without query string
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                log::error!("Failed to serialize response: {e}");
                Self {
                    status: 500,
                    body: br#"{"error":"Failed to serialize response"}"#.to_vec(),
                }
            }
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &serde_json::json!({ "error": message.into() }))
    }

    /// Empty answer to a CORS preflight
    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: Vec::new(),
        }
    }
}

fn read_line(reader: &mut impl BufRead) -> Result<Option<String>, HttpError> {
    let mut line = String::new();
    let read = reader.by_ref().take(MAX_LINE_BYTES).read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') {
        return Err(HttpError::Malformed("line too long".to_string()));
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Read one request: request line, headers and a `Content-Length` body.
pub fn read_request(reader: &mut impl BufRead) -> Result<Request, HttpError> {
    let request_line =
        read_line(reader)?.ok_or_else(|| HttpError::Malformed("empty request".to_string()))?;
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::Malformed(format!(
            "bad request line: {request_line}"
        )));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::Malformed(format!("unsupported version {version}")));
    }
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut headers = Vec::new();
    loop {
        let line = read_line(reader)?
            .ok_or_else(|| HttpError::Malformed("unexpected end of headers".to_string()))?;
        if line.is_empty() {
            break;
        }
        if headers.len() == MAX_HEADERS {
            return Err(HttpError::Malformed("too many headers".to_string()));
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(HttpError::Malformed(format!("bad header: {line}")));
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let mut request = Request {
        method: method.to_ascii_uppercase(),
        path,
        headers,
        body: Vec::new(),
    };

    let length = match request.header("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| HttpError::Malformed(format!("bad Content-Length: {value}")))?,
        None => 0,
    };
    if length > MAX_BODY_BYTES {
        return Err(HttpError::BodyTooLarge);
    }
    request.body = vec![0; length];
    reader.read_exact(&mut request.body)?;

    Ok(request)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        _ => "Internal Server Error",
    }
}

/// Write `response` with CORS headers and close semantics.
pub fn write_response(writer: &mut impl Write, response: &Response) -> io::Result<()> {
    write!(writer, "HTTP/1.1 {} {}\r\n", response.status, reason(response.status))?;
    writer.write_all(b"Access-Control-Allow-Origin: *\r\n")?;
    writer.write_all(b"Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n")?;
    writer.write_all(b"Access-Control-Allow-Headers: Content-Type\r\n")?;
    if !response.body.is_empty() {
        writer.write_all(b"Content-Type: application/json\r\n")?;
    }
    write!(writer, "Content-Length: {}\r\n", response.body.len())?;
    writer.write_all(b"Connection: close\r\n\r\n")?;
    writer.write_all(&response.body)?;
    writer.flush()
}
