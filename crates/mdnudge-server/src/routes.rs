use mdnudge_engine::service::{
    FileRequest, Service, ServiceError, UpdatePositionRequest, UpdateResponse, UpdateSizeRequest,
};
use serde::de::DeserializeOwned;

use crate::http::{Request, Response};

/// Dispatch one request to the service.
pub fn handle(service: &Service, request: &Request) -> Response {
    match (request.method.as_str(), request.path.as_str()) {
        ("OPTIONS", _) => Response::no_content(),
        ("GET", "/health") => Response::json(200, &service.health()),
        ("POST", "/update-position") => {
            call(request, |body: UpdatePositionRequest| service.update_position(&body))
        }
        ("POST", "/update-size") => {
            call(request, |body: UpdateSizeRequest| service.update_size(&body))
        }
        ("POST", "/undo") => call(request, |body: FileRequest| service.undo(&body)),
        ("POST", "/redo") => call(request, |body: FileRequest| service.redo(&body)),
        ("POST", "/save") => call(request, |body: FileRequest| service.save(&body)),
        (_, "/health" | "/update-position" | "/update-size" | "/undo" | "/redo" | "/save") => {
            Response::error(405, "Method not allowed")
        }
        _ => Response::error(404, "Not found"),
    }
}

/// Parse the body as `T` and run `operation`; an empty body reads as `{}`.
fn call<T, F>(request: &Request, operation: F) -> Response
where
    T: DeserializeOwned + Default,
    F: FnOnce(T) -> Result<UpdateResponse, ServiceError>,
{
    let body = if request.body.iter().all(u8::is_ascii_whitespace) {
        T::default()
    } else {
        match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Rejected body for {}: {e}", request.path);
                return Response::error(400, format!("Invalid JSON body: {e}"));
            }
        }
    };

    match operation(body) {
        Ok(response) => Response::json(200, &response),
        Err(e) => {
            log::warn!("{} failed: {e}", request.path);
            Response::json(e.status(), &e.to_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdnudge_engine::Workspace;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn request(method: &str, path: &str, body: &str) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn body(response: &Response) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    fn service() -> (TempDir, Service) {
        let root = TempDir::new().unwrap();
        std::fs::write(
            root.path().join("deck.qmd"),
            "![](a.png){.absolute top=10% left=20%}\n",
        )
        .unwrap();
        let service = Service::new(Arc::new(Workspace::new(vec![root.path().to_path_buf()])));
        (root, service)
    }

    #[test]
    fn test_health() {
        let (_root, service) = service();

        let response = handle(&service, &request("GET", "/health", ""));

        assert_eq!(response.status, 200);
        assert_eq!(body(&response), serde_json::json!({"status": "ok"}));
    }

    #[test]
    fn test_update_position() {
        let (_root, service) = service();
        let json = r#"{"fileName":"deck","mdIndex":0,"top":30,"left":40,"currentTop":"10","currentLeft":"20","classList":["absolute"]}"#;

        let response = handle(&service, &request("POST", "/update-position", json));

        assert_eq!(response.status, 200);
        assert_eq!(
            body(&response),
            serde_json::json!({"success": true, "message": "Position updated (not saved)"})
        );
    }

    #[test]
    fn test_update_position_with_string_index() {
        // Given an index hint read from a data attribute, so a string
        let (_root, service) = service();
        let json = r#"{"fileName":"deck","mdIndex":"2","top":30,"left":40,"currentTop":"10","currentLeft":"20","classList":["absolute"]}"#;

        // When posting the move
        let response = handle(&service, &request("POST", "/update-position", json));

        // Then it is accepted like a numeric index
        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["success"], true);
    }

    #[test]
    fn test_save_over_hand_edit_is_conflict() {
        let (root, service) = service();
        let json = r#"{"fileName":"deck","mdIndex":0,"top":30,"left":40,"currentTop":"10","currentLeft":"20"}"#;
        handle(&service, &request("POST", "/update-position", json));
        let path = root.path().join("deck.qmd");
        std::fs::write(&path, "# Added by hand\n![](a.png){.absolute top=10% left=20%}\n").unwrap();

        let response = handle(&service, &request("POST", "/save", r#"{"fileName":"deck"}"#));

        assert_eq!(response.status, 409);
        assert_eq!(
            body(&response),
            serde_json::json!({"error": "File changed on disk since it was loaded; not saved"})
        );
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("# Added by hand\n"));
    }

    #[test]
    fn test_empty_body_is_missing_parameters() {
        let (_root, service) = service();

        let response = handle(&service, &request("POST", "/update-size", ""));

        assert_eq!(response.status, 400);
        assert_eq!(
            body(&response),
            serde_json::json!({"error": "Missing required parameters"})
        );
    }

    #[test]
    fn test_invalid_json() {
        let (_root, service) = service();

        let response = handle(&service, &request("POST", "/undo", "{not json"));

        assert_eq!(response.status, 400);
        assert!(body(&response)["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_element_not_found_is_404() {
        let (_root, service) = service();
        let json = r#"{"fileName":"deck","mdIndex":0,"top":1,"left":1,"currentTop":"99","currentLeft":"99"}"#;

        let response = handle(&service, &request("POST", "/update-position", json));

        assert_eq!(response.status, 404);
        assert_eq!(body(&response), serde_json::json!({"error": "Element not found"}));
    }

    #[test]
    fn test_preflight_and_unknown_routes() {
        let (_root, service) = service();

        assert_eq!(handle(&service, &request("OPTIONS", "/update-position", "")).status, 204);
        assert_eq!(handle(&service, &request("GET", "/nope", "")).status, 404);
        assert_eq!(handle(&service, &request("GET", "/undo", "")).status, 405);
    }
}
