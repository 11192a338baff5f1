use std::io::{self, BufReader};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mdnudge_engine::Service;

use crate::http::{self, Response};
use crate::routes;

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// A bound listener that has not started accepting yet.
pub struct Server {
    listener: TcpListener,
    service: Arc<Service>,
    shutdown: Arc<AtomicBool>,
}

/// Running accept loop; see [`ServerHandle::shutdown`].
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Server {
    pub fn bind(addr: impl ToSocketAddrs, service: Arc<Service>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            service,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections on the current thread until shut down.
    pub fn run(self) {
        accept_loop(&self.listener, &self.service, &self.shutdown);
    }

    /// Accept connections on a background thread.
    pub fn spawn(self) -> io::Result<ServerHandle> {
        let addr = self.local_addr()?;
        let shutdown = Arc::clone(&self.shutdown);
        let thread = thread::Builder::new()
            .name("mdnudge-accept".to_string())
            .spawn(move || self.run())?;
        Ok(ServerHandle {
            addr,
            shutdown,
            thread: Some(thread),
        })
    }
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting and wait for the accept loop to exit.
    ///
    /// Connections already being handled finish on their own threads.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Wake the blocking accept
        let _ = TcpStream::connect(self.addr);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::error!("Accept loop panicked");
        }
    }
}

fn accept_loop(listener: &TcpListener, service: &Arc<Service>, shutdown: &AtomicBool) {
    for stream in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let service = Arc::clone(service);
                let spawned = thread::Builder::new()
                    .name("mdnudge-conn".to_string())
                    .spawn(move || handle_connection(stream, &service));
                if let Err(e) = spawned {
                    log::error!("Failed to spawn connection thread: {e}");
                }
            }
            Err(e) => log::warn!("Failed to accept connection: {e}"),
        }
    }
    log::info!("Server stopped");
}

fn handle_connection(stream: TcpStream, service: &Service) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
        log::warn!("Failed to set read timeout for {peer}: {e}");
    }

    let mut reader = BufReader::new(&stream);
    let response = match http::read_request(&mut reader) {
        Ok(request) => {
            log::debug!("{peer} {} {}", request.method, request.path);
            let response = routes::handle(service, &request);
            log::info!("{} {} -> {}", request.method, request.path, response.status);
            response
        }
        Err(e) => {
            log::warn!("Bad request from {peer}: {e}");
            Response::error(e.status(), e.to_string())
        }
    };

    let mut writer = &stream;
    if let Err(e) = http::write_response(&mut writer, &response) {
        log::warn!("Failed to write response to {peer}: {e}");
    }
}
