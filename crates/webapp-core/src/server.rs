//! Native HTTP server implementation
//!
//! Serves HTTP/1.1 with hyper on a multi-threaded tokio runtime:
//! - One task per accepted connection
//! - Immutable, lock-free route table shared through `Arc`
//! - Bounded header-read time per connection
//! - SO_REUSEADDR + TCP_NODELAY on the listening socket

use crate::handlers::{self, Handler};
use crate::request::{percent_decode_path, percent_encode_path};
use crate::{Error, Method, Request, Response, ResponseBuffer, ResponseWriter, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use webapp_router::{clean_path, Router};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub hostname: String,
    pub workers: usize,
    /// Connections that have not sent complete headers within this window are closed
    pub header_read_timeout: Duration,
    /// Cap on a buffered response body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            hostname: "0.0.0.0".to_string(),
            workers: num_cpus::get(),
            header_read_timeout: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.hostname, self.port)
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}:{}: {}", self.hostname, self.port, e)))
    }
}

/// Route table shared across all connections
///
/// Built once at startup and never mutated while serving.
pub struct ServerState {
    router: Router,
    handlers: HashMap<u32, Handler>,
    max_body_bytes: usize,
}

impl ServerState {
    pub fn new(max_body_bytes: usize) -> Self {
        Self {
            router: Router::new(),
            handlers: HashMap::new(),
            max_body_bytes,
        }
    }

    /// Register a handler for a literal path pattern, for every method
    ///
    /// A pattern ending in `/` also matches every path below it, so `/`
    /// catches everything no other pattern claims. Patterns must be clean
    /// absolute paths; anything else could never match a request.
    pub fn handle_func<F>(&mut self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(&Request, &mut dyn ResponseWriter) + Send + Sync + 'static,
    {
        if !pattern.starts_with('/') || clean_path(pattern) != pattern {
            return Err(Error::InvalidPath(pattern.to_string()));
        }

        let handler_id = self.handlers.len() as u32;
        if let Some(previous) = self.router.insert(pattern, handler_id) {
            self.router.insert(pattern, previous);
            return Err(Error::DuplicateRoute(pattern.to_string()));
        }
        self.handlers.insert(handler_id, Arc::new(handler));
        Ok(())
    }

    /// Match and handle a request
    ///
    /// A non-canonical path gets a 301 to its cleaned form and never
    /// reaches a handler.
    pub fn handle(&self, req: Request) -> Response {
        let response = match canonical_redirect(&req) {
            Some(redirect) => redirect,
            None => self.dispatch(&req),
        };

        tracing::debug!(
            method = %req.method,
            path = %req.path,
            status = response.status.as_u16(),
            "request"
        );
        response
    }

    fn dispatch(&self, req: &Request) -> Response {
        let handler = self
            .router
            .find(&req.path)
            .and_then(|handler_id| self.handlers.get(&handler_id));

        match handler {
            Some(handler) => {
                let mut buf = ResponseBuffer::with_limit(self.max_body_bytes);
                handler(req, &mut buf);
                buf.into_response()
            }
            None => Response::not_found(),
        }
    }
}

/// Redirect to the cleaned path when the request path is not canonical
fn canonical_redirect(req: &Request) -> Option<Response> {
    // CONNECT targets an authority, not a path
    if req.method == Method::Connect {
        return None;
    }

    let cleaned = clean_path(&req.path);
    if cleaned == req.path {
        return None;
    }

    let mut location = percent_encode_path(&cleaned);
    if let Some(query) = &req.query {
        location.push('?');
        location.push_str(query);
    }
    let with_body = matches!(req.method, Method::Get | Method::Head);
    Some(Response::moved_permanently(&location, with_body))
}

/// Route table for the web app: `/` echoes the path, `/healthz` is the liveness check
pub fn app(config: &ServerConfig) -> Result<ServerState> {
    let mut state = ServerState::new(config.max_body_bytes);
    state.handle_func("/", handlers::index)?;
    state.handle_func("/healthz", handlers::health_check)?;
    Ok(state)
}

/// Create a listening TCP socket
///
/// SO_REUSEPORT stays off: a second instance on the same port must fail to bind.
pub fn create_listener_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;

    Ok(socket)
}

/// Bind the configured address. Must be called inside a tokio runtime.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let addr = config.addr()?;
    let socket = create_listener_socket(&addr).map_err(|source| Error::Bind { addr, source })?;
    let listener = TcpListener::from_std(socket.into())?;
    Ok(listener)
}

/// Convert hyper request to our Request type
///
/// Fails when the path holds a malformed percent-escape.
pub fn from_hyper_request<B>(req: &hyper::Request<B>) -> Result<Request> {
    let method = Method::from_str(req.method().as_str())?;
    let uri = req.uri();
    let path = percent_decode_path(uri.path())?;

    let mut request = Request::new(method, path);
    request.query = uri.query().map(|s| s.to_string());
    Ok(request)
}

/// Convert our Response to hyper Response
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut builder = hyper::Response::builder().status(res.status.as_u16());

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    match builder.body(Full::new(res.body)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "handler produced an invalid response");
            let fallback = Response::internal_error();
            let mut response = hyper::Response::new(Full::new(fallback.body));
            *response.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

async fn handle_request(
    state: Arc<ServerState>,
    req: hyper::Request<Incoming>,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible> {
    let response = match from_hyper_request(&req) {
        Ok(request) => state.handle(request),
        Err(e) => {
            tracing::debug!(error = %e, uri = %req.uri(), "rejecting request");
            Response::bad_request()
        }
    };
    Ok(to_hyper_response(response))
}

/// Errors that only concern the connection being accepted
fn is_connection_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::Interrupted
    )
}

/// Accept and serve connections forever
pub async fn serve(listener: TcpListener, state: Arc<ServerState>, header_read_timeout: Duration) {
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(header_read_timeout);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) if is_connection_error(&e) => continue,
            Err(e) => {
                // Typically fd exhaustion; pause instead of spinning
                tracing::warn!(error = %e, "accept error");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let state = state.clone();
        let builder = builder.clone();

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle_request(state.clone(), req));

            if let Err(e) = builder.serve_connection(io, service).await {
                if e.is_timeout() || e.is_incomplete_message() {
                    tracing::debug!(%peer, error = %e, "connection closed");
                } else {
                    tracing::warn!(%peer, error = %e, "connection error");
                }
            }
        });
    }
}

/// Bind the configured address and serve the web app
///
/// Only returns on startup failure.
pub async fn run(config: ServerConfig) -> Result<()> {
    let state = Arc::new(app(&config)?);
    let listener = bind(&config).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        "web app running on localhost:{}",
        config.port
    );

    serve(listener, state, config.header_read_timeout).await;
    Ok(())
}
