//! webapp-core: path-echo web app on tokio/hyper
//!
//! Two routes on an explicit route table:
//! - `/` (and every path nothing else claims) echoes the request path
//! - `/healthz` answers `OK` for liveness checks
//!
//! The `webapp` binary binds `0.0.0.0:3000` with a 30 second header-read
//! timeout and serves until the process is killed.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod handlers;
pub mod logging;
pub mod request;
pub mod response;
pub mod server;

// Re-exports
pub use error::{Error, Result};
pub use handlers::Handler;
pub use logging::setup_logging;
pub use request::{Method, Request};
pub use response::{Response, ResponseBuffer, ResponseBuilder, ResponseWriter, StatusCode};
pub use server::{app, bind, run, serve, ServerConfig, ServerState};
pub use server::{from_hyper_request, to_hyper_response};
