//! Health check handler
//!
//! Liveness check for orchestrators and monitors. Always answers `200 OK`
//! while the process can serve requests.

use super::error;
use crate::response::TEXT_PLAIN;
use crate::{Request, ResponseWriter, StatusCode};

pub fn health_check(_req: &Request, w: &mut dyn ResponseWriter) {
    w.set_header("content-type", TEXT_PLAIN);
    w.write_status(StatusCode::OK);
    if let Err(e) = w.write_all(b"OK") {
        tracing::error!(error = %e, "error writing healthcheck response");
        error(w, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
