//! Index handler
//!
//! Echoes the requested path back to the client.

use super::error;
use crate::response::TEXT_PLAIN;
use crate::{Request, ResponseWriter, StatusCode};

/// Write `Hello, you've requested: <path>\n`
pub fn index(req: &Request, w: &mut dyn ResponseWriter) {
    w.set_header("content-type", TEXT_PLAIN);
    if let Err(e) = writeln!(w, "Hello, you've requested: {}", req.path) {
        tracing::error!(error = %e, path = %req.path, "error writing response");
        error(w, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
