//! Built-in request handlers
//!
//! Every handler has the [`Handler`] shape: it reads the request and
//! writes into a [`ResponseWriter`].

pub mod health;
pub mod index;

pub use health::health_check;
pub use index::index;

use crate::{Request, ResponseWriter, StatusCode};
use std::sync::Arc;

/// Route handler type
pub type Handler = Arc<dyn Fn(&Request, &mut dyn ResponseWriter) + Send + Sync>;

/// Replace whatever was written with a plain-text error response.
///
/// The body is the status reason phrase. Writing it is best-effort; a
/// failure here is ignored.
pub fn error(w: &mut dyn ResponseWriter, status: StatusCode) {
    w.reset();
    w.set_header("content-type", crate::response::TEXT_PLAIN);
    w.set_header("x-content-type-options", "nosniff");
    w.write_status(status);
    let _ = w.write_all(status.reason_phrase().as_bytes());
}
