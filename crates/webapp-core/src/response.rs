//! HTTP Response types
//!
//! Handlers never build a [`Response`] directly. They write into a
//! [`ResponseWriter`], and the server turns the finished
//! [`ResponseBuffer`] into a response once the handler returns.

use bytes::{Bytes, BytesMut};
use smallvec::SmallVec;
use std::io;

/// HTTP Status Code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Get the numeric code
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            301 => "Moved Permanently",
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 8]>,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: SmallVec::new(),
            body: Bytes::new(),
        }
    }

    /// Create a 301 redirect to `location`
    ///
    /// With `with_body` set, the response carries the short HTML link
    /// browsers fall back to (sent for GET and HEAD only).
    pub fn moved_permanently(location: &str, with_body: bool) -> Self {
        let builder =
            ResponseBuilder::new(StatusCode::MOVED_PERMANENTLY).header("location", location);
        if !with_body {
            return builder.build();
        }
        builder
            .header("content-type", "text/html; charset=utf-8")
            .body(format!(
                "<a href=\"{}\">Moved Permanently</a>.\n\n",
                html_escape(location)
            ))
            .build()
    }

    /// Create a 404 Not Found response
    pub fn not_found() -> Self {
        Self::plain_error(StatusCode::NOT_FOUND)
    }

    /// Create a 400 Bad Request response for a request that could not be parsed
    ///
    /// Carries `connection: close`, so the connection ends after it is sent.
    pub fn bad_request() -> Self {
        let status = StatusCode::BAD_REQUEST;
        ResponseBuilder::new(status)
            .header("content-type", TEXT_PLAIN)
            .header("connection", "close")
            .body(status.to_string())
            .build()
    }

    /// Create a 500 Internal Server Error response
    pub fn internal_error() -> Self {
        Self::plain_error(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Error response whose body is the status reason phrase
    fn plain_error(status: StatusCode) -> Self {
        ResponseBuilder::new(status)
            .header("content-type", TEXT_PLAIN)
            .header("x-content-type-options", "nosniff")
            .body(status.reason_phrase())
            .build()
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get content-type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get body as string (if UTF-8)
    pub fn body_string(&self) -> Option<String> {
        std::str::from_utf8(&self.body).ok().map(|s| s.to_string())
    }
}

fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Builder for constructing responses
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Create a new builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            response: Response::new(status),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.headers.push((name.into(), value.into()));
        self
    }

    /// Set body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.response.body = body.into();
        self
    }

    /// Build the response
    pub fn build(self) -> Response {
        self.response
    }
}

/// Sink a handler writes its response into
///
/// Body bytes go through the [`io::Write`] supertrait, so `write!` works
/// directly on a `&mut dyn ResponseWriter`.
pub trait ResponseWriter: io::Write {
    /// Set (or replace) a header
    fn set_header(&mut self, name: &str, value: &str);

    /// Set the status code. Only the first call takes effect.
    fn write_status(&mut self, status: StatusCode);

    /// Drop everything written so far so an error response can replace it
    fn reset(&mut self);
}

/// In-memory [`ResponseWriter`]
///
/// Nothing reaches the client until [`ResponseBuffer::into_response`], so
/// a handler can always replace a failed response with an error one.
#[derive(Debug)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: SmallVec<[(String, String); 8]>,
    body: BytesMut,
    limit: usize,
}

impl ResponseBuffer {
    /// Create an unbounded buffer
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Create a buffer that rejects body writes past `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            status: None,
            headers: SmallVec::new(),
            body: BytesMut::new(),
            limit,
        }
    }

    /// Finish the response. Status defaults to 200 when never written.
    pub fn into_response(self) -> Response {
        Response {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: self.headers,
            body: self.body.freeze(),
        }
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for ResponseBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.limit.saturating_sub(self.body.len()) {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("response body exceeds {} byte limit", self.limit),
            ));
        }
        // First body byte commits the default status
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseWriter for ResponseBuffer {
    fn set_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(current) => {
                tracing::debug!(%current, ignored = %status, "superfluous status write")
            }
        }
    }

    fn reset(&mut self) {
        self.status = None;
        self.headers.clear();
        self.body.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_status_code() {
        assert_eq!(StatusCode::OK.as_u16(), 200);
        assert_eq!(StatusCode::MOVED_PERMANENTLY.reason_phrase(), "Moved Permanently");
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.to_string(), "500 Internal Server Error");
        assert_eq!(StatusCode(418).reason_phrase(), "Unknown");
    }

    #[test]
    fn test_moved_permanently() {
        let res = Response::moved_permanently("/healthz", true);
        assert_eq!(res.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.header("Location"), Some("/healthz"));
        assert_eq!(res.content_type(), Some("text/html; charset=utf-8"));
        assert_eq!(
            res.body_string().as_deref(),
            Some("<a href=\"/healthz\">Moved Permanently</a>.\n\n")
        );

        let res = Response::moved_permanently("/healthz", false);
        assert_eq!(res.header("location"), Some("/healthz"));
        assert_eq!(res.content_type(), None);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_moved_permanently_escapes_link() {
        let res = Response::moved_permanently("/a?x=1&y=\"2\"", true);
        assert_eq!(res.header("location"), Some("/a?x=1&y=\"2\""));
        assert_eq!(
            res.body_string().as_deref(),
            Some("<a href=\"/a?x=1&amp;y=&#34;2&#34;\">Moved Permanently</a>.\n\n")
        );
    }

    #[test]
    fn test_error_responses() {
        let res = Response::internal_error();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_string().as_deref(), Some("Internal Server Error"));
        assert_eq!(res.header("X-Content-Type-Options"), Some("nosniff"));

        assert_eq!(Response::not_found().body_string().as_deref(), Some("Not Found"));
    }

    #[test]
    fn test_bad_request_closes_connection() {
        let res = Response::bad_request();
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body_string().as_deref(), Some("400 Bad Request"));
        assert_eq!(res.content_type(), Some(TEXT_PLAIN));
        assert_eq!(res.header("Connection"), Some("close"));
    }

    #[test]
    fn test_buffer_defaults_to_ok() {
        let mut buf = ResponseBuffer::new();
        write!(buf, "hello").unwrap();

        let res = buf.into_response();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body_string().as_deref(), Some("hello"));
    }

    #[test]
    fn test_buffer_first_status_wins() {
        let mut buf = ResponseBuffer::new();
        buf.write_status(StatusCode::OK);
        buf.write_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(buf.into_response().status, StatusCode::OK);

        // Writing the body first also commits 200
        let mut buf = ResponseBuffer::new();
        buf.write_all(b"x").unwrap();
        buf.write_status(StatusCode::NOT_FOUND);
        assert_eq!(buf.into_response().status, StatusCode::OK);
    }

    #[test]
    fn test_buffer_limit() {
        let mut buf = ResponseBuffer::with_limit(4);
        buf.write_all(b"abc").unwrap();

        let err = buf.write_all(b"de").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(&buf.into_response().body[..], b"abc");
    }

    #[test]
    fn test_buffer_reset() {
        let mut buf = ResponseBuffer::new();
        buf.set_header("content-type", TEXT_PLAIN);
        buf.write_status(StatusCode::OK);
        buf.write_all(b"partial").unwrap();

        buf.reset();
        buf.write_status(StatusCode::INTERNAL_SERVER_ERROR);

        let res = buf.into_response();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body.is_empty());
        assert!(res.headers.is_empty());
    }

    #[test]
    fn test_buffer_set_header_replaces() {
        let mut buf = ResponseBuffer::new();
        buf.set_header("Content-Type", "text/html");
        buf.set_header("content-type", TEXT_PLAIN);

        let res = buf.into_response();
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.content_type(), Some(TEXT_PLAIN));
    }
}
