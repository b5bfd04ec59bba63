//! webapp-router: Zero-dependency trie HTTP router
//!
//! Maps literal paths to numeric handler IDs. Handler storage lives in
//! `webapp-core`; this crate only answers "which ID serves this path".
//!
//! ## Features
//! - O(k) path lookup where k = number of path segments
//! - Static paths: `/healthz`, `/api/v1/status`
//! - Subtree patterns: `/static/`, `/`
//! - Routes match every method
//! - Zero external dependencies
//!
//! ## Path Syntax
//! - A pattern without a trailing `/` matches that path only
//! - A pattern ending in `/` matches every path that starts with it
//! - Segments are literal: `:id` and `*` have no special meaning
//!
//! ## Priority
//! 1. Exact match (highest)
//! 2. Longest subtree pattern
//!
//! Lookups expect a path already passed through [`clean_path`]. Empty
//! segments are not collapsed.
//!
//! ## Example
//! ```
//! use webapp_router::Router;
//!
//! let mut router = Router::new();
//! router.insert("/", 0);
//! router.insert("/healthz", 1);
//!
//! assert_eq!(router.find("/healthz"), Some(1));
//! assert_eq!(router.find("/healthz/"), Some(0));
//! assert_eq!(router.find("/foo/bar"), Some(0));
//! ```

use std::collections::HashMap;

/// Trie node for path segment matching
#[derive(Debug, Default)]
struct Node {
    /// Static children (key = path segment)
    children: HashMap<String, Node>,
    /// Handler for the path ending exactly here
    handler_id: Option<u32>,
    /// Handler for every path continuing past this node with a `/`
    subtree_id: Option<u32>,
}

/// Zero-dependency trie HTTP router
#[derive(Debug, Default)]
pub struct Router {
    root: Node,
}

/// Split a path into segments after its leading `/`.
///
/// `/` is `[""]` and a trailing slash leaves a final `""` segment.
fn segments(path: &str) -> Vec<&str> {
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

impl Router {
    /// Create a new router
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route
    ///
    /// Returns the handler ID previously registered for the same pattern,
    /// if any.
    ///
    /// # Example
    /// ```
    /// use webapp_router::Router;
    ///
    /// let mut router = Router::new();
    /// assert_eq!(router.insert("/static/", 0), None);
    /// assert_eq!(router.insert("/static/", 1), Some(0));
    /// assert_eq!(router.insert("/static", 2), None);
    /// ```
    pub fn insert(&mut self, pattern: &str, handler_id: u32) -> Option<u32> {
        let segments = segments(pattern);
        match segments.split_last() {
            Some((&"", parents)) => self.node_mut(parents).subtree_id.replace(handler_id),
            _ => self.node_mut(&segments).handler_id.replace(handler_id),
        }
    }

    fn node_mut(&mut self, segments: &[&str]) -> &mut Node {
        let mut node = &mut self.root;
        for segment in segments {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node
    }

    /// Find the handler for a path
    ///
    /// # Example
    /// ```
    /// use webapp_router::Router;
    ///
    /// let mut router = Router::new();
    /// router.insert("/static/", 0);
    ///
    /// assert_eq!(router.find("/static/css/site.css"), Some(0));
    /// assert_eq!(router.find("/static"), None);
    /// ```
    pub fn find(&self, path: &str) -> Option<u32> {
        let mut node = &self.root;
        let mut subtree = None;

        for segment in segments(path) {
            // Deepest subtree seen so far covers the rest of the path
            if node.subtree_id.is_some() {
                subtree = node.subtree_id;
            }
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return subtree,
            }
        }

        node.handler_id.or(subtree)
    }
}

/// Canonical form of a request path
///
/// Empty and `.` segments are dropped, `..` removes the segment before it
/// (never climbing above the root), and the result always starts with `/`.
/// A trailing slash survives unless the result is `/` itself.
///
/// # Example
/// ```
/// use webapp_router::clean_path;
///
/// assert_eq!(clean_path("//healthz"), "/healthz");
/// assert_eq!(clean_path("/x/../healthz"), "/healthz");
/// assert_eq!(clean_path("/healthz//"), "/healthz/");
/// ```
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for part in &parts {
        cleaned.push('/');
        cleaned.push_str(part);
    }
    if cleaned.is_empty() {
        cleaned.push('/');
    } else if path.ends_with('/') {
        cleaned.push('/');
    }
    cleaned
}
