//! The browsing surface the collector drives.
//!
//! Everything page-specific (which elements are comments, where the author
//! link lives, how to click "load more") sits behind [`BrowsingSurface`].
//! The collector only relies on these capabilities, so it runs unchanged
//! against headless Chrome or an in-memory fake.

use crate::error::SurfaceError;

/// Author of a comment as found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub profile_link: String,
}

/// Per-node extraction result. Separates "the node has no such data" from
/// "the data is there but could not be read".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted<T> {
    Found(T),
    Missing,
    Failed(String),
}

impl<T> Extracted<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Extracted::Found(value) => Some(value),
            Extracted::Missing | Extracted::Failed(_) => None,
        }
    }
}

pub trait BrowsingSurface {
    /// Opaque handle to one materialized comment node.
    type Node;

    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Clicks any pending "load more" affordances. Returns how many were
    /// expanded; zero is not an error.
    fn expand_pending_content(&mut self) -> Result<usize, SurfaceError>;

    /// All comment nodes currently in the page, in document order.
    fn list_comment_nodes(&mut self) -> Result<Vec<Self::Node>, SurfaceError>;

    fn extract_text(&self, node: &Self::Node) -> Extracted<String>;

    fn extract_author(&self, node: &Self::Node) -> Extracted<Author>;

    /// Moves the view forward so lazily-loaded content materializes.
    fn scroll_forward(&mut self) -> Result<(), SurfaceError>;

    fn is_alive(&mut self) -> bool;
}
