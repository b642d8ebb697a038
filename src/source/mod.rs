//! The remote listing the purge run consumes.
//!
//! [`ItemSource`] is the seam between the executor and the network: it yields
//! a lazy, paginated, finite-per-run sequence of items and exposes the delete
//! operations. The real implementation is [`HttpItemSource`]; executor tests
//! substitute an in-memory stub.

mod http;
mod retry;

use async_trait::async_trait;
use futures::stream::BoxStream;
pub use http::{HttpItemSource, HttpSourceConfig};
pub use retry::RetryConfig;

use crate::models::{Account, Item, ItemKind};

/// Lazy sequence of items from one listing.
pub type ItemStream<'a> = BoxStream<'a, Result<Item, SourceError>>;

/// Errors surfaced by an item source.
///
/// Transient transport failures are retried inside the source and never reach
/// the executor; what does reach it is terminal.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The server rejected our credentials. Fatal, aborts the run.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The target no longer exists. Non-fatal on delete: the item was
    /// already removed.
    #[error("item not found")]
    NotFound,

    /// Any other non-2xx response, after retries were exhausted.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure, after retries were exhausted.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// A paginated remote listing with delete operations.
///
/// Implementations own pagination and their rate-limit wait/retry policy;
/// callers see one flat stream per kind and per-id deletes.
#[async_trait]
pub trait ItemSource {
    /// Resolve the account the credentials belong to. Fetched once per run.
    async fn current_account(&self) -> Result<Account, SourceError>;

    /// Stream every item of `kind`, most recent first, across all pages.
    fn items<'a>(&'a self, kind: ItemKind, account: &'a Account) -> ItemStream<'a>;

    /// Delete one item. For posts this removes the post; for liked items it
    /// removes the favourite mark, not the underlying post.
    async fn delete(&self, kind: ItemKind, id: &str) -> Result<(), SourceError>;
}
