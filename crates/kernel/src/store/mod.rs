//! Content record storage backends.
//!
//! Provides the trait the content routes persist through, a PostgreSQL
//! implementation, and an in-process implementation.

mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::content::ContentRecord;

pub use memory::MemoryContentStore;
pub use postgres::PgContentStore;

/// Content record storage backend trait.
///
/// Records of each content type live in their own table, named by
/// [`crate::content::table_name`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create the record table for a content type if it does not exist.
    async fn ensure_table(&self, type_slug: &str) -> Result<()>;

    /// Insert a new record into a content type's table.
    async fn insert(&self, type_slug: &str, record: &ContentRecord) -> Result<()>;

    /// Whether the backend is reachable.
    async fn health(&self) -> bool;

    /// Get the backend name (e.g., "postgres", "memory").
    fn backend(&self) -> &'static str;
}
