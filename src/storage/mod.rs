//! Object-storage collaborator interface.
//!
//! The compiler never reads or writes object data; the only storage
//! operations it performs are listing queries during wildcard resolution
//! and archive membership probes during executable resolution. Both go
//! through [`ObjectStore`], implemented by the embedding system. A
//! directory-backed store is provided for the CLI and an in-memory store
//! for tests.

mod dir;
mod memory;
mod path;

pub use dir::DirStore;
pub use memory::MemoryStore;
pub use path::{StoragePath, STORAGE_SCHEME};

use anyhow::Result;

/// External object-storage collaborator.
///
/// Listing queries for independent devices run on worker threads, so
/// implementations must be shareable across threads. Retry and backoff are
/// the implementation's own policy; the compiler treats any error as fatal
/// for the compile in progress.
pub trait ObjectStore: Send + Sync {
    /// List object names in `account`/`container` that begin with `prefix`,
    /// in the backend's listing order.
    fn list_prefix(&self, account: &str, container: &str, prefix: &str) -> Result<Vec<String>>;

    /// Whether the archive at `archive` contains a member at the relative
    /// path `member`. The archive is either a storage URL (an image device
    /// path) or a configured system-image path.
    fn archive_contains(&self, archive: &str, member: &str) -> Result<bool>;
}
