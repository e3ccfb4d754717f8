use crate::error::DriverResult;

/// Size and kind information for a stored key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileInfo {
    /// Payload size in bytes; zero for pure prefixes.
    pub size: u64,
    /// `true` when the key is a prefix with descendants rather than a value.
    pub is_dir: bool,
}

/// Flat key→bytes store with list, stat, and recursive delete.
///
/// All implementations must satisfy these invariants:
/// - Operations are synchronous and safe to call from many threads.
/// - `put_content` atomically replaces the whole value for a key; readers
///   never observe a torn value for a single key. Multi-key consistency is
///   the caller's problem (the store layers status markers on top).
/// - `list` returns the full key paths of direct descendants only, never
///   grandchildren; listing an absent prefix yields an empty vec.
/// - `delete` on a prefix removes the entire subtree; deleting an absent
///   key reports [`not found`](crate::DriverError::NotFound).
pub trait StorageDriver: Send + Sync {
    /// Human-readable backend name, used in diagnostics.
    fn name(&self) -> &str;

    /// Read the full value stored at `path`.
    fn get_content(&self, path: &str) -> DriverResult<Vec<u8>>;

    /// Store `content` at `path`, replacing any previous value.
    fn put_content(&self, path: &str, content: &[u8]) -> DriverResult<()>;

    /// Stat a key or prefix.
    fn stat(&self, path: &str) -> DriverResult<FileInfo>;

    /// List the full paths of direct descendants of `path`.
    fn list(&self, path: &str) -> DriverResult<Vec<String>>;

    /// Recursively delete the key or prefix at `path`.
    fn delete(&self, path: &str) -> DriverResult<()>;
}
