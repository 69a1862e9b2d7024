//! Remote blob store abstraction
//!
//! A path-keyed, versioned object store. Every stored object carries an
//! opaque revision token; updating or deleting an existing object requires
//! its current token (optimistic concurrency). "Not found" is a normal
//! answer for reads and deletes, never an error.

mod github;
mod memory;

pub use github::GitHubStore;
pub use memory::MemoryStore;

/// Opaque revision token returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(pub String);

impl Revision {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An object read back from the store.
#[derive(Debug, Clone)]
pub struct Blob {
    pub revision: Revision,
    pub bytes: Vec<u8>,
}

/// Outcome of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The object existed and was removed.
    Deleted,
    /// The object was already gone; callers reconcile their bookkeeping.
    AlreadyAbsent,
}

/// Errors from blob store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{op} {path} failed: {source}")]
    Transport {
        op: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{op} {path} failed: HTTP {status}{detail}")]
    Http {
        op: &'static str,
        path: String,
        status: u16,
        detail: String,
    },

    /// Put without the current revision token while the object exists,
    /// or with a stale token.
    #[error("put {path} conflicts with an existing object; supply its current revision")]
    Conflict { path: String },

    #[error("Malformed store response for {path}: {reason}")]
    BadResponse { path: String, reason: String },
}

/// Remote, versioned key-to-bytes store.
///
/// A logical write is a single atomic unit from the caller's perspective:
/// it commits or it visibly fails.
pub trait BlobStore {
    /// Current revision token for `path`, or `None` if the object does not
    /// exist. Absence is not an error.
    fn get_revision(&self, path: &str) -> Result<Option<Revision>, StoreError>;

    /// Fetch an object's bytes and revision, or `None` if absent.
    fn get(&self, path: &str) -> Result<Option<Blob>, StoreError>;

    /// Create or update the object at `path`.
    ///
    /// When the object already exists the caller must pass its current
    /// revision in `expected`; omission or a stale token fails with
    /// [`StoreError::Conflict`] rather than silently overwriting.
    fn put(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError>;

    /// Delete the object at `path` using its current revision token.
    fn delete(
        &self,
        path: &str,
        revision: &Revision,
        message: &str,
    ) -> Result<DeleteOutcome, StoreError>;
}
