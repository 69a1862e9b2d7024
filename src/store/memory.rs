//! In-memory implementation of [`BlobStore`]
//!
//! Honors the same optimistic-concurrency contract as the remote store, so
//! tests exercise the real put/delete semantics. Supports per-path failure
//! injection for error-path testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{Blob, BlobStore, DeleteOutcome, Revision, StoreError};

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, (u64, Vec<u8>)>,
    next_revision: u64,
    fail_puts: HashSet<String>,
    fail_deletes: HashSet<String>,
    put_count: u64,
    delete_count: u64,
}

/// HashMap-backed blob store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly, bypassing the concurrency checks.
    pub fn seed(&self, path: &str, bytes: Vec<u8>) {
        let mut inner = self.inner.lock().expect("store lock");
        inner.next_revision += 1;
        let rev = inner.next_revision;
        inner.objects.insert(path.to_string(), (rev, bytes));
    }

    /// Make every put to `path` fail with an HTTP 500.
    pub fn fail_puts_for(&self, path: &str) {
        let mut inner = self.inner.lock().expect("store lock");
        inner.fail_puts.insert(path.to_string());
    }

    /// Make every delete of `path` fail with an HTTP 500.
    pub fn fail_deletes_for(&self, path: &str) {
        let mut inner = self.inner.lock().expect("store lock");
        inner.fail_deletes.insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.lock().expect("store lock").objects.contains_key(path)
    }

    pub fn bytes_of(&self, path: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().expect("store lock");
        inner.objects.get(path).map(|(_, bytes)| bytes.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("store lock");
        let mut paths: Vec<String> = inner.objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of successful puts since construction.
    pub fn put_count(&self) -> u64 {
        self.inner.lock().expect("store lock").put_count
    }

    /// Number of successful deletes since construction.
    pub fn delete_count(&self) -> u64 {
        self.inner.lock().expect("store lock").delete_count
    }
}

impl BlobStore for MemoryStore {
    fn get_revision(&self, path: &str) -> Result<Option<Revision>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .objects
            .get(path)
            .map(|(rev, _)| Revision(rev.to_string())))
    }

    fn get(&self, path: &str) -> Result<Option<Blob>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner.objects.get(path).map(|(rev, bytes)| Blob {
            revision: Revision(rev.to_string()),
            bytes: bytes.clone(),
        }))
    }

    fn put(
        &self,
        path: &str,
        bytes: &[u8],
        _message: &str,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");

        if inner.fail_puts.contains(path) {
            return Err(StoreError::Http {
                op: "put",
                path: path.to_string(),
                status: 500,
                detail: " injected failure".to_string(),
            });
        }

        let current = inner.objects.get(path).map(|(rev, _)| rev.to_string());
        match (&current, expected) {
            (Some(cur), Some(exp)) if cur == exp.as_str() => {}
            (None, None) => {}
            _ => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                })
            }
        }

        inner.next_revision += 1;
        let rev = inner.next_revision;
        inner.objects.insert(path.to_string(), (rev, bytes.to_vec()));
        inner.put_count += 1;
        Ok(Revision(rev.to_string()))
    }

    fn delete(
        &self,
        path: &str,
        _revision: &Revision,
        _message: &str,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");

        if inner.fail_deletes.contains(path) {
            return Err(StoreError::Http {
                op: "delete",
                path: path.to_string(),
                status: 500,
                detail: " injected failure".to_string(),
            });
        }

        if inner.objects.remove(path).is_some() {
            inner.delete_count += 1;
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::AlreadyAbsent)
        }
    }
}
