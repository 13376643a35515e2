//src/sync.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::sanitize_username;
use crate::store::{self, StorePatch, WorkoutStore};

/// Fixed application namespace the per-user documents live under.
const DOC_NAMESPACE: &str = "iron-tracker/trackers";

/// Bound on read-merge-write rounds when concurrent writers keep moving
/// the revision. Only revision conflicts retry; transport failures never
/// do.
const MAX_MERGE_ATTEMPTS: u32 = 5;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read document '{path}': {message}")]
    Read { path: String, message: String },
    #[error("Failed to write document '{path}': {message}")]
    Write { path: String, message: String },
    #[error("Concurrent write on document '{0}'")]
    Conflict(String),
    #[error("Subscription failed: {0}")]
    Subscription(String),
}

/// Document key for one user's store: the application namespace joined
/// with the sanitized username.
pub fn document_path(username: &str) -> String {
    format!("{}/{}", DOC_NAMESPACE, sanitize_username(username))
}

/// A document read together with the revision used for compare-and-swap
/// writes. An absent document reads as `None` at revision 0.
#[derive(Debug, Clone, Default)]
pub struct VersionedDocument {
    pub doc: Option<Value>,
    pub revision: u64,
}

/// Change notifications delivered to a watcher.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The document's current contents, `None` while it does not exist.
    Changed(Option<Value>),
    Failed(String),
}

pub type WatchId = u64;
pub type WatchCallback = Arc<dyn Fn(WatchEvent) + Send + Sync>;

/// Key-value document store boundary. Handles are injected explicitly at
/// construction; the crate holds no process-wide client state.
pub trait DocumentBackend: Send + Sync {
    /// Reads the current document at `path`, absent documents included.
    fn read(&self, path: &str) -> Result<VersionedDocument, Error>;
    /// Writes `doc` if the stored revision still equals `expected`,
    /// returning the new revision. `Error::Conflict` on a mismatch.
    fn write(&self, path: &str, doc: Value, expected: u64) -> Result<u64, Error>;
    /// Registers a watcher on `path`. The current state is delivered
    /// immediately, then once per committed write until `unwatch`.
    fn watch(&self, path: &str, callback: WatchCallback) -> WatchId;
    fn unwatch(&self, id: WatchId);
}

struct Watcher {
    id: WatchId,
    path: String,
    callback: WatchCallback,
}

#[derive(Default)]
struct MemoryState {
    documents: HashMap<String, (Value, u64)>,
    watchers: Vec<Watcher>,
    next_watch_id: WatchId,
}

/// In-process backend with the same observable contract as the remote
/// store: versioned compare-and-swap writes and push notifications to
/// watchers on every committed write, the local client's own included.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentBackend for MemoryBackend {
    fn read(&self, path: &str) -> Result<VersionedDocument, Error> {
        let state = self.lock_state();
        Ok(match state.documents.get(path) {
            Some((doc, revision)) => VersionedDocument {
                doc: Some(doc.clone()),
                revision: *revision,
            },
            None => VersionedDocument::default(),
        })
    }

    fn write(&self, path: &str, doc: Value, expected: u64) -> Result<u64, Error> {
        // Callbacks run after the lock is released, so a watcher may call
        // back into the backend.
        let (committed, callbacks) = {
            let mut state = self.lock_state();
            let current = state.documents.get(path).map_or(0, |(_, revision)| *revision);
            if current != expected {
                return Err(Error::Conflict(path.to_string()));
            }
            let next = current + 1;
            state.documents.insert(path.to_string(), (doc.clone(), next));
            let callbacks: Vec<WatchCallback> = state
                .watchers
                .iter()
                .filter(|watcher| watcher.path == path)
                .map(|watcher| Arc::clone(&watcher.callback))
                .collect();
            (next, callbacks)
        };
        for callback in callbacks {
            callback(WatchEvent::Changed(Some(doc.clone())));
        }
        Ok(committed)
    }

    fn watch(&self, path: &str, callback: WatchCallback) -> WatchId {
        let (id, current) = {
            let mut state = self.lock_state();
            state.next_watch_id += 1;
            let id = state.next_watch_id;
            state.watchers.push(Watcher {
                id,
                path: path.to_string(),
                callback: Arc::clone(&callback),
            });
            (id, state.documents.get(path).map(|(doc, _)| doc.clone()))
        };
        callback(WatchEvent::Changed(current));
        id
    }

    fn unwatch(&self, id: WatchId) {
        let mut state = self.lock_state();
        state.watchers.retain(|watcher| watcher.id != id);
    }
}

/// Active subscription to one user's document. Unsubscribing (or dropping)
/// stops further deliveries immediately and releases the watch.
pub struct Subscription {
    backend: Arc<dyn DocumentBackend>,
    watch_id: Option<WatchId>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.watch_id.take() {
            self.backend.unwatch(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Boundary between the core and the remote document store.
pub struct SyncAdapter {
    backend: Arc<dyn DocumentBackend>,
}

impl SyncAdapter {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Streams decoded stores for `username`. A missing document is
    /// delivered as the empty store; every committed write re-delivers,
    /// so callers derive state solely from this stream.
    pub fn subscribe<C, E>(&self, username: &str, on_change: C, on_error: E) -> Subscription
    where
        C: Fn(WorkoutStore) + Send + Sync + 'static,
        E: Fn(Error) + Send + Sync + 'static,
    {
        let path = document_path(username);
        debug!(%path, "subscribing to workout document");
        let callback: WatchCallback = Arc::new(move |event| match event {
            WatchEvent::Changed(Some(doc)) => on_change(store::decode(&doc)),
            WatchEvent::Changed(None) => on_change(WorkoutStore::default()),
            WatchEvent::Failed(message) => on_error(Error::Subscription(message)),
        });
        let watch_id = self.backend.watch(&path, callback);
        Subscription {
            backend: Arc::clone(&self.backend),
            watch_id: Some(watch_id),
        }
    }

    /// Merge-writes a patch into `username`'s document, leaving sibling
    /// dates and template groups untouched. The backend has no
    /// append-unique primitive, so the union is computed locally and
    /// committed with a compare-and-swap, re-reading on revision conflict.
    ///
    /// # Errors
    /// Surfaces backend failures unretried; `Error::Conflict` once the
    /// merge attempts are exhausted.
    pub fn persist(&self, username: &str, patch: &StorePatch) -> Result<(), Error> {
        let path = document_path(username);
        for attempt in 1..=MAX_MERGE_ATTEMPTS {
            let current = self.backend.read(&path)?;
            let mut merged = current
                .doc
                .as_ref()
                .map(store::decode)
                .unwrap_or_default();
            merged.apply(patch);
            let doc = serde_json::to_value(&merged).map_err(|err| Error::Write {
                path: path.clone(),
                message: err.to_string(),
            })?;
            match self.backend.write(&path, doc, current.revision) {
                Ok(revision) => {
                    debug!(%path, revision, attempt, "workout document merged");
                    return Ok(());
                }
                Err(Error::Conflict(_)) => {
                    warn!(%path, attempt, "concurrent write detected, re-reading document");
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::Conflict(path))
    }
}
