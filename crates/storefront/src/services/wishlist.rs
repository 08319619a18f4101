//! Wishlist store.
//!
//! Keeps active visitors' [`Wishlist`]s in a bounded `moka` cache and writes
//! the full set through a [`WishlistBackend`] after each change. A resident
//! copy is authoritative: a failed write is logged and the toggle still takes
//! effect, and a failed read starts the visitor with an empty list. Lists
//! idle for an hour are evicted and reloaded from the backend on next use.
//!
//! Each visitor's list has its own lock, so repeated clicks on the same heart
//! are applied one at a time while other visitors are never held up. Backend
//! I/O runs on Tokio's blocking pool.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use jewelbox_core::{ProductId, ProductSummary, Toggled, Wishlist};

use crate::models::VisitorId;

/// Errors from a wishlist backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored document could not be parsed.
    #[error("corrupt wishlist at {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The wishlist could not be serialized.
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for wishlists, one document per visitor.
pub trait WishlistBackend: Send + Sync {
    /// Load a visitor's wishlist; `Ok(None)` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document cannot be read or parsed.
    fn load(&self, visitor: &VisitorId) -> Result<Option<Wishlist>, StorageError>;

    /// Replace a visitor's stored wishlist with `wishlist`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save(&self, visitor: &VisitorId, wishlist: &Wishlist) -> Result<(), StorageError>;

    /// Verify the backend can accept writes (readiness probe).
    ///
    /// # Errors
    ///
    /// Returns an error if writes would currently fail.
    fn check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

// =============================================================================
// File Backend
// =============================================================================

/// Stores each wishlist as `<dir>/<visitor>.json`.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, visitor: &VisitorId) -> PathBuf {
        self.dir.join(format!("{visitor}.json"))
    }
}

impl WishlistBackend for FileBackend {
    fn load(&self, visitor: &VisitorId) -> Result<Option<Wishlist>, StorageError> {
        let path = self.path_for(visitor);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Wishlist::from_json(&contents)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: path.display().to_string(),
                source,
            })
    }

    fn save(&self, visitor: &VisitorId, wishlist: &Wishlist) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(visitor);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, wishlist.to_json()?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn check(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let probe = self.dir.join(".ready");
        fs::write(&probe, b"ok")?;
        fs::remove_file(&probe)?;
        Ok(())
    }
}

// =============================================================================
// Memory Backend
// =============================================================================

/// In-process backend holding serialized documents; used by tests.
///
/// Documents are kept as JSON text so loads exercise the same codec as the
/// file backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: Mutex<HashMap<VisitorId, String>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail (simulates a full or disabled store).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a raw document for `visitor`.
    pub fn put_raw(&self, visitor: &VisitorId, json: impl Into<String>) {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(visitor.clone(), json.into());
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WishlistBackend for MemoryBackend {
    fn load(&self, visitor: &VisitorId) -> Result<Option<Wishlist>, StorageError> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents
            .get(visitor)
            .map(|json| {
                Wishlist::from_json(json).map_err(|source| StorageError::Corrupt {
                    path: format!("memory:{visitor}"),
                    source,
                })
            })
            .transpose()
    }

    fn save(&self, visitor: &VisitorId, wishlist: &Wishlist) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        let json = wishlist.to_json()?;
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(visitor.clone(), json);
        Ok(())
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

/// Resident lists not touched for this long are dropped from memory.
const IDLE_EVICTION: Duration = Duration::from_secs(60 * 60);

/// Upper bound on lists held in memory at once.
const MAX_RESIDENT_LISTS: u64 = 100_000;

/// One visitor's list behind its own lock.
type SharedList = Arc<AsyncMutex<Wishlist>>;

/// Result of a toggle, for rendering the heart button and count badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub toggled: Toggled,
    pub count: usize,
}

/// Visitors' wishlists, cached in memory and persisted per change.
pub struct WishlistStore {
    lists: Cache<VisitorId, SharedList>,
    backend: Arc<dyn WishlistBackend>,
}

impl WishlistStore {
    /// Create a store persisting through `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn WishlistBackend>) -> Self {
        let lists = Cache::builder()
            .max_capacity(MAX_RESIDENT_LISTS)
            .time_to_idle(IDLE_EVICTION)
            .build();

        Self { lists, backend }
    }

    /// Run a backend call on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn WishlistBackend) -> Result<T, StorageError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|e| StorageError::Unavailable(format!("backend task failed: {e}")))?
    }

    async fn load(&self, visitor: &VisitorId) -> Result<Option<Wishlist>, StorageError> {
        let visitor = visitor.clone();
        self.blocking(move |backend| backend.load(&visitor)).await
    }

    /// Load a visitor's list from the backend, falling back to empty.
    async fn load_or_empty(&self, visitor: &VisitorId) -> Wishlist {
        match self.load(visitor).await {
            Ok(Some(wishlist)) => wishlist,
            Ok(None) => Wishlist::new(),
            Err(e) => {
                tracing::warn!(visitor = %visitor, error = %e, "Failed to load wishlist, starting empty");
                Wishlist::new()
            }
        }
    }

    /// Run `f` against a visitor's list.
    ///
    /// A stored list is cached on first read. A visitor with nothing stored
    /// is answered from an empty list without caching anything.
    async fn with_list<R>(&self, visitor: &VisitorId, f: impl FnOnce(&Wishlist) -> R) -> R {
        if let Some(list) = self.lists.get(visitor).await {
            let guard = list.lock().await;
            return f(&guard);
        }

        match self.load(visitor).await {
            Ok(Some(wishlist)) => {
                // Another request may have cached it while we read from the backend.
                let list = self
                    .lists
                    .get_with(visitor.clone(), async move { Arc::new(AsyncMutex::new(wishlist)) })
                    .await;
                let guard = list.lock().await;
                f(&guard)
            }
            Ok(None) => f(&Wishlist::new()),
            Err(e) => {
                tracing::warn!(visitor = %visitor, error = %e, "Failed to load wishlist, showing empty");
                f(&Wishlist::new())
            }
        }
    }

    /// Snapshot of a visitor's wishlist.
    pub async fn get(&self, visitor: &VisitorId) -> Wishlist {
        self.with_list(visitor, Wishlist::clone).await
    }

    /// Whether a visitor has liked `product`.
    pub async fn is_wishlisted(&self, visitor: &VisitorId, product: &ProductId) -> bool {
        self.with_list(visitor, |list| list.contains(product)).await
    }

    /// Number of products a visitor has liked.
    pub async fn count(&self, visitor: &VisitorId) -> usize {
        self.with_list(visitor, Wishlist::len).await
    }

    /// Toggle `product` in a visitor's wishlist and persist the result.
    ///
    /// Never fails: a persistence error is logged and the in-memory change
    /// stands. The visitor's lock is held until the write finishes, so the
    /// stored document always reflects their last toggle.
    pub async fn toggle(&self, visitor: &VisitorId, product: ProductSummary) -> ToggleOutcome {
        let shared = self
            .lists
            .get_with(visitor.clone(), async {
                Arc::new(AsyncMutex::new(self.load_or_empty(visitor).await))
            })
            .await;
        let mut list = shared.lock().await;

        let product_id = product.id.clone();
        let toggled = list.toggle(product);
        let count = list.len();

        let snapshot = list.clone();
        let owner = visitor.clone();
        match self.blocking(move |backend| backend.save(&owner, &snapshot)).await {
            Ok(()) => {
                tracing::debug!(visitor = %visitor, product_id = %product_id, ?toggled, count, "Wishlist persisted");
            }
            Err(e) => {
                tracing::warn!(
                    visitor = %visitor,
                    product_id = %product_id,
                    error = %e,
                    "Failed to persist wishlist, keeping in-memory copy"
                );
            }
        }

        ToggleOutcome { toggled, count }
    }

    /// Readiness check for the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if it cannot accept writes.
    pub async fn check(&self) -> Result<(), StorageError> {
        self.blocking(|backend| backend.check()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn piece(id: &str) -> ProductSummary {
        ProductSummary::new(id, format!("Piece {id}"), None, Decimal::from(2500))
    }

    fn memory_store() -> (WishlistStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (WishlistStore::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let (store, _) = memory_store();
        let visitor = VisitorId::generate();

        let outcome = store.toggle(&visitor, piece("a")).await;
        assert_eq!(outcome, ToggleOutcome { toggled: Toggled::Added, count: 1 });
        assert!(store.is_wishlisted(&visitor, &ProductId::new("a")).await);

        let outcome = store.toggle(&visitor, piece("a")).await;
        assert_eq!(outcome, ToggleOutcome { toggled: Toggled::Removed, count: 0 });
        assert!(!store.is_wishlisted(&visitor, &ProductId::new("a")).await);
    }

    #[tokio::test]
    async fn test_every_toggle_persists_full_set() {
        let (store, backend) = memory_store();
        let visitor = VisitorId::generate();

        store.toggle(&visitor, piece("a")).await;
        store.toggle(&visitor, piece("b")).await;

        let persisted = backend.load(&visitor).unwrap().unwrap();
        assert_eq!(persisted, store.get(&visitor).await);
        assert_eq!(persisted.len(), 2);
    }

    #[tokio::test]
    async fn test_visitors_are_isolated() {
        let (store, _) = memory_store();
        let (alice, bob) = (VisitorId::generate(), VisitorId::generate());

        store.toggle(&alice, piece("a")).await;
        assert_eq!(store.count(&alice).await, 1);
        assert_eq!(store.count(&bob).await, 0);
    }

    #[tokio::test]
    async fn test_reads_without_stored_list_cache_nothing() {
        let (store, _) = memory_store();

        for _ in 0..1_000 {
            let visitor = VisitorId::generate();
            assert_eq!(store.count(&visitor).await, 0);
            assert!(store.get(&visitor).await.is_empty());
            assert!(!store.is_wishlisted(&visitor, &ProductId::new("a")).await);
        }
        store.lists.run_pending_tasks().await;
        assert_eq!(store.lists.entry_count(), 0);

        let visitor = VisitorId::generate();
        store.toggle(&visitor, piece("a")).await;
        store.lists.run_pending_tasks().await;
        assert_eq!(store.lists.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_authoritative() {
        let (store, backend) = memory_store();
        let visitor = VisitorId::generate();
        backend.set_fail_writes(true);

        let outcome = store.toggle(&visitor, piece("a")).await;
        assert_eq!(outcome.toggled, Toggled::Added);
        assert!(store.is_wishlisted(&visitor, &ProductId::new("a")).await);
        assert!(backend.is_empty());
        assert!(store.check().await.is_err());

        backend.set_fail_writes(false);
        store.toggle(&visitor, piece("b")).await;
        let persisted = backend.load(&visitor).unwrap().unwrap();
        assert_eq!(persisted.len(), 2);
    }

    #[tokio::test]
    async fn test_reload_from_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let visitor = VisitorId::generate();
        {
            let store = WishlistStore::new(backend.clone());
            store.toggle(&visitor, piece("a")).await;
            store.toggle(&visitor, piece("b")).await;
        }

        let restarted = WishlistStore::new(backend);
        let list = restarted.get(&visitor).await;
        assert_eq!(list.len(), 2);
        assert!(list.contains(&ProductId::new("b")));
    }

    #[tokio::test]
    async fn test_corrupt_document_starts_empty() {
        let (store, backend) = memory_store();
        let visitor = VisitorId::generate();
        backend.put_raw(&visitor, "not json");

        assert_eq!(store.count(&visitor).await, 0);
        store.toggle(&visitor, piece("a")).await;
        assert_eq!(backend.load(&visitor).unwrap().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_never_duplicate() {
        let (store, _) = memory_store();
        let store = Arc::new(store);
        let visitor = VisitorId::generate();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let visitor = visitor.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        store.toggle(&visitor, piece("a")).await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // 200 toggles: an even count leaves the product absent.
        let list = store.get(&visitor).await;
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
    }

    /// Blocks saves for one visitor until released.
    struct GatedBackend {
        inner: MemoryBackend,
        gated: VisitorId,
        entered: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
        release: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl WishlistBackend for GatedBackend {
        fn load(&self, visitor: &VisitorId) -> Result<Option<Wishlist>, StorageError> {
            self.inner.load(visitor)
        }

        fn save(&self, visitor: &VisitorId, wishlist: &Wishlist) -> Result<(), StorageError> {
            if visitor == &self.gated {
                if let Some(entered) = self.entered.lock().unwrap().take() {
                    let _ = entered.send(());
                }
                self.release.lock().unwrap().recv().unwrap();
            }
            self.inner.save(visitor, wishlist)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_save_does_not_block_other_visitors() {
        let (slow, other) = (VisitorId::generate(), VisitorId::generate());
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let store = Arc::new(WishlistStore::new(Arc::new(GatedBackend {
            inner: MemoryBackend::new(),
            gated: slow.clone(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
        })));

        let pending = tokio::spawn({
            let store = Arc::clone(&store);
            let slow = slow.clone();
            async move { store.toggle(&slow, piece("a")).await }
        });
        entered_rx.await.unwrap();

        // The first save is parked; another visitor still reads and writes.
        let limit = Duration::from_secs(5);
        let outcome = tokio::time::timeout(limit, store.toggle(&other, piece("b")))
            .await
            .unwrap();
        assert_eq!(outcome.count, 1);
        let count = tokio::time::timeout(limit, store.count(&other)).await.unwrap();
        assert_eq!(count, 1);

        release_tx.send(()).unwrap();
        assert_eq!(pending.await.unwrap().toggled, Toggled::Added);
        assert_eq!(store.count(&slow).await, 1);
    }

    #[test]
    fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("wishlists"));
        let visitor = VisitorId::generate();

        assert!(backend.load(&visitor).unwrap().is_none());

        let mut wishlist = Wishlist::new();
        wishlist.toggle(piece("x"));
        wishlist.toggle(piece("y"));
        backend.save(&visitor, &wishlist).unwrap();

        assert_eq!(backend.load(&visitor).unwrap().unwrap(), wishlist);
        assert!(backend.check().is_ok());
    }

    #[test]
    fn test_file_backend_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        let visitor = VisitorId::generate();
        fs::write(dir.path().join(format!("{visitor}.json")), "{{{").unwrap();

        assert!(matches!(
            backend.load(&visitor),
            Err(StorageError::Corrupt { .. })
        ));
    }
}
