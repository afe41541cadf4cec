//! Application state for the web server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dataeater::engine::InterruptHandle;
use dataeater::{DataStore, FavoriteStore};

use super::error::ApiError;

/// Shared application state.
///
/// The store sits behind a blocking mutex and is only touched from
/// `spawn_blocking` tasks, since engine calls block.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<DataStore>>,
    pub favorites: Arc<Mutex<FavoriteStore>>,
    /// Set while a mutation runs; a second one is refused.
    busy: Arc<AtomicBool>,
    /// Cancels the running statement without taking the store lock.
    interrupt: Option<Arc<InterruptHandle>>,
}

impl AppState {
    /// Create new application state around a loaded store.
    pub fn new(store: DataStore, favorites: FavoriteStore) -> Self {
        let interrupt = store.interrupt_handle().ok().map(Arc::new);
        Self {
            store: Arc::new(Mutex::new(store)),
            favorites: Arc::new(Mutex::new(favorites)),
            busy: Arc::new(AtomicBool::new(false)),
            interrupt,
        }
    }

    /// Run `f` against the store on the blocking pool.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut DataStore) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut store = store
                .lock()
                .map_err(|_| ApiError::Internal("data store lock poisoned".to_string()))?;
            f(&mut store)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {}", e)))?
    }

    /// Like [`AppState::with_store`], but refuses to start while another
    /// mutation is running.
    ///
    /// The busy flag is held by the blocking task, so it stays set until the
    /// engine work finishes even if the request is dropped.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut DataStore) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let guard = BusyGuard::acquire(&self.busy)?;
        self.with_store(move |store| {
            let _guard = guard;
            f(store)
        })
        .await
    }

    /// Whether a mutation is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Interrupt the running statement. Returns false when there is no
    /// engine to interrupt.
    pub fn cancel(&self) -> bool {
        match &self.interrupt {
            Some(handle) => {
                handle.interrupt();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }
}

/// Holds the busy flag for the lifetime of one mutation.
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, ApiError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ApiError::Conflict("engine busy".to_string()))?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn idle_state() -> AppState {
        AppState::new(DataStore::new(), FavoriteStore::in_memory())
    }

    #[tokio::test]
    async fn test_busy_flag_outlives_dropped_request() {
        let state = idle_state();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let request = tokio::spawn({
            let state = state.clone();
            async move {
                state
                    .mutate(move |_store| {
                        started_tx.send(()).ok();
                        release_rx.recv().ok();
                        Ok(())
                    })
                    .await
            }
        });

        tokio::task::spawn_blocking(move || started_rx.recv())
            .await
            .unwrap()
            .unwrap();
        request.abort();
        let _ = request.await;

        assert!(state.is_busy());
        let second = state.mutate(|_store| Ok(())).await;
        assert!(matches!(second, Err(ApiError::Conflict(_))));

        release_tx.send(()).unwrap();
        for _ in 0..200 {
            if !state.is_busy() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!state.is_busy());
        assert!(state.mutate(|_store| Ok(())).await.is_ok());
    }
}
