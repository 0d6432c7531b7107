use std::{future::Future, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Mutual exclusion for critical sections that may suspend.
///
/// Waiters are granted access in arrival order. Access is released when the
/// [`ExclusiveGuard`] is dropped, including on early return and cancellation.
#[derive(Debug, Clone, Default)]
pub struct AsyncMutex {
    inner: Arc<Mutex<()>>,
}

/// Acceso exclusivo; se libera al hacer drop.
#[derive(Debug)]
pub struct ExclusiveGuard {
    _guard: OwnedMutexGuard<()>,
}

impl AsyncMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Espera (FIFO) hasta obtener acceso exclusivo.
    pub async fn acquire(&self) -> ExclusiveGuard {
        ExclusiveGuard {
            _guard: self.inner.clone().lock_owned().await,
        }
    }

    /// Obtiene acceso sin esperar, o `None` si otra rutina lo tiene.
    pub fn try_acquire(&self) -> Option<ExclusiveGuard> {
        self.inner
            .clone()
            .try_lock_owned()
            .ok()
            .map(|guard| ExclusiveGuard { _guard: guard })
    }

    /// Runs `body` exclusively and releases the mutex on every exit path.
    pub async fn run_exclusive<F, T>(&self, body: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.acquire().await;
        body.await
    }

    /// Reports whether some routine currently holds the mutex.
    pub fn is_locked(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
