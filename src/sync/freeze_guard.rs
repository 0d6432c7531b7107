use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, error};

type FreezeHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Watchdog for asynchronous operations.
///
/// Wraps a future and, if it does not resolve within `threshold`, treats the
/// whole process as frozen: logs the offending call signature and runs the
/// freeze hook, which by default exits the process with code `1`. The wrapped
/// future is not cancelled; restart-and-recover is preferred over partial
/// hangs.
#[derive(Clone)]
pub struct FreezeGuard {
    threshold: Duration,
    calls: Arc<AtomicU64>,
    on_freeze: FreezeHook,
}

impl std::fmt::Debug for FreezeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreezeGuard")
            .field("threshold", &self.threshold)
            .field("calls", &self.calls.load(Ordering::Relaxed))
            .finish()
    }
}

impl FreezeGuard {
    pub fn new(threshold: Duration) -> Self {
        Self::with_hook(threshold, |_| std::process::exit(1))
    }

    /// Igual que [`FreezeGuard::new`] pero con una acción personalizada al congelarse.
    pub fn with_hook<F>(threshold: Duration, on_freeze: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            threshold,
            calls: Arc::new(AtomicU64::new(0)),
            on_freeze: Arc::new(on_freeze),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Awaits `fut`, aborting the process if it takes longer than the threshold.
    pub async fn watch<F>(&self, name: &str, fut: F) -> F::Output
    where
        F: Future,
    {
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let signature = format!("{}() #{}", name, n);
        let started = Instant::now();

        tokio::pin!(fut);
        let output = match tokio::time::timeout(self.threshold, &mut fut).await {
            Ok(output) => output,
            Err(_) => {
                error!(
                    "🧊 {} failed to resolve in {} ms",
                    signature,
                    self.threshold.as_millis()
                );
                (self.on_freeze)(&signature);
                fut.await
            }
        };

        debug!("⏱️ {}: {:?}", signature, started.elapsed());
        output
    }
}
