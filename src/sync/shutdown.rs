//! Process-wide shutdown request.
//!
//! Raised by SIGINT/SIGTERM or by a panic on any thread, and awaited by the
//! task that tears down the voice connection before exiting.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    Signal,
    Panic,
}

#[derive(Clone)]
pub struct ShutdownSignal {
    cause: Arc<watch::Sender<Option<ShutdownCause>>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (cause, _) = watch::channel(None);
        Self {
            cause: Arc::new(cause),
        }
    }

    /// Solo cuenta la primera causa.
    pub fn trigger(&self, cause: ShutdownCause) {
        self.cause.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        });
    }

    pub fn cause(&self) -> Option<ShutdownCause> {
        *self.cause.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) was called, even if that
    /// happened before waiting.
    pub async fn wait(&self) -> ShutdownCause {
        let mut rx = self.cause.subscribe();
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|cause| *cause)
            .unwrap_or(ShutdownCause::Signal)
    }

    /// Installs a panic hook that logs the panic and triggers a shutdown.
    /// The previous hook still runs.
    pub fn install_panic_hook(&self) {
        let signal = self.clone();
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            error!("💥 Panic: {}", info);
            signal.trigger(ShutdownCause::Panic);
            previous(info);
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test]
    async fn test_first_cause_wins() {
        let signal = ShutdownSignal::new();
        assert_eq!(signal.cause(), None);

        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.wait().await }
        });
        signal.trigger(ShutdownCause::Signal);
        signal.trigger(ShutdownCause::Panic);

        assert_eq!(waiter.await.unwrap(), ShutdownCause::Signal);
        assert_eq!(signal.wait().await, ShutdownCause::Signal);
    }

    #[tokio::test]
    async fn test_panic_in_task_triggers_shutdown() {
        let signal = ShutdownSignal::new();
        signal.install_panic_hook();

        let task = tokio::spawn(async {
            panic!("watcher exploded");
        });
        assert!(task.await.unwrap_err().is_panic());

        let cause = tokio::time::timeout(Duration::from_secs(5), signal.wait())
            .await
            .unwrap();
        assert_eq!(cause, ShutdownCause::Panic);
    }
}
