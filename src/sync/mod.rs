//! Concurrency helpers: the queue's mutual-exclusion primitive, the
//! freeze-guard watchdog and the process shutdown signal.

pub mod freeze_guard;
pub mod mutex;
pub mod shutdown;

pub use freeze_guard::FreezeGuard;
pub use mutex::{AsyncMutex, ExclusiveGuard};
pub use shutdown::{ShutdownCause, ShutdownSignal};
