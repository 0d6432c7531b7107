use dashmap::DashMap;
use serenity::model::id::UserId;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

/// Per-user cooldown of a single command.
///
/// Each recorded invocation schedules its own removal after the cooldown
/// elapses, so the map only ever holds users that are currently cooling down.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    cooldown: Duration,
    last_invokes: Arc<DashMap<UserId, Instant>>,
}

impl CooldownTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_invokes: Arc::new(DashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Tiempo restante de cooldown para `user`, si lo hay.
    pub fn remaining(&self, user: UserId) -> Option<Duration> {
        let last = *self.last_invokes.get(&user)?;
        self.cooldown.checked_sub(last.elapsed()).filter(|d| !d.is_zero())
    }

    /// Registra una invocación y programa su eliminación diferida.
    pub fn record(&self, user: UserId) {
        let now = Instant::now();
        self.last_invokes.insert(user, now);

        let last_invokes = self.last_invokes.clone();
        let cooldown = self.cooldown;
        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            // Solo si nadie registró una invocación más reciente
            last_invokes.remove_if(&user, |_, recorded| *recorded == now);
        });
    }

    pub fn tracked_users(&self) -> usize {
        self.last_invokes.len()
    }

    pub fn error_message(&self, command: &str, remaining: Duration) -> String {
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        format!(
            "You have to wait `{}` until the next call to `{}`.",
            humantime::format_duration(Duration::from_secs(secs)),
            command
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_record_then_expire() {
        let tracker = CooldownTracker::new(Duration::from_secs(5));
        let user = UserId::new(1);

        assert_eq!(tracker.remaining(user), None);
        tracker.record(user);
        assert_eq!(tracker.remaining(user), Some(Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(tracker.remaining(user), Some(Duration::from_secs(3)));
        assert_eq!(tracker.remaining(UserId::new(2)), None);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(tracker.remaining(user), None);
        assert_eq!(tracker.tracked_users(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_removal_keeps_newer_record() {
        let tracker = CooldownTracker::new(Duration::from_secs(5));
        let user = UserId::new(7);

        tracker.record(user);
        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        tracker.record(user);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(tracker.remaining(user), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_error_message_rounds_up() {
        let tracker = CooldownTracker::new(Duration::from_secs(5));
        assert_eq!(
            tracker.error_message("music", Duration::from_millis(2_100)),
            "You have to wait `3s` until the next call to `music`."
        );
    }
}
