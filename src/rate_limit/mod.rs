use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Rate limit configuration for UI-component interactions.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sliding window length.
    pub window: Duration,
    /// Maximum admitted interactions per user inside the window.
    pub limit: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            limit: 5,
        }
    }
}

/// Per-user sliding-window limiter gating button and modal interactions.
/// Top-level commands are never routed through it.
///
/// A rejected attempt is not recorded, so hammering a button does not extend
/// the lockout. Entries whose window has fully drained are dropped by the
/// periodic sweep, bounding memory to recently active users.
pub struct InteractionLimiter {
    config: RateLimitConfig,
    windows: RwLock<HashMap<String, Vec<Instant>>>,
}

impl InteractionLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub async fn admit(&self, user_id: &str) -> bool {
        self.admit_at(user_id, Instant::now()).await
    }

    pub async fn admit_at(&self, user_id: &str, now: Instant) -> bool {
        let mut windows = self.windows.write().await;
        let timestamps = windows.entry(user_id.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.config.window);

        if timestamps.len() >= self.config.limit {
            return false;
        }

        timestamps.push(now);
        true
    }

    pub async fn sweep(&self) {
        self.sweep_at(Instant::now()).await;
    }

    pub async fn sweep_at(&self, now: Instant) {
        let mut windows = self.windows.write().await;
        windows.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < self.config.window);
            !timestamps.is_empty()
        });
    }

    pub async fn tracked_users(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Background task running the sweep once per window.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        let interval = limiter.config.window;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep().await;
            }
        })
    }
}

impl std::fmt::Debug for InteractionLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionLimiter")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> InteractionLimiter {
        InteractionLimiter::new(RateLimitConfig::default())
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_rejects() {
        let limiter = limiter();
        let start = Instant::now();

        for i in 0..5 {
            let at = start + Duration::from_millis(i * 100);
            assert!(limiter.admit_at("alice", at).await, "attempt {i}");
        }
        assert!(!limiter.admit_at("alice", start + Duration::from_millis(900)).await);
    }

    #[tokio::test]
    async fn window_expiry_readmits() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.admit_at("alice", start).await);
        }
        assert!(!limiter.admit_at("alice", start).await);
        assert!(limiter.admit_at("alice", start + Duration::from_secs(61)).await);
    }

    #[tokio::test]
    async fn rejection_does_not_extend_the_window() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.admit_at("alice", start).await);
        }
        // Rejected attempts just before expiry must not count.
        assert!(!limiter.admit_at("alice", start + Duration::from_secs(59)).await);
        assert!(limiter.admit_at("alice", start + Duration::from_secs(61)).await);
    }

    #[tokio::test]
    async fn users_are_limited_independently() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.admit_at("alice", start).await);
        }
        assert!(!limiter.admit_at("alice", start).await);
        assert!(limiter.admit_at("bob", start).await);
    }

    #[tokio::test]
    async fn sweep_drops_drained_entries() {
        let limiter = limiter();
        let start = Instant::now();

        limiter.admit_at("alice", start).await;
        limiter.admit_at("bob", start + Duration::from_secs(50)).await;
        assert_eq!(limiter.tracked_users().await, 2);

        limiter.sweep_at(start + Duration::from_secs(70)).await;
        assert_eq!(limiter.tracked_users().await, 1);

        limiter.sweep_at(start + Duration::from_secs(120)).await;
        assert_eq!(limiter.tracked_users().await, 0);
    }
}
