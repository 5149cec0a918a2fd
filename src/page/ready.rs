use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

/// Bounded exponential backoff used while waiting for page elements to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyPolicy {
    /// Number of checks, including the first immediate one.
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub base_delay: Duration,
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl ReadyPolicy {
    /// Delay before check number `attempt` (1-based, the first check is immediate).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Polls `check` until it yields a value or the attempts run out.
    pub async fn wait_for<T, F>(&self, mut check: F) -> Option<T>
    where
        F: FnMut() -> Option<T>,
    {
        for attempt in 1..=self.max_attempts.max(1) {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tracing::debug!(attempt, ?delay, "page not ready, waiting");
                sleep(delay).await;
            }
            if let Some(found) = check() {
                return Some(found);
            }
        }
        None
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = ReadyPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_millis(250));
        assert_eq!(policy.delay_before(3), Duration::from_millis(500));
        assert_eq!(policy.delay_before(4), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(5), Duration::from_secs(2));
        assert_eq!(policy.delay_before(40), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let policy = ReadyPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let mut checks = 0;
        let found: Option<()> = policy
            .wait_for(|| {
                checks += 1;
                None
            })
            .await;
        assert!(found.is_none());
        assert_eq!(checks, 3);
    }

    #[tokio::test]
    async fn returns_once_ready() {
        let policy = ReadyPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };
        let mut checks = 0;
        let found = policy
            .wait_for(|| {
                checks += 1;
                (checks == 2).then_some("rows")
            })
            .await;
        assert_eq!(found, Some("rows"));
        assert_eq!(checks, 2);
    }
}
