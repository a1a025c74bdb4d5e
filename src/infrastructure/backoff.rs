//! 指数退避配置
//!
//! 能力发现失败后的重试间隔：初始 30 秒，每次翻倍，上限 600 秒

use std::time::Duration;

/// 默认初始退避时间（秒）
pub const DEFAULT_INITIAL_RETRY_DELAY_SECS: u64 = 30;
/// 默认最大退避时间（秒）
pub const DEFAULT_MAX_RETRY_DELAY_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// 首次失败后的等待时间
    pub initial_delay: Duration,
    /// 等待时间上限
    pub max_delay: Duration,
    /// 退避倍数
    pub multiplier: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_RETRY_DELAY_SECS),
            max_delay: Duration::from_secs(DEFAULT_MAX_RETRY_DELAY_SECS),
            multiplier: 2,
        }
    }
}

impl BackoffConfig {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// 下一次的等待时间
    pub fn next_delay(&self, current: Duration) -> Duration {
        current
            .checked_mul(self.multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// 无限的退避序列
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay.min(self.max_delay)), move |d| {
            Some(self.next_delay(*d))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_sequence() {
        let config = BackoffConfig::default();
        let delays: Vec<u64> = config.delays().take(8).map(|d| d.as_secs()).collect();

        assert_eq!(delays, vec![30, 60, 120, 240, 480, 600, 600, 600]);
    }

    #[test]
    fn test_next_delay_is_capped() {
        let config = BackoffConfig::default();

        assert_eq!(
            config.next_delay(Duration::from_secs(480)),
            Duration::from_secs(600)
        );
        assert_eq!(
            config.next_delay(Duration::from_secs(600)),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_custom_backoff() {
        let config = BackoffConfig::new(Duration::from_millis(5), Duration::from_millis(12));
        let delays: Vec<u128> = config.delays().take(4).map(|d| d.as_millis()).collect();

        assert_eq!(delays, vec![5, 10, 12, 12]);
    }
}
