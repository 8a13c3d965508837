//! Retry strategies and backoff policies for the harvester's HTTP fetches.
//!
//! Adapters hit flaky third-party endpoints (feeds that 503 briefly, comment
//! threads behind rate limits); this crate gives the HTTP client a
//! configurable backoff instead of a single fixed-timeout attempt.
//!
//! ```
//! use harvester_retry::{RetryPolicy, RetryStrategyConfig, calculate_delay};
//!
//! let config = RetryPolicy::Default.to_config();
//! let delay = calculate_delay(&config, 2);
//! assert!(delay.as_millis() > 0);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Strategy type for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategyType {
    /// No delay between retries.
    Immediate,
    /// Delay doubles each attempt (default).
    #[default]
    Exponential,
    /// Delay increases linearly each attempt.
    Linear,
    /// Same delay every attempt.
    Constant,
}

/// Predefined retry policies with sensible defaults for different sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Balanced retry behavior, good for most feeds and APIs.
    #[default]
    Default,
    /// More attempts, faster recovery — for flaky low-stakes sources.
    Aggressive,
    /// Fewer attempts, longer delays — for sources that rate-limit hard.
    Conservative,
    /// Fully custom configuration via `[retry]` in the config file.
    Custom,
}

impl RetryPolicy {
    pub fn to_config(self) -> RetryStrategyConfig {
        match self {
            RetryPolicy::Default => RetryStrategyConfig {
                strategy: RetryStrategyType::Exponential,
                max_attempts: 3,
                base_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(10),
                jitter: 0.3,
            },
            RetryPolicy::Aggressive => RetryStrategyConfig {
                strategy: RetryStrategyType::Exponential,
                max_attempts: 5,
                base_delay: Duration::from_millis(200),
                max_delay: Duration::from_secs(5),
                jitter: 0.3,
            },
            RetryPolicy::Conservative => RetryStrategyConfig {
                strategy: RetryStrategyType::Linear,
                max_attempts: 2,
                base_delay: Duration::from_secs(2),
                max_delay: Duration::from_secs(20),
                jitter: 0.1,
            },
            RetryPolicy::Custom => RetryStrategyConfig::default(),
        }
    }
}

/// Configuration for a retry strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryStrategyConfig {
    #[serde(default)]
    pub strategy: RetryStrategyType,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    #[serde(default = "default_max_delay")]
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Jitter factor: 0.0 = no jitter, 1.0 = full jitter.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_jitter() -> f64 {
    0.3
}

impl Default for RetryStrategyConfig {
    fn default() -> Self {
        RetryPolicy::Default.to_config()
    }
}

/// Calculate the delay before the next retry attempt (1-indexed).
pub fn calculate_delay(config: &RetryStrategyConfig, attempt: u32) -> Duration {
    let delay = match config.strategy {
        RetryStrategyType::Immediate => Duration::ZERO,
        RetryStrategyType::Exponential => {
            let pow = attempt.saturating_sub(1).min(16);
            config.base_delay.saturating_mul(2_u32.saturating_pow(pow))
        }
        RetryStrategyType::Linear => config.base_delay.saturating_mul(attempt),
        RetryStrategyType::Constant => config.base_delay,
    };

    let capped = delay.min(config.max_delay);

    if config.jitter > 0.0 {
        apply_jitter(capped, config.jitter)
    } else {
        capped
    }
}

/// Jitter factor of 0.5 means delay * (0.5 to 1.5).
fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    use rand::Rng;

    let jitter_range = 2.0 * jitter;
    let mut rng = rand::rng();
    let random_value: f64 = rng.random();
    let random_factor = 1.0 - jitter + (random_value * jitter_range);
    let millis = (delay.as_millis() as f64 * random_factor).round() as u64;
    Duration::from_millis(millis)
}

/// Runs a fallible operation with the configured backoff between attempts.
/// This executor is policy-agnostic about what's worth retrying — it just
/// counts attempts and sleeps between them; callers that care about the
/// distinction (a 4xx response shouldn't be retried at all) use
/// [`run_retryable`](Self::run_retryable) instead of [`run`](Self::run).
pub struct RetryExecutor {
    config: RetryStrategyConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryStrategyConfig) -> Self {
        Self { config }
    }

    pub fn from_policy(policy: RetryPolicy) -> Self {
        Self::new(policy.to_config())
    }

    /// `operation` receives the current attempt number (starting at 1).
    pub fn run<T, E, F>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt >= self.config.max_attempts {
                        return Err(e);
                    }
                    let delay = calculate_delay(&self.config, attempt);
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Like [`run`](Self::run), but `should_retry` can declare an error
    /// final before the attempt budget is spent — a 4xx response, say,
    /// shouldn't burn through the remaining attempts just to fail the
    /// same way each time.
    pub fn run_retryable<T, E, F>(&self, should_retry: impl Fn(&E) -> bool, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(result) => return Ok(result),
                Err(e) if attempt >= self.config.max_attempts || !should_retry(&e) => return Err(e),
                Err(_) => {
                    let delay = calculate_delay(&self.config, attempt);
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn calculate_delay_never_exceeds_max_delay_without_jitter(
            strategy_idx in 0u8..4,
            attempt in 1u32..20,
            base_millis in 0u64..5_000,
            max_millis in 0u64..10_000,
        ) {
            let strategy = match strategy_idx {
                0 => RetryStrategyType::Immediate,
                1 => RetryStrategyType::Exponential,
                2 => RetryStrategyType::Linear,
                _ => RetryStrategyType::Constant,
            };
            let config = RetryStrategyConfig {
                strategy,
                max_attempts: 20,
                base_delay: Duration::from_millis(base_millis),
                max_delay: Duration::from_millis(max_millis),
                jitter: 0.0,
            };
            let delay = calculate_delay(&config, attempt);
            prop_assert!(delay <= config.max_delay);
        }
    }

    #[test]
    fn default_policy_matches_expected_shape() {
        let config = RetryPolicy::Default.to_config();
        assert_eq!(config.strategy, RetryStrategyType::Exponential);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn exponential_delay_doubles_without_jitter() {
        let config = RetryStrategyConfig {
            strategy: RetryStrategyType::Exponential,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: 0.0,
            max_attempts: 10,
        };
        assert_eq!(calculate_delay(&config, 1), Duration::from_secs(1));
        assert_eq!(calculate_delay(&config, 2), Duration::from_secs(2));
        assert_eq!(calculate_delay(&config, 3), Duration::from_secs(4));
    }

    #[test]
    fn delay_never_exceeds_cap() {
        let config = RetryStrategyConfig {
            strategy: RetryStrategyType::Exponential,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            jitter: 0.0,
            max_attempts: 10,
        };
        assert_eq!(calculate_delay(&config, 5), Duration::from_secs(3));
    }

    #[test]
    fn retry_executor_stops_at_max_attempts() {
        let executor = RetryExecutor::new(RetryStrategyConfig {
            strategy: RetryStrategyType::Immediate,
            base_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            jitter: 0.0,
            max_attempts: 3,
        });
        let mut calls = 0;
        let result: Result<(), &str> = executor.run(|_attempt| {
            calls += 1;
            Err("still failing")
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn retry_executor_succeeds_once_operation_recovers() {
        let executor = RetryExecutor::new(RetryStrategyConfig {
            strategy: RetryStrategyType::Immediate,
            base_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            jitter: 0.0,
            max_attempts: 5,
        });
        let result = executor.run(|attempt| if attempt < 3 { Err("nope") } else { Ok(attempt) });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn run_retryable_stops_early_when_should_retry_returns_false() {
        let executor = RetryExecutor::new(RetryStrategyConfig {
            strategy: RetryStrategyType::Immediate,
            base_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            jitter: 0.0,
            max_attempts: 5,
        });
        let mut calls = 0;
        let result: Result<(), &str> = executor.run_retryable(
            |_err| false,
            |_attempt| {
                calls += 1;
                Err("fatal")
            },
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
