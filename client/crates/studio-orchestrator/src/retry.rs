use std::time::Duration;

use tokio::time::sleep;

// Defaults for one-off startup calls:
// - Try up to 3 times total (1 initial + 2 retries)
// - Start with 100ms delay, double each time
// - Cap maximum delay at 5 seconds
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_DELAY_MS: u64 = 100;
const DEFAULT_MAX_DELAY_SECS: u64 = 5;
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
const DEFAULT_JITTER_ENABLED: bool = true;

/// Retry behavior with Durations resolved
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter: DEFAULT_JITTER_ENABLED,
        }
    }
}

impl From<&studio_config::RetryConfig> for RetryPolicy {
    fn from(config: &studio_config::RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: config.initial_delay(),
            max_delay: config.max_delay(),
            backoff_multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }
}

/// Exponential delay sequence for a reconnect loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    delay: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            delay: policy.initial_delay,
            policy,
            attempts: 0,
        }
    }

    /// Delay before the next attempt; grows with each call.
    pub fn next_delay(&mut self) -> Duration {
        self.attempts += 1;

        let actual_delay = if self.policy.jitter {
            let jitter_factor = 0.5 + rand::random::<f64>(); // 0.5 to 1.5
            Duration::from_secs_f64(self.delay.as_secs_f64() * jitter_factor)
        } else {
            self.delay
        };

        self.delay = Duration::from_secs_f64(
            (self.delay.as_secs_f64() * self.policy.backoff_multiplier)
                .min(self.policy.max_delay.as_secs_f64()),
        );

        actual_delay
    }

    /// The attempt that just failed was the last one allowed.
    pub fn is_exhausted(&self) -> bool {
        self.attempts + 1 >= self.policy.max_attempts
    }

    /// Start over after a successful connection
    pub fn reset(&mut self) {
        self.delay = self.policy.initial_delay;
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Execute an async operation with retry logic
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsRetryable,
{
    let mut backoff = Backoff::new(policy.clone());

    loop {
        match operation().await {
            Ok(result) => {
                if backoff.attempts() > 0 {
                    log::info!(
                        "{} succeeded after {} attempts",
                        operation_name,
                        backoff.attempts() + 1
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_retryable() || backoff.is_exhausted() {
                    log::warn!(
                        "{} failed after {} attempts: {}",
                        operation_name,
                        backoff.attempts() + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = backoff.next_delay();

                log::debug!(
                    "{} attempt {} failed: {}. Retrying in {:?}",
                    operation_name,
                    backoff.attempts(),
                    e,
                    delay
                );

                sleep(delay).await;
            }
        }
    }
}

/// Trait for errors that can indicate retryability
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for crate::OrchestratorError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}
