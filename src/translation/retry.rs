/*!
 * Bounded retry with a fixed delay.
 *
 * `RetryPolicy` wraps any fallible async operation and reports how many
 * attempts were consumed together with the final result, so callers can
 * account for retries whether or not the operation eventually succeeded.
 */

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::app_config::TranslationCommonConfig;
use crate::errors::ProviderError;

/// Attempts consumed and final result of a retried operation
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Result of the last attempt
    pub result: Result<T, E>,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Attempts that ended in an error
    pub fn failed_attempts(&self) -> u32 {
        if self.succeeded() {
            self.attempts.saturating_sub(1)
        } else {
            self.attempts
        }
    }
}

/// Fixed-delay retry strategy with a per-call timeout
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    call_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// `max_attempts` counts the first attempt and is at least 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            call_timeout: None,
        }
    }

    pub fn from_config(common: &TranslationCommonConfig) -> Self {
        Self::new(common.retry_max_attempts, common.retry_delay())
    }

    /// Bound each provider call; an elapsed call counts as a failed attempt
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    /// Run a provider call under the configured timeout
    pub async fn timed<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(ProviderError::Timeout(limit))),
            None => call.await,
        }
    }

    /// Retry `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts are exhausted.
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, operation: F, is_retryable: P) -> RetryOutcome<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        self.run_observed(label, operation, is_retryable, |_, _| {}).await
    }

    /// Same as `run`, handing every failed attempt to `on_failure` first
    pub async fn run_observed<T, E, F, Fut, P, O>(
        &self,
        label: &str,
        mut operation: F,
        is_retryable: P,
        mut on_failure: O,
    ) -> RetryOutcome<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        O: FnMut(u32, &E),
    {
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    debug!("{} succeeded on attempt {}/{}", label, attempt, self.max_attempts);
                    return RetryOutcome { attempts: attempt, result: Ok(value) };
                }
                Err(error) => {
                    on_failure(attempt, &error);

                    if !is_retryable(&error) {
                        warn!("{} failed on attempt {}/{} with a permanent error: {}", label, attempt, self.max_attempts, error);
                        return RetryOutcome { attempts: attempt, result: Err(error) };
                    }

                    if attempt >= self.max_attempts {
                        warn!("{} failed after all {} attempts: {}", label, self.max_attempts, error);
                        return RetryOutcome { attempts: attempt, result: Err(error) };
                    }

                    warn!("{} failed on attempt {}/{}, retrying: {}", label, attempt, self.max_attempts, error);
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationCommonConfig::default())
    }
}
