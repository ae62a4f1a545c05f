// SPDX-License-Identifier: PMPL-1.0-or-later
//! Client-side retry with exponential backoff and an injectable delay.
//!
//! The simulators only supply the failure signal; the component that
//! retries lives on the caller's side. The delay function is explicit
//! configuration: a real timer by default, a no-op in fault-injected tests
//! so they stay fast. No global state is patched.

use std::time::Duration;

use tracing::{debug, warn};

pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    multiplier: f64,
    sleep: Box<dyn FnMut(Duration)>,
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            sleep: Box::new(std::thread::sleep),
        }
    }

    pub fn with_backoff(mut self, initial: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.multiplier = multiplier;
        self
    }

    /// Replace the delay with a no-op so fault-injected tests stay fast.
    pub fn no_sleep(self) -> Self {
        self.with_sleep(|_| {})
    }

    /// Supply the delay function explicitly.
    pub fn with_sleep(mut self, sleep: impl FnMut(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Run `operation`, retrying while `is_retryable` says the error is
    /// transient and the attempt budget lasts. Sleeps between attempts
    /// with exponential backoff.
    pub fn run<T, E, F>(
        &mut self,
        mut operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match operation() {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("operation succeeded after {attempt} retries");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!("giving up after {attempt} attempts: {error}");
                        return Err(error);
                    }
                    if !is_retryable(&error) {
                        return Err(error);
                    }
                    debug!(
                        "attempt {attempt}/{} failed: {error}, retrying in {backoff:?}",
                        self.max_retries
                    );
                    (self.sleep)(backoff);
                    backoff = Duration::from_secs_f64(backoff.as_secs_f64() * self.multiplier);
                }
            }
        }
    }
}
