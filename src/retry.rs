use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::warn;

use crate::history::{ChannelDirectory, ChannelPage, HistoryAccessor, Page, PageRequest};
use crate::{AppError, Result};

/// Longest single sleep while a cancel flag is being watched.
const CANCEL_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 fails on the first error.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait before retry number `attempt` (0-based). A server supplied
    /// `Retry-After` wins over the exponential schedule.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(wait) = retry_after {
            return wait;
        }
        let multiplier = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or runs out of
    /// retries. `pause` waits between attempts and returns false when the
    /// wait was interrupted, which ends the loop with [`AppError::Cancelled`].
    pub fn run<T>(
        &self,
        what: &str,
        pause: &mut impl FnMut(Duration) -> bool,
        mut op: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let wait = self.delay_for(attempt, e.retry_after());
                    attempt += 1;
                    warn!(
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        "{} failed, retrying",
                        what
                    );
                    if !pause(wait) {
                        return Err(AppError::Cancelled);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wraps an accessor so transient failures (rate limits, network errors)
/// are retried according to a [`RetryPolicy`] instead of ending the export.
pub struct RetryingAccessor<A, S = fn(Duration)> {
    inner: A,
    policy: RetryPolicy,
    sleep: S,
    cancel: Option<Arc<AtomicBool>>,
}

impl<A> RetryingAccessor<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleep: std::thread::sleep,
            cancel: None,
        }
    }
}

impl<A, S: FnMut(Duration)> RetryingAccessor<A, S> {
    pub fn with_sleep<S2: FnMut(Duration)>(self, sleep: S2) -> RetryingAccessor<A, S2> {
        RetryingAccessor {
            inner: self.inner,
            policy: self.policy,
            sleep,
            cancel: self.cancel,
        }
    }

    /// Give up waiting for a retry once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn into_inner(self) -> A {
        self.inner
    }

    fn call<T>(&mut self, what: &str, mut op: impl FnMut(&mut A) -> Result<T>) -> Result<T> {
        let Self {
            inner,
            policy,
            sleep,
            cancel,
        } = self;
        let mut wait_between = |wait: Duration| pause(wait, cancel.as_deref(), &mut *sleep);
        policy.run(what, &mut wait_between, || op(&mut *inner))
    }
}

/// Sleep for `wait`, in short slices when a cancel flag is watched. Returns
/// false as soon as the flag is seen set.
fn pause(wait: Duration, cancel: Option<&AtomicBool>, sleep: &mut impl FnMut(Duration)) -> bool {
    let Some(flag) = cancel else {
        sleep(wait);
        return true;
    };

    let mut left = wait;
    loop {
        if flag.load(Ordering::Relaxed) {
            return false;
        }
        if left.is_zero() {
            return true;
        }
        let step = left.min(CANCEL_POLL);
        sleep(step);
        left -= step;
    }
}

impl<A: HistoryAccessor, S: FnMut(Duration)> HistoryAccessor for RetryingAccessor<A, S> {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        self.call("conversations.history", |inner| inner.fetch_page(request))
    }
}

impl<A: ChannelDirectory, S: FnMut(Duration)> ChannelDirectory for RetryingAccessor<A, S> {
    fn list_channels(&mut self, cursor: Option<&str>) -> Result<ChannelPage> {
        self.call("conversations.list", |inner| inner.list_channels(cursor))
    }
}
