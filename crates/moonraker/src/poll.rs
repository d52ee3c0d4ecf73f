//! Fixed-step polling with a timeout.

use crate::Result;
use crate::config::PollConfig;
use std::thread;
use std::time::Duration;

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The condition held, after `checks` evaluations.
    Ready { checks: u32 },
    /// The timeout elapsed first.
    TimedOut { checks: u32 },
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }
}

/// Evaluate `check` until it returns `true` or the timeout elapses.
///
/// The check runs immediately, then once per interval. Elapsed time is counted
/// in whole intervals rather than wall-clock time, so a slow check does not
/// shorten the budget. Errors from `check` end the loop.
pub fn poll_until<F>(config: &PollConfig, mut check: F) -> Result<PollOutcome>
where
    F: FnMut() -> Result<bool>,
{
    let interval = config.interval().max(Duration::from_millis(1));
    let timeout = config.timeout();
    let mut elapsed = Duration::ZERO;
    let mut checks = 0;

    loop {
        checks += 1;
        if check()? {
            return Ok(PollOutcome::Ready { checks });
        }
        if elapsed >= timeout {
            return Ok(PollOutcome::TimedOut { checks });
        }
        thread::sleep(interval);
        elapsed += interval;
    }
}
