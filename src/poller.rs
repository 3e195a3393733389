//! Availability polling
//!
//! Repeatedly tries to open a session against a target's named remoting
//! endpoint, up to a bounded number of attempts with a fixed interval. Used
//! twice per host: with a short budget as the "already installed and
//! answering" precheck, and with a long budget as the post-install
//! confirmation probe.

use std::time::Duration;

use crate::remote::SessionProbe;

/// Attempt budget and pacing for one polling run
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Maximum number of session attempts
    pub max_attempts: u32,
    /// Fixed pause slept before every attempt, the first included.
    ///
    /// The expected wait is a short service-restart window, so the interval
    /// is fixed - no exponential backoff, no jitter.
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Single-attempt budget used as the cheap precheck
    pub fn precheck(interval: Duration) -> Self {
        Self::new(1, interval)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(15, Duration::from_secs(1))
    }
}

/// Outcome of one polling run
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Whether the endpoint answered within the budget
    pub ready: bool,
    /// Attempts actually made
    pub attempts: u32,
    /// Error from the last failed attempt, if any failed
    pub last_error: Option<String>,
}

/// Poll `host` until its `endpoint` answers or the budget is exhausted.
///
/// Each iteration sleeps the fixed interval, then tries to open a session.
/// The session is only a probe: on success it is released immediately and the
/// poll returns ready. After `max_attempts` failures the poll returns
/// not-ready with the last error attached.
pub fn poll_until_ready(
    probe: &dyn SessionProbe,
    host: &str,
    endpoint: &str,
    policy: &PollPolicy,
) -> PollOutcome {
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        std::thread::sleep(policy.interval);

        match probe.open(host, endpoint) {
            Ok(()) => {
                return PollOutcome {
                    ready: true,
                    attempts: attempt,
                    last_error,
                }
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    PollOutcome {
        ready: false,
        attempts: policy.max_attempts,
        last_error,
    }
}
