// Retry/recovery controller
//
// The switch allows one management session at a time and is slow to let
// go of the previous one. A login racing that teardown is answered with
// `400 Bad Request`; this module releases any stale session up front and
// retries the whole handshake with exponential backoff when that happens.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Error;
use crate::handshake::SwitchClient;
use crate::result::{FetchRequest, FetchResult};
use crate::transport::{DeviceRequest, Session, pause};

// ── RetryPolicy ─────────────────────────────────────────────────────

/// Backoff configuration for session-conflict recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total handshake attempts, including the first. Default: 2.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each later one. Default: 1s.
    pub initial_delay: Duration,

    /// Wait after the pre-emptive release call. Default: 500ms.
    pub release_settle: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_secs(1),
            release_settle: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// `initial_delay * 2^attempt`, where `attempt` is the zero-based index
    /// of the attempt that just failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor)
    }
}

// ── Device seam ─────────────────────────────────────────────────────

/// What the controller needs from a switch.
///
/// [`SwitchClient`] is the real implementation; tests substitute scripted
/// fakes.
pub trait Device {
    /// Best-effort, credential-less release of whatever session the switch
    /// may still hold. Never fails.
    fn release_session(&self) -> impl Future<Output = ()> + Send;

    /// One full handshake, fetch and logout.
    fn fetch_once(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<FetchResult, Error>> + Send;
}

impl Device for SwitchClient {
    async fn release_session(&self) {
        let session = match Session::open(self.base_url(), None, self.transport()) {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "could not open release session (ignored)");
                return;
            }
        };
        let acknowledged = session.send_best_effort(DeviceRequest::logout()).await;
        debug!(acknowledged, "pre-emptive session release");
    }

    async fn fetch_once(&self, request: &FetchRequest) -> Result<FetchResult, Error> {
        SwitchClient::fetch_once(self, request).await
    }
}

// ── Attempt classification ──────────────────────────────────────────

/// Verdict for a single handshake attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The handshake succeeded; per-command failures may still be inside.
    Success(FetchResult),
    /// The switch reported a session conflict; worth another attempt.
    Conflict(Error),
    /// Anything else; retrying will not help.
    Terminal(Error),
}

impl AttemptOutcome {
    pub fn classify(result: Result<FetchResult, Error>) -> Self {
        match result {
            Ok(r) => Self::Success(r),
            Err(e) if e.is_session_conflict() => Self::Conflict(e),
            Err(e) => Self::Terminal(e),
        }
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// Wraps a [`Device`] with pre-emptive release and conflict retries.
///
/// Attempts run strictly one after another; the switch could not serve two
/// sessions anyway.
#[derive(Debug, Clone)]
pub struct RecoveringClient<D> {
    device: D,
    policy: RetryPolicy,
}

impl<D: Device> RecoveringClient<D> {
    pub fn new(device: D, policy: RetryPolicy) -> Self {
        Self { device, policy }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch with recovery.
    ///
    /// Returns the first successful result (even a partially failed one),
    /// the first non-conflict error, or [`Error::RetriesExhausted`].
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, Error> {
        self.device.release_session().await;
        pause(self.policy.release_settle).await;

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            debug!(attempt = attempt + 1, max_attempts, "handshake attempt");

            let conflict = match AttemptOutcome::classify(self.device.fetch_once(request).await) {
                AttemptOutcome::Success(result) => return Ok(result),
                AttemptOutcome::Terminal(e) => return Err(e),
                AttemptOutcome::Conflict(e) => e,
            };

            if attempt + 1 >= max_attempts {
                warn!(
                    attempts = max_attempts,
                    error = %conflict,
                    "session conflict persisted, giving up"
                );
                return Err(Error::RetriesExhausted {
                    attempts: max_attempts,
                    last: Box::new(conflict),
                });
            }

            let delay = self.policy.backoff(attempt);
            debug!(
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                attempt = attempt + 1,
                error = %conflict,
                "session conflict, backing off"
            );
            pause(delay).await;
            attempt += 1;
        }
    }
}
