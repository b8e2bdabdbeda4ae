// Forced disconnect
//
// Coaxes the switch into dropping a session it refuses to release. Walks
// the first part of the login sequence with Basic credentials so the
// switch ties the cookie jar to the account, then logs out. Every step is
// best-effort: the switch is often half-responsive in exactly the state
// this is meant to fix.

use std::time::Duration;

use tracing::{debug, info};

use crate::handshake::SwitchClient;
use crate::transport::{DeviceRequest, Session, pause};

/// How many disconnect passes to run and how long to wait between them.
///
/// One pass is frequently not enough to convince the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectPolicy {
    /// Default: 3.
    pub passes: u32,
    /// Pause after each pass. Default: 1s.
    pub pause: Duration,
}

impl Default for DisconnectPolicy {
    fn default() -> Self {
        Self {
            passes: 3,
            pause: Duration::from_secs(1),
        }
    }
}

/// Result of one disconnect pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The logout request got a success response.
    Released,
    /// The logout request failed; the switch may or may not have let go.
    Attempted,
}

impl DisconnectOutcome {
    /// One-line status for operators.
    pub fn status_line(self) -> &'static str {
        match self {
            Self::Released => "Session disconnected",
            Self::Attempted => "Session disconnect attempted",
        }
    }
}

impl SwitchClient {
    /// Run a single disconnect pass: top page, login page, `home_login`
    /// cookie bootstrap, logout. Never fails.
    pub async fn force_disconnect(&self) -> DisconnectOutcome {
        let session = match Session::open(self.base_url(), Some(self.credentials()), self.transport())
        {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "could not open disconnect session");
                return DisconnectOutcome::Attempted;
            }
        };
        let step = self.pacing().disconnect_step;

        session
            .send_best_effort(DeviceRequest::page("").basic_auth())
            .await;
        pause(step).await;

        session
            .send_best_effort(DeviceRequest::page("login.html").referer("").basic_auth())
            .await;
        pause(step).await;

        session
            .send_best_effort(
                DeviceRequest::cgi_get("home_login")
                    .referer("login.html")
                    .basic_auth(),
            )
            .await;
        pause(step).await;

        let released = session
            .send_best_effort(DeviceRequest::logout().basic_auth())
            .await;

        if released {
            DisconnectOutcome::Released
        } else {
            DisconnectOutcome::Attempted
        }
    }

    /// Run [`force_disconnect`](Self::force_disconnect) `policy.passes` times,
    /// calling `on_pass` with the 1-based pass number and its outcome.
    pub async fn force_disconnect_repeated(
        &self,
        policy: &DisconnectPolicy,
        mut on_pass: impl FnMut(u32, DisconnectOutcome),
    ) -> Vec<DisconnectOutcome> {
        let mut outcomes = Vec::new();
        for pass in 1..=policy.passes {
            let outcome = self.force_disconnect().await;
            info!(pass, passes = policy.passes, ?outcome, "disconnect pass finished");
            on_pass(pass, outcome);
            outcomes.push(outcome);
            pause(policy.pause).await;
        }
        outcomes
    }
}
