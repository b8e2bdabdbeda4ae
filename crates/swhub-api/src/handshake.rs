// Session handshake engine
//
// Replays the browser's login sequence against the switch, fetches the
// requested commands with the resulting session cookie, and always logs
// out afterwards. The switch allows a single management session and holds
// on to it until told otherwise, so the logout is not optional.

use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::catalog::{PORT_COUNTER_COMMAND, PORTS};
use crate::error::Error;
use crate::result::{FetchRequest, FetchResult, Payload};
use crate::transport::{Credentials, DeviceRequest, Pacing, Session, TransportConfig, pause};

/// Client for one switch.
///
/// Holds no session state between calls: every [`fetch_once`](Self::fetch_once)
/// opens a fresh cookie jar and drops it on return.
#[derive(Debug, Clone)]
pub struct SwitchClient {
    base_url: Url,
    credentials: Credentials,
    transport: TransportConfig,
    pacing: Pacing,
}

impl SwitchClient {
    /// Create a client for the switch at `base_url` (e.g. `http://192.168.1.1`).
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url: normalize_base(base_url),
            credentials,
            transport: TransportConfig::default(),
            pacing: Pacing::default(),
        }
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// The switch base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Run one complete handshake and fetch.
    ///
    /// Returns `Err` only when a handshake step fails before any data call.
    /// Individual command failures are recorded as markers in the result.
    /// A logout is issued on every path once the session exists.
    pub async fn fetch_once(&self, request: &FetchRequest) -> Result<FetchResult, Error> {
        let session = Session::open(&self.base_url, Some(&self.credentials), &self.transport)?;

        let outcome = match self.login(&session).await {
            Ok(()) => Ok(self.fetch_all(&session, request).await),
            Err(e) => Err(e),
        };

        self.logout(&session).await;
        outcome
    }

    // ── Handshake steps ─────────────────────────────────────────────

    /// Steps 1-6: top page, login page, cookie bootstrap, credential POST,
    /// login status check, home page.
    async fn login(&self, session: &Session<'_>) -> Result<(), Error> {
        debug!(switch = %self.base_url, "starting login handshake");

        session.send(DeviceRequest::page("").basic_auth()).await?;
        pause(self.pacing.page).await;

        session
            .send(DeviceRequest::page("login.html").referer("").basic_auth())
            .await?;
        pause(self.pacing.page).await;

        // Only here for the cookies it sets; the body is read and dropped.
        let bootstrap = session
            .send(
                DeviceRequest::cgi_get("home_login")
                    .referer("login.html")
                    .basic_auth(),
            )
            .await?;
        trace!(bytes = bootstrap.body.len(), cookies = ?session.cookie_header(), "cookie bootstrap");
        pause(self.pacing.bootstrap).await;

        session
            .send(
                DeviceRequest::cgi_set("home_loginAuth", login_body(&self.credentials))
                    .referer("login.html"),
            )
            .await?;
        pause(self.pacing.login).await;

        let status = session
            .send(DeviceRequest::cgi_get("home_loginStatus").referer("login.html"))
            .await?;
        trace!(bytes = status.body.len(), "login status");
        pause(self.pacing.status).await;

        session
            .send(DeviceRequest::page("home.html").referer("login.html"))
            .await?;
        pause(self.pacing.home).await;

        debug!("login handshake complete");
        Ok(())
    }

    /// Fetch every requested command, then per-port traffic if asked.
    async fn fetch_all(&self, session: &Session<'_>, request: &FetchRequest) -> FetchResult {
        let mut result = FetchResult::new();

        for cmd in &request.commands {
            let payload = fetch_payload(session, DeviceRequest::cgi_get(cmd)).await;
            result.insert(cmd.clone(), payload);
        }

        if request.port_traffic {
            for port in PORTS {
                let req = DeviceRequest::cgi_get(PORT_COUNTER_COMMAND).param("port", port);
                let payload = fetch_payload(session, req).await;
                result.insert_port_traffic(port, payload);
            }
        }

        debug!(
            slots = result.len(),
            errors = result.error_count(),
            "fetch complete"
        );
        result
    }

    /// Best-effort logout followed by the settle delay.
    async fn logout(&self, session: &Session<'_>) {
        let acknowledged = session.send_best_effort(DeviceRequest::logout()).await;
        debug!(acknowledged, "logout sent");
        pause(self.pacing.logout_settle).await;
    }
}

/// One data call, isolated: every failure becomes this slot's marker.
async fn fetch_payload(session: &Session<'_>, req: DeviceRequest) -> Payload {
    match session.send(req.referer("home.html")).await {
        Ok(resp) => Payload::from_body(&resp.body),
        Err(e) => {
            debug!(error = %e, "data call failed");
            Payload::error(e.to_string())
        }
    }
}

/// The login form as the web UI submits it: the whole form-encoded string
/// is used as a single JSON object key mapped to `{}`.
pub(crate) fn login_body(credentials: &Credentials) -> Value {
    use secrecy::ExposeSecret;

    let form = format!(
        "_ds=1&username={}&password={}&optLanguage=1&_de=1",
        credentials.username,
        credentials.password.expose_secret()
    );
    let mut body = Map::new();
    body.insert(form, Value::Object(Map::new()));
    Value::Object(body)
}

/// Make relative joins resolve against the base path.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::SecretString;

    use super::*;

    #[test]
    fn login_body_is_byte_exact() {
        let creds = Credentials::new("admin", SecretString::from("p@ss"));
        let text = serde_json::to_string(&login_body(&creds)).unwrap();
        assert_eq!(
            text,
            r#"{"_ds=1&username=admin&password=p@ss&optLanguage=1&_de=1":{}}"#
        );
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base(Url::parse("http://192.0.2.1/switch").unwrap());
        assert_eq!(url.as_str(), "http://192.0.2.1/switch/");
        let url = normalize_base(Url::parse("http://192.0.2.1").unwrap());
        assert_eq!(url.as_str(), "http://192.0.2.1/");
    }
}
