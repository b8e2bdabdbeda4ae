// Raw request primitive
//
// Every exchange with the switch goes through `Session::send` (failures
// matter) or `Session::send_best_effort` (failures are swallowed). Both
// inject the browser-like headers the web UI sends, the optional Basic
// credentials, and the per-session cookie jar.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;

/// The web UI refuses clients that do not look like a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
const ACCEPT_LANGUAGE_VALUE: &str = "ja,en-US;q=0.9,en;q=0.8";

// ── Configuration ───────────────────────────────────────────────────

/// Username and password for the switch's management account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Shared transport configuration for building per-session HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for handshake and data calls.
    pub timeout: Duration,
    /// Timeout for best-effort calls (logout, pre-emptive release).
    pub best_effort_timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            best_effort_timeout: Duration::from_secs(5),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers);

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder.build().map_err(Error::Client)
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

/// Fixed delays between exchanges.
///
/// The switch commits session state slowly and throttles clients that
/// move faster than a person clicking through the UI, so these pauses are
/// part of the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// After the top page and the login page.
    pub page: Duration,
    /// After the `home_login` cookie bootstrap.
    pub bootstrap: Duration,
    /// After the credential POST.
    pub login: Duration,
    /// After the `home_loginStatus` check.
    pub status: Duration,
    /// After `home.html`, before the first data call.
    pub home: Duration,
    /// After the final logout.
    pub logout_settle: Duration,
    /// Between steps of a forced disconnect.
    pub disconnect_step: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page: Duration::from_millis(200),
            bootstrap: Duration::from_millis(300),
            login: Duration::from_millis(300),
            status: Duration::from_millis(200),
            home: Duration::from_millis(500),
            logout_settle: Duration::from_secs(1),
            disconnect_step: Duration::from_millis(200),
        }
    }
}

impl Pacing {
    /// No delays at all. Only useful against fake devices.
    pub fn none() -> Self {
        Self {
            page: Duration::ZERO,
            bootstrap: Duration::ZERO,
            login: Duration::ZERO,
            status: Duration::ZERO,
            home: Duration::ZERO,
            logout_settle: Duration::ZERO,
            disconnect_step: Duration::ZERO,
        }
    }
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Millisecond timestamp for the `dummy=` cache buster.
fn cache_buster() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

// ── Request description ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Accept {
    Html,
    Json,
}

impl Accept {
    fn header_value(self) -> &'static str {
        match self {
            Self::Html => ACCEPT_HTML,
            Self::Json => ACCEPT_JSON,
        }
    }
}

/// One exchange with the switch, described independently of any session.
#[derive(Debug, Clone)]
pub(crate) struct DeviceRequest {
    method: Method,
    path: &'static str,
    query: Vec<(&'static str, String)>,
    referer: Option<&'static str>,
    accept: Accept,
    xhr: bool,
    basic_auth: bool,
    best_effort: bool,
    body: Option<Value>,
}

impl DeviceRequest {
    /// A plain page load (`/`, `/login.html`, ...).
    pub(crate) fn page(path: &'static str) -> Self {
        Self {
            method: Method::GET,
            path,
            query: Vec::new(),
            referer: None,
            accept: Accept::Html,
            xhr: false,
            basic_auth: false,
            best_effort: false,
            body: None,
        }
    }

    /// `GET /cgi/get.cgi?cmd=<cmd>&dummy=<ms>` as issued by the UI's XHR layer.
    pub(crate) fn cgi_get(cmd: &str) -> Self {
        Self {
            method: Method::GET,
            path: "cgi/get.cgi",
            query: vec![("cmd", cmd.to_owned())],
            referer: None,
            accept: Accept::Json,
            xhr: true,
            basic_auth: false,
            best_effort: false,
            body: None,
        }
    }

    /// `POST /cgi/set.cgi?cmd=<cmd>&dummy=<ms>` with a JSON body.
    pub(crate) fn cgi_set(cmd: &str, body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            path: "cgi/set.cgi",
            ..Self::cgi_get(cmd)
        }
    }

    /// `GET /login.html?reason=logout`.
    pub(crate) fn logout() -> Self {
        Self::page("login.html")
            .param("reason", "logout")
            .referer("home.html")
            .best_effort()
    }

    pub(crate) fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// Referer path relative to the switch root (`""` for the top page).
    pub(crate) fn referer(mut self, path: &'static str) -> Self {
        self.referer = Some(path);
        self
    }

    pub(crate) fn basic_auth(mut self) -> Self {
        self.basic_auth = true;
        self
    }

    /// Use the shorter best-effort timeout.
    pub(crate) fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    fn is_cgi(&self) -> bool {
        self.path.starts_with("cgi/")
    }
}

/// Body of a completed exchange.
#[derive(Debug, Clone)]
pub(crate) struct DeviceResponse {
    pub body: String,
}

// ── Session ─────────────────────────────────────────────────────────

/// One cookie jar bound to one switch, alive for a single handshake run
/// or a single disconnect pass.
pub(crate) struct Session<'a> {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: &'a Url,
    credentials: Option<&'a Credentials>,
    transport: &'a TransportConfig,
}

impl<'a> Session<'a> {
    /// Open a session with a fresh cookie jar.
    ///
    /// `credentials` is only used for requests flagged with Basic auth;
    /// `None` yields a credential-less session.
    pub(crate) fn open(
        base_url: &'a Url,
        credentials: Option<&'a Credentials>,
        transport: &'a TransportConfig,
    ) -> Result<Self, Error> {
        let config = transport.clone().with_cookie_jar();
        let jar = config
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));
        let http = config.build_client()?;
        Ok(Self {
            http,
            jar,
            base_url,
            credentials,
            transport,
        })
    }

    /// The `Cookie` header the jar would currently send to the switch.
    pub(crate) fn cookie_header(&self) -> Option<String> {
        let cookies = self.jar.cookies(self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    fn url_for(&self, req: &DeviceRequest) -> Result<Url, Error> {
        let mut url = self.base_url.join(req.path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &req.query {
                pairs.append_pair(key, value);
            }
            if req.is_cgi() {
                pairs.append_pair("dummy", &cache_buster());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    /// Send a request whose failure matters.
    ///
    /// Non-success statuses become [`Error::Status`]; the body is read in
    /// full so the switch sees a complete exchange.
    pub(crate) async fn send(&self, req: DeviceRequest) -> Result<DeviceResponse, Error> {
        let url = self.url_for(&req)?;
        let timeout = if req.best_effort {
            self.transport.best_effort_timeout
        } else {
            self.transport.timeout
        };

        debug!(method = %req.method, %url, "switch request");

        let mut builder = self
            .http
            .request(req.method.clone(), url.clone())
            .timeout(timeout)
            .header(ACCEPT, req.accept.header_value());

        if let Some(path) = req.referer {
            builder = builder.header(REFERER, self.base_url.join(path)?.as_str());
        }
        if req.xhr {
            builder = builder.header("X-Requested-With", "XMLHttpRequest");
        }
        if req.basic_auth
            && let Some(creds) = self.credentials
        {
            builder = builder.basic_auth(&creds.username, Some(creds.password.expose_secret()));
        }
        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout.as_secs()))?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, %url, "switch rejected request");
            return Err(Error::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout.as_secs()))?;
        trace!(%status, bytes = body.len(), "switch response");

        Ok(DeviceResponse { body })
    }

    /// Send a cleanup or pre-emptive request, discarding any failure.
    ///
    /// Returns `true` when the switch answered with a success status.
    pub(crate) async fn send_best_effort(&self, req: DeviceRequest) -> bool {
        match self.send(req.best_effort()).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "best-effort request failed (ignored)");
                false
            }
        }
    }
}
