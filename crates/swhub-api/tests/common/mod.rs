// Shared fake-switch fixtures for the wiremock-based tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use swhub_api::{Credentials, Pacing, SwitchClient, TransportConfig};

pub const USER: &str = "admin";
pub const PASSWORD: &str = "s3cret";

/// Client pointed at the fake switch, without pacing delays.
pub fn client(server: &MockServer) -> SwitchClient {
    let base = Url::parse(&server.uri()).unwrap();
    SwitchClient::new(base, Credentials::new(USER, SecretString::from(PASSWORD)))
        .with_pacing(Pacing::none())
        .with_transport(TransportConfig {
            timeout: Duration::from_secs(5),
            best_effort_timeout: Duration::from_secs(2),
            cookie_jar: None,
        })
}

/// The switch pads its CGI responses; mimic that so short fixtures clear
/// the minimum-length check.
pub fn padded(value: &serde_json::Value) -> String {
    format!("{value}{}", " ".repeat(64))
}

pub fn cgi_get(cmd: &str) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path("/cgi/get.cgi"))
        .and(query_param("cmd", cmd))
}

/// Mount every handshake endpoint plus the logout page, all answering 200.
pub async fn mount_handshake(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/login.html"))
        .and(query_param_is_missing("reason"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(server)
        .await;

    cgi_get("home_login")
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "SID=abc123; Path=/")
                .set_body_string(r#"{"data":{"logined":0}}"#),
        )
        .mount(server)
        .await;

    mount_login_auth(server, ResponseTemplate::new(200).set_body_string("{}")).await;

    cgi_get("home_loginStatus")
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{"status":"ok"}}"#))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/home.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
        .mount(server)
        .await;

    mount_logout(server).await;
}

pub async fn mount_login_auth(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/cgi/set.cgi"))
        .and(query_param("cmd", "home_loginAuth"))
        .and(body_json(login_form_body()))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_logout(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login.html"))
        .and(query_param("reason", "logout"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>bye</html>"))
        .mount(server)
        .await;
}

/// `{"_ds=1&username=..&password=..&optLanguage=1&_de=1": {}}`
pub fn login_form_body() -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert(
        format!("_ds=1&username={USER}&password={PASSWORD}&optLanguage=1&_de=1"),
        json!({}),
    );
    serde_json::Value::Object(body)
}

// ── Request inspection ──────────────────────────────────────────────

fn query_value(req: &Request, key: &str) -> Option<String> {
    req.url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn is_logout(req: &Request) -> bool {
    req.url.path() == "/login.html" && query_value(req, "reason").as_deref() == Some("logout")
}

pub fn cgi_command(req: &Request) -> Option<String> {
    if req.url.path().starts_with("/cgi/") {
        query_value(req, "cmd")
    } else {
        None
    }
}

pub fn is_handshake(req: &Request) -> bool {
    match req.url.path() {
        "/" | "/home.html" => true,
        "/login.html" => !is_logout(req),
        _ => matches!(
            cgi_command(req).as_deref(),
            Some("home_login" | "home_loginAuth" | "home_loginStatus")
        ),
    }
}

pub fn is_data_call(req: &Request) -> bool {
    cgi_command(req).is_some() && !is_handshake(req)
}

pub async fn requests(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap()
}

pub fn count(requests: &[Request], pred: impl Fn(&Request) -> bool) -> usize {
    requests.iter().filter(|r| pred(r)).count()
}

pub fn header<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers.get(name).and_then(|v| v.to_str().ok())
}
