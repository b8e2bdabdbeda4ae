#![allow(clippy::unwrap_used)]
// Wire-level tests for the handshake engine against a wiremock switch.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use swhub_api::{
    AUTH_FAILED_MARKER, Category, Error, FetchRequest, PARSE_ERROR_MARKER, PORTS, Payload,
};

use common::{
    cgi_command, cgi_get, client, count, header, is_data_call, is_handshake, is_logout,
    mount_handshake, mount_login_auth, padded, requests,
};

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_main_only_end_to_end() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    cgi_get("home_main")
        .respond_with(ResponseTemplate::new(200).set_body_string(padded(&json!({
            "data": { "title": "X" }
        }))))
        .mount(&server)
        .await;

    let request = FetchRequest::from_categories(&[Category::Main], false);
    let result = client(&server).fetch_once(&request).await.unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "home_main": { "data": { "title": "X" } } })
    );

    let reqs = requests(&server).await;
    assert_eq!(count(&reqs, is_handshake), 6);
    assert_eq!(count(&reqs, is_data_call), 1);
    assert_eq!(count(&reqs, is_logout), 1);
    assert_eq!(reqs.len(), 8);
    assert!(is_logout(reqs.last().unwrap()), "logout must be the last call");
}

#[tokio::test]
async fn test_handshake_order_and_auth_headers() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    let request = FetchRequest::default();
    client(&server).fetch_once(&request).await.unwrap();

    let reqs = requests(&server).await;
    let steps: Vec<String> = reqs
        .iter()
        .map(|r| cgi_command(r).unwrap_or_else(|| r.url.path().to_owned()))
        .collect();
    assert_eq!(
        steps,
        vec![
            "/",
            "/login.html",
            "home_login",
            "home_loginAuth",
            "home_loginStatus",
            "/home.html",
            "/login.html",
        ]
    );

    // Basic credentials ride on the first three steps only.
    for req in &reqs[..3] {
        let auth = header(req, "authorization").unwrap();
        assert!(auth.starts_with("Basic "), "{auth}");
    }
    for req in &reqs[3..] {
        assert!(header(req, "authorization").is_none());
    }

    // The credential POST is JSON.
    let login = &reqs[3];
    assert_eq!(login.method.as_str(), "POST");
    assert!(header(login, "content-type").unwrap().starts_with("application/json"));
    assert_eq!(
        header(login, "x-requested-with"),
        Some("XMLHttpRequest")
    );
}

#[tokio::test]
async fn test_data_calls_look_like_the_web_ui() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    cgi_get("panel_info")
        .respond_with(ResponseTemplate::new(200).set_body_string(padded(&json!({"data": {"ports": []}}))))
        .mount(&server)
        .await;

    let request = FetchRequest::from_categories(&[Category::Status], false);
    client(&server).fetch_once(&request).await.unwrap();

    let reqs = requests(&server).await;
    let data = reqs.iter().find(|r| is_data_call(r)).unwrap();
    assert!(header(data, "referer").unwrap().ends_with("/home.html"));
    assert_eq!(header(data, "x-requested-with"), Some("XMLHttpRequest"));
    assert!(header(data, "cookie").unwrap().contains("SID=abc123"));
    assert!(
        data.url.query_pairs().any(|(k, v)| k == "dummy" && v.parse::<i64>().is_ok()),
        "missing cache buster: {}",
        data.url
    );
    assert!(header(data, "user-agent").unwrap().starts_with("Mozilla/5.0"));
}

// ── Per-command isolation ───────────────────────────────────────────

#[tokio::test]
async fn test_every_command_gets_a_slot_regardless_of_failures() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    cgi_get("vlan_port")
        .respond_with(ResponseTemplate::new(200).set_body_string(padded(&json!({"data": {"pvid": [1, 1]}}))))
        .mount(&server)
        .await;
    cgi_get("vlan_conf")
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"notAuth"}"#))
        .mount(&server)
        .await;
    cgi_get("vlan_membership")
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    cgi_get("mac_dynamic")
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body>the session page came back instead of any data</body></html>",
        ))
        .mount(&server)
        .await;
    // mac_static is not mounted at all: wiremock answers 404.

    let request = FetchRequest::from_categories(&[Category::Vlan, Category::Mac], false);
    let result = client(&server).fetch_once(&request).await.unwrap();

    let keys: Vec<&str> = result.entries().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec!["vlan_port", "vlan_conf", "vlan_membership", "mac_dynamic", "mac_static"]
    );
    assert_eq!(
        result.get("vlan_port"),
        Some(&Payload::Data(json!({"data": {"pvid": [1, 1]}})))
    );
    assert_eq!(result.get("vlan_conf"), Some(&Payload::error(AUTH_FAILED_MARKER)));
    assert_eq!(result.get("mac_dynamic"), Some(&Payload::error(PARSE_ERROR_MARKER)));

    // Markers carry no per-request URL, so repeated runs render identically.
    assert_eq!(
        result.get("vlan_membership"),
        Some(&Payload::error("HTTP Error 500: Internal Server Error"))
    );
    assert_eq!(
        result.get("mac_static"),
        Some(&Payload::error("HTTP Error 404: Not Found"))
    );

    assert!(result.port_traffic().is_none());
    assert_eq!(count(&requests(&server).await, is_logout), 1);
}

#[tokio::test]
async fn test_port_traffic_has_twelve_slots() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    cgi_get("port_cnt")
        .respond_with(ResponseTemplate::new(200).set_body_string(padded(&json!({
            "data": { "rxGoodPkt": 10, "txGoodPkt": 20 }
        }))))
        .mount(&server)
        .await;

    let request = FetchRequest::from_categories(&[], true);
    let result = client(&server).fetch_once(&request).await.unwrap();

    let traffic = result.port_traffic().unwrap();
    assert_eq!(traffic.len(), 12);
    let ports: Vec<&str> = traffic.keys().map(String::as_str).collect();
    assert_eq!(ports, PORTS.to_vec());
    assert!(traffic.values().all(|p| !p.is_error()));

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["port_traffic_all"]["LAG4"]["data"]["txGoodPkt"], 20);

    let reqs = requests(&server).await;
    let queried: Vec<String> = reqs
        .iter()
        .filter(|r| cgi_command(r).as_deref() == Some("port_cnt"))
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "port")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(queried, PORTS.iter().map(ToString::to_string).collect::<Vec<_>>());
}

// ── Handshake failures ──────────────────────────────────────────────

#[tokio::test]
async fn test_login_conflict_aborts_and_still_logs_out() {
    let server = MockServer::start().await;
    // Mounted first so it outranks the 200 answer from mount_handshake.
    mount_login_auth(&server, ResponseTemplate::new(400)).await;
    mount_handshake(&server).await;

    let request = FetchRequest::from_categories(&[Category::Main], true);
    let err = client(&server).fetch_once(&request).await.unwrap_err();

    assert!(err.is_session_conflict(), "unexpected error: {err:?}");
    assert!(err.to_string().contains("Bad Request"));

    let reqs = requests(&server).await;
    assert_eq!(count(&reqs, is_data_call), 0);
    assert_eq!(count(&reqs, is_logout), 1);
}

#[tokio::test]
async fn test_missing_home_page_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    common::mount_logout(&server).await;

    let err = client(&server)
        .fetch_once(&FetchRequest::from_categories(&[Category::Status], false))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Status { .. }));
    assert!(!err.is_session_conflict());

    let reqs = requests(&server).await;
    assert_eq!(reqs.len(), 2, "top page then logout");
    assert_eq!(count(&reqs, is_logout), 1);
}

#[tokio::test]
async fn test_unreachable_switch_is_a_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = url::Url::parse(&format!("http://{addr}")).unwrap();
    let client = swhub_api::SwitchClient::new(
        base,
        swhub_api::Credentials::new("admin", secrecy::SecretString::from("x")),
    )
    .with_pacing(swhub_api::Pacing::none());

    let err = client
        .fetch_once(&FetchRequest::from_categories(&[Category::Main], false))
        .await
        .unwrap_err();
    assert!(err.is_connect(), "expected connect error, got {err:?}");
}
