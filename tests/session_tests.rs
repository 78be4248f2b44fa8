//! Session manager tests
//!
//! These run the session manager over a scripted transport, so every request
//! it builds can be inspected without a controller.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use rustible_aos::connection::{ConnectionError, HttpMethod, HttpRequest, RawResponse};
use rustible_aos::httpapi::{ResponseBody, LOGIN_PATH, LOGOUT_PATH};

// ============================================================================
// Login / Logout
// ============================================================================

#[tokio::test]
async fn test_login_stores_token() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_login();

    api.login(&mut session, USERNAME, PASSWORD).await.unwrap();

    assert!(session.is_authenticated());
    assert_eq!(session.token().unwrap().uid(), TOKEN);

    let login = transport.last_request().unwrap();
    assert_eq!(login.method, HttpMethod::Get);
    assert!(login.path.starts_with(LOGIN_PATH));
    assert_eq!(query_param(&login.path, "username").as_deref(), Some(USERNAME));
    assert_eq!(query_param(&login.path, "password").as_deref(), Some(PASSWORD));
    assert!(login.headers.get("Cookie").is_none());
}

#[test]
fn test_login_path_is_not_logged_with_password() {
    let request = HttpRequest::get(format!("{}?username=admin&password=hunter2", LOGIN_PATH));
    assert_eq!(request.loggable_path(), LOGIN_PATH);
}

#[tokio::test]
async fn test_requests_carry_session_credential() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_login();
    api.login(&mut session, USERNAME, PASSWORD).await.unwrap();

    transport.push_json(200, json!({"_data": {}}));
    api.send_request(
        &mut session,
        HttpRequest::get("/v1/configuration/object/config?config_path=%2Fmd"),
    )
    .await
    .unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(
        request.headers.get("Cookie").map(String::as_str),
        Some(format!("SESSION={}", TOKEN).as_str())
    );
    assert_eq!(query_param(&request.path, "config_path").as_deref(), Some("/md"));
    assert_eq!(query_param(&request.path, "UIDARUBA").as_deref(), Some(TOKEN));
    assert!(request.path.contains("config_path=%2Fmd&UIDARUBA="));
}

#[tokio::test]
async fn test_logout_omits_query_credential_and_clears_session() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_login();
    api.login(&mut session, USERNAME, PASSWORD).await.unwrap();

    transport.push_json(200, json!({"_global_result": {"status": "0"}}));
    api.logout(&mut session).await.unwrap();

    let logout = transport.last_request().unwrap();
    assert_eq!(logout.path, LOGOUT_PATH);
    assert!(logout.headers.contains_key("Cookie"));
    assert!(!session.is_authenticated());
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_logout_without_login_still_reaches_controller() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();

    assert_ok!(api.logout(&mut session).await);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, LOGOUT_PATH);
    assert!(!requests[0].headers.contains_key("Cookie"));
    assert_eq!(transport.connect_count(), 1);
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_close_of_unused_session_sends_nothing() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();

    assert_ok!(api.close(&mut session).await);

    assert!(transport.requests().is_empty());
    assert_eq!(transport.close_count(), 1);
}

#[tokio::test]
async fn test_login_without_identifier_fails() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_json(
        200,
        json!({"_global_result": {"status": "1", "status_str": "Authentication failed"}}),
    );

    let err = assert_err!(api.login(&mut session, USERNAME, "wrong").await);

    match err {
        ConnectionError::AuthenticationFailed(reason) => {
            assert_eq!(reason, "Authentication failed");
        }
        other => panic!("expected authentication failure, got {:?}", other),
    }
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_any_response_with_identifier_refreshes_token() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_login();
    api.login(&mut session, USERNAME, PASSWORD).await.unwrap();

    transport.push_json(200, login_body("rotated"));
    api.send_request(&mut session, HttpRequest::get("/v1/configuration/showcommand"))
        .await
        .unwrap();

    assert_eq!(session.token().unwrap().uid(), "rotated");
}

// ============================================================================
// Connection Lifecycle
// ============================================================================

#[tokio::test]
async fn test_connects_lazily_once() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    assert_eq!(transport.connect_count(), 0);

    for _ in 0..3 {
        api.send_request(&mut session, HttpRequest::get("/v1/configuration/object/config"))
            .await
            .unwrap();
    }

    assert_eq!(transport.connect_count(), 1);
    assert!(session.is_connected());
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_close_logs_out_and_closes_transport() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_login();
    api.login(&mut session, USERNAME, PASSWORD).await.unwrap();

    api.close(&mut session).await.unwrap();

    assert_eq!(transport.last_request().unwrap().path, LOGOUT_PATH);
    assert_eq!(transport.close_count(), 1);
    assert!(!session.is_authenticated());
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_close_survives_failed_logout() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_login();
    api.login(&mut session, USERNAME, PASSWORD).await.unwrap();

    transport.push_error(ConnectionError::Timeout(30));
    assert_ok!(api.close(&mut session).await);

    assert_eq!(transport.close_count(), 1);
    assert!(!session.is_authenticated());
}

// ============================================================================
// Response Handling
// ============================================================================

#[tokio::test]
async fn test_error_status_with_body() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_raw(404, "Not Found");

    let err = api
        .send_request(&mut session, HttpRequest::get("/v1/configuration/object/nope"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(404));
    assert_eq!(err.to_string(), "Error: 404, Not Found");
}

#[tokio::test]
async fn test_error_status_without_body_uses_reason() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_response(RawResponse::new(503, Vec::new()).with_reason("Service Unavailable"));
    transport.push_raw(500, Vec::new());

    let err = api
        .send_request(&mut session, HttpRequest::get("/v1/configuration/object/config"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP Error 503: Service Unavailable");

    let err = api
        .send_request(&mut session, HttpRequest::get("/v1/configuration/object/config"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP Error 500: Unknown");
}

#[tokio::test]
async fn test_json_error_body_is_included() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_json(400, json!({"Error": "bad object"}));

    let err = api
        .send_request(
            &mut session,
            HttpRequest::post("/v1/configuration/object", "{}"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(400));
    assert_eq!(err.to_string(), r#"Error: 400, {"Error":"bad object"}"#);
}

#[tokio::test]
async fn test_non_json_body_is_returned_raw() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_raw(200, "<html>maintenance</html>");

    let response = api
        .send_request(&mut session, HttpRequest::get("/v1/configuration/showcommand"))
        .await
        .unwrap();

    assert_eq!(response.code, 200);
    assert_eq!(
        response.body,
        ResponseBody::Raw("<html>maintenance</html>".to_string())
    );
}

#[tokio::test]
async fn test_unreadable_body_propagates() {
    let (transport, api) = scripted_api();
    let mut session = api.open_session();
    transport.push_error(ConnectionError::UnreadableBody("connection reset".to_string()));

    let err = api
        .send_request(&mut session, HttpRequest::get("/v1/configuration/object/config"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectionError::UnreadableBody(_)));
    assert_eq!(err.code(), None);
}
