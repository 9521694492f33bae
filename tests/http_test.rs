use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use roomtext::config::Config;
use roomtext::templates::TemplateStore;
use roomtext::{create_app, AppState};
use tower::ServiceExt;

struct TestApp {
    _dir: tempfile::TempDir,
    state: AppState,
    app: Router,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        data_path: dir.path().to_path_buf(),
        jwt_secret: "integration-test-secret".to_string(),
        ..Config::default()
    };
    let state = AppState::with_templates(config, TemplateStore::default());
    let app = create_app(state.clone());
    TestApp { _dir: dir, state, app }
}

fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

fn session_cookie(state: &AppState, username: &str) -> String {
    let token = state.tokens.issue(username).unwrap();
    cookie_pair(&state.cookies.session_cookie(&token))
}

async fn body_string(res: axum::response::Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn login_request(username: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(format!("username={username}")))
        .unwrap()
}

fn editor_request(room: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(format!("/editor/{room}"))
        .header(header::HOST, "localhost:8080");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn landing_page_serves_login_form() {
    let t = test_app();
    let res = t
        .app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_string(res).await.contains(r#"action="/login""#));
}

#[tokio::test]
async fn login_redirects_to_fresh_room_with_cookies() {
    let t = test_app();
    let res = t.app.oneshot(login_request("alice", None)).await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    let location = res.headers()[header::LOCATION].to_str().unwrap();
    let room = location.strip_prefix("/editor/").expect("editor redirect");
    assert!(uuid::Uuid::parse_str(room).is_ok());

    let cookies: Vec<_> = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("session=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("last_login=")));
}

#[tokio::test]
async fn returning_user_keeps_last_login_cookie() {
    let t = test_app();
    let recent = format!("last_login={}", (Utc::now() - Duration::hours(1)).to_rfc3339());
    let res = t
        .app
        .oneshot(login_request("alice", Some(&recent)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    let cookies: Vec<_> = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("session="));
}

#[tokio::test]
async fn blank_username_goes_back_home() {
    let t = test_app();
    let res = t.app.oneshot(login_request("+++", None)).await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/");
    assert!(res.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn editor_requires_a_session() {
    let t = test_app();
    let res = t.app.oneshot(editor_request("R", None)).await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn tampered_session_is_rejected() {
    let t = test_app();
    let mut cookie = session_cookie(&t.state, "alice");
    cookie.push('x');
    let res = t.app.oneshot(editor_request("R", Some(&cookie))).await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn editor_renders_escaped_room_text() {
    let t = test_app();
    t.state
        .registry
        .store_for("R")
        .unwrap()
        .write("<b>draft</b>")
        .await
        .unwrap();
    let cookie = session_cookie(&t.state, "alice");

    let res = t.app.oneshot(editor_request("R", Some(&cookie))).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let html = body_string(res).await;
    assert!(html.contains("localhost:8080/ws/R"));
    assert!(html.contains("alice"));
    assert!(html.contains("&lt;b&gt;draft&lt;/b&gt;"));
}

#[tokio::test]
async fn editor_for_new_room_starts_empty() {
    let t = test_app();
    let cookie = session_cookie(&t.state, "bob");

    let res = t.app.oneshot(editor_request("fresh", Some(&cookie))).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_string(res).await.contains("<textarea id=\"doc\"></textarea>"));
}

#[tokio::test]
async fn invalid_room_id_is_a_bad_request() {
    let t = test_app();
    let cookie = session_cookie(&t.state, "alice");

    let res = t
        .app
        .oneshot(editor_request("bad.room", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn socket_route_without_upgrade_is_refused() {
    let t = test_app();
    let cookie = session_cookie(&t.state, "alice");
    let req = Request::builder()
        .uri("/ws/R")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();

    let res = t.app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UPGRADE_REQUIRED);
    assert!(t.state.registry.rooms().is_empty());
}

#[tokio::test]
async fn socket_route_requires_a_session() {
    let t = test_app();
    let req = Request::builder().uri("/ws/R").body(Body::empty()).unwrap();

    let res = t.app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn health_and_diagnostics_report_json() {
    let t = test_app();
    t.state.registry.get_or_open("R").unwrap();

    let res = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/api/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = t
        .app
        .oneshot(Request::builder().uri("/api/diagnostics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(json["n_rooms"], 1);
    assert_eq!(json["n_conn"], 0);
    assert_eq!(json["rooms"][0]["room_id"], "R");
}
