mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, get, post_json, session_cookie, set_cookie_headers, signup,
};
use serde_json::json;

#[tokio::test]
async fn signup_then_me_returns_same_user() {
    let app = build_test_app();
    let res = post_json(
        &app.router,
        "/api/auth/signup",
        json!({ "email": "A@X.com", "password": "secret1", "nickname": "A" }),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = set_cookie_headers(&res).join("\n");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    let cookie = session_cookie(&res).unwrap();

    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["nickname"], "A");

    let me = body_json(get(&app.router, "/api/me", Some(&cookie)).await).await;
    assert_eq!(me["authenticated"], true);
    assert_eq!(me["user"]["email"], "a@x.com");
    assert_eq!(me["user"]["nickname"], "A");
    assert_eq!(me["user"]["tier"], "basic");
    assert!(me["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn me_without_cookie_is_anonymous() {
    let app = build_test_app();
    let res = get(&app.router, "/api/me", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["authenticated"], false);
    assert!(body["user"].is_null());

    let bogus = body_json(get(&app.router, "/api/me", Some("session=not-a-token")).await).await;
    assert_eq!(bogus["authenticated"], false);
}

#[tokio::test]
async fn short_password_is_rejected_and_nothing_is_created() {
    let app = build_test_app();
    let res = post_json(
        &app.router,
        "/api/auth/signup",
        json!({ "email": "a@x.com", "password": "12345", "nickname": "A" }),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&res).is_none());

    let login = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": "a@x.com", "password": "12345" }),
        None,
    )
    .await;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_validation_errors() {
    let app = build_test_app();
    for body in [
        json!({ "email": "a@x.com", "password": "secret1" }),
        json!({ "email": "not-an-email", "password": "secret1", "nickname": "A" }),
        json!({}),
    ] {
        let res = post_json(&app.router, "/api/auth/signup", body, None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(res).await["error"].is_string());
    }
}

#[tokio::test]
async fn malformed_json_is_a_400() {
    let app = build_test_app();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let res = common::send(&app.router, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_signup_and_bad_login() {
    let app = build_test_app();
    signup(&app.router, "a@x.com", "secret1", "A").await;

    let dup = post_json(
        &app.router,
        "/api/auth/signup",
        json!({ "email": "a@x.com", "password": "secret1", "nickname": "A" }),
        None,
    )
    .await;
    assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(dup)
        .await["error"]
        .as_str()
        .unwrap()
        .contains("already registered"));

    let wrong = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": "a@x.com", "password": "wrong-pw" }),
        None,
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong_msg = body_json(wrong).await["error"].clone();

    let unknown = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": "nobody@x.com", "password": "secret1" }),
        None,
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(unknown).await["error"], wrong_msg);
}

#[tokio::test]
async fn login_missing_fields_is_400() {
    let app = build_test_app();
    let res = post_json(&app.router, "/api/auth/login", json!({ "email": "a@x.com" }), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_issues_a_fresh_independent_session() {
    let app = build_test_app();
    let first = signup(&app.router, "a@x.com", "secret1", "A").await;

    let res = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": " A@x.com ", "password": "secret1" }),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let second = session_cookie(&res).unwrap();
    assert_ne!(first, second);

    for cookie in [&first, &second] {
        let me = body_json(get(&app.router, "/api/me", Some(cookie)).await).await;
        assert_eq!(me["authenticated"], true);
    }
}

#[tokio::test]
async fn logout_clears_cookie_and_invalidates_token() {
    let app = build_test_app();
    let cookie = signup(&app.router, "a@x.com", "secret1", "A").await;

    let res = post_json(&app.router, "/api/auth/logout", json!({}), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = set_cookie_headers(&res).join("\n");
    assert!(cleared.contains("session=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(body_json(res).await["success"], true);

    let me = body_json(get(&app.router, "/api/me", Some(&cookie)).await).await;
    assert_eq!(me["authenticated"], false);
}

#[tokio::test]
async fn logout_without_session_still_succeeds() {
    let app = build_test_app();
    let res = post_json(&app.router, "/api/auth/logout", json!({}), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(set_cookie_headers(&res).join("\n").contains("Max-Age=0"));
}

#[tokio::test]
async fn expired_session_is_anonymous() {
    let app = build_test_app();
    let cookie = signup(&app.router, "a@x.com", "secret1", "A").await;
    let token = cookie.trim_start_matches("session=");
    assert!(app.store.set_session_expiry(
        token,
        time::OffsetDateTime::now_utc() - time::Duration::minutes(1)
    ));

    let me = body_json(get(&app.router, "/api/me", Some(&cookie)).await).await;
    assert_eq!(me["authenticated"], false);
}
