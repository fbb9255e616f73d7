#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use meddigest::config::AppConfig;
use meddigest::mail::{Email, MailError, Mailer};
use meddigest::papers::{ArticleDraft, PaperSource, Topic};
use meddigest::store::MemoryStore;
use meddigest::{build_app, AppState};

pub const CRON_SECRET: &str = "test-cron-secret";

/// Accepts every message except those addressed to an email containing "fail".
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if email.to.contains("fail") {
            return Err(MailError::Status {
                status: 422,
                body: "rejected".into(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Returns one long-abstract draft per topic, keyed by topic.
pub struct StubPapers;

#[async_trait]
impl PaperSource for StubPapers {
    async fn fetch_recent_papers(&self, topic: &Topic) -> Vec<ArticleDraft> {
        vec![ArticleDraft {
            pmid: format!("pmid-{}", topic.key),
            title: format!("Recent {} findings in a large cohort", topic.key),
            journal: "Test Journal".into(),
            abstract_text: "Background and methods. ".repeat(8),
            doi: None,
        }]
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::demo();
    config.cron_secret = Some(CRON_SECRET.into());
    config
}

/// Full router over a seeded in-memory store, a recording mailer and stub papers.
pub fn build_test_app_with(config: AppConfig, with_mailer: bool) -> TestApp {
    let store = MemoryStore::seeded();
    let mailer = Arc::new(RecordingMailer::default());
    let mut state = AppState::from_memory(config, store.clone()).with_papers(Arc::new(StubPapers));
    if with_mailer {
        state = state.with_mailer(mailer.clone());
    }
    TestApp {
        router: build_app(state),
        store,
        mailer,
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config(), true)
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        req = req.header(COOKIE, c);
    }
    send(app, req.body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        req = req.header(COOKIE, c);
    }
    send(app, req.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn request_with_cookie(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(c) = cookie {
        req = req.header(COOKIE, c);
    }
    send(app, req.body(Body::empty()).unwrap()).await
}

pub async fn post_bearer(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut req = Request::builder().method("POST").uri(uri);
    if let Some(t) = token {
        req = req.header(AUTHORIZATION, format!("Bearer {t}"));
    }
    send(app, req.body(Body::empty()).unwrap()).await
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

pub async fn body_text(res: Response<Body>) -> String {
    String::from_utf8(body_bytes(res).await).unwrap()
}

/// `name=value` of the session cookie set by the response, if any.
pub fn session_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

pub fn set_cookie_headers(res: &Response<Body>) -> Vec<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// Signs up and returns the `session=..` cookie pair.
pub async fn signup(app: &Router, email: &str, password: &str, nickname: &str) -> String {
    let res = post_json(
        app,
        "/api/auth/signup",
        serde_json::json!({ "email": email, "password": password, "nickname": nickname }),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    session_cookie(&res).expect("signup sets a session cookie")
}
