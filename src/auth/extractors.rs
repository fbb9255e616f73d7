use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::middleware::CurrentUser;
use super::repo_types::SessionUser;
use crate::error::AppError;
use crate::state::AppState;

/// Signed-in user if there is one.
pub struct MaybeUser(pub Option<SessionUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|c| c.0.clone());
        Ok(MaybeUser(user))
    }
}

/// Signed-in user, or 401.
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Please log in first.".into()))
    }
}

/// Constant time for equal-length inputs.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Caller presented `Authorization: Bearer <CRON_SECRET>`.
/// Without a configured secret every request is refused.
pub struct CronAuth;

#[async_trait]
impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match (state.config.cron_secret.as_deref(), presented) {
            (Some(secret), Some(token)) if secrets_match(token, secret) => Ok(CronAuth),
            _ => {
                tracing::warn!("rejected call without valid bearer secret");
                Err(AppError::Unauthorized("Unauthorized".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::dto::Tier;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_with(user: Option<SessionUser>) -> Parts {
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(CurrentUser(user));
        parts
    }

    #[tokio::test]
    async fn auth_user_rejects_anonymous() {
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &()).await.err().unwrap();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn maybe_user_without_middleware_is_anonymous() {
        let (mut parts, _) = Request::new(()).into_parts();
        let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(user.is_none());
    }

    fn cron_parts(header: Option<&str>) -> Parts {
        let mut req = Request::builder();
        if let Some(h) = header {
            req = req.header(AUTHORIZATION, h);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn cron_auth_requires_matching_secret() {
        let mut config = crate::config::AppConfig::demo();
        config.cron_secret = Some("s3cret".into());
        let state = AppState::in_memory(config);

        let mut ok = cron_parts(Some("Bearer s3cret"));
        assert!(CronAuth::from_request_parts(&mut ok, &state).await.is_ok());

        for header in [None, Some("Bearer nope"), Some("s3cret"), Some("Basic s3cret")] {
            let mut parts = cron_parts(header);
            assert!(CronAuth::from_request_parts(&mut parts, &state).await.is_err());
        }
    }

    #[test]
    fn secrets_match_requires_identical_bytes() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3creT", "s3cret"));
        assert!(!secrets_match("s3cre", "s3cret"));
        assert!(!secrets_match("", "s3cret"));
    }

    #[tokio::test]
    async fn cron_auth_without_configured_secret_always_fails() {
        let state = AppState::fake();
        let mut parts = cron_parts(Some("Bearer "));
        assert!(CronAuth::from_request_parts(&mut parts, &state).await.is_err());
    }

    #[tokio::test]
    async fn auth_user_passes_through_resolved_user() {
        let user = SessionUser {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            nickname: "A".into(),
            profile_image: None,
            tier: Tier::Basic,
        };
        let mut parts = parts_with(Some(user.clone()));
        let AuthUser(got) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(got, user);
    }
}
