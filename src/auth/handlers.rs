use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, PublicUser, SignupRequest, SuccessResponse},
        extractors::MaybeUser,
        services,
        session::{removal_cookie, session_cookie},
    },
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let user = services::signup(&state, &payload.email, &payload.password, &payload.nickname).await?;
    let session = services::start_session(&state, &user).await?;

    let jar = jar.add(session_cookie(&state.config.session, session.token));
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: PublicUser {
                email: user.email,
                nickname: user.nickname,
            },
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let user = services::login(&state, &payload.email, &payload.password).await?;
    let session = services::start_session(&state, &user).await?;

    let jar = jar.add(session_cookie(&state.config.session, session.token));
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: PublicUser {
                email: user.email,
                nickname: user.nickname,
            },
        }),
    ))
}

/// Always clears the cookie; a failed server-side delete is only logged.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    let cfg = &state.config.session;
    if let Some(token) = jar.get(&cfg.cookie_name).map(|c| c.value().to_string()) {
        if let Err(e) = state.sessions.invalidate(&token).await {
            warn!(error = %e, "session invalidate failed");
        }
    }
    (jar.add(removal_cookie(cfg)), Json(SuccessResponse { success: true }))
}

#[instrument(skip_all)]
pub async fn get_me(MaybeUser(user): MaybeUser) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: user.is_some(),
        user: user.map(Into::into),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::MeUser;

    #[test]
    fn me_response_serialization() {
        let anonymous = serde_json::to_value(MeResponse {
            authenticated: false,
            user: None,
        })
        .unwrap();
        assert_eq!(anonymous["authenticated"], false);
        assert!(anonymous["user"].is_null());

        let signed_in = serde_json::to_value(MeResponse {
            authenticated: true,
            user: Some(MeUser {
                id: uuid::Uuid::new_v4(),
                email: "test@example.com".into(),
                nickname: "tester".into(),
                profile_image: None,
                tier: crate::articles::dto::Tier::Basic,
            }),
        })
        .unwrap();
        assert_eq!(signed_in["user"]["email"], "test@example.com");
        assert_eq!(signed_in["user"]["tier"], "basic");
    }
}
