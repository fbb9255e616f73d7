use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use crate::auth::repo_types::SessionUser;
use crate::state::AppState;

/// Request-scoped result of session resolution.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

/// Resolves the session cookie before any handler runs. Never rejects:
/// handlers decide for themselves whether a user is required.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let user = match jar.get(&state.config.session.cookie_name) {
        Some(cookie) if !cookie.value().is_empty() => {
            match state.sessions.resolve(cookie.value()).await {
                Ok(user) => user,
                Err(e) => {
                    warn!(error = %e, "session lookup failed; continuing anonymously");
                    None
                }
            }
        }
        _ => None,
    };

    if let Some(u) = &user {
        debug!(user_id = %u.id, "session resolved");
    }
    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}
