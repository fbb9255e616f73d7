use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{extractors::CronAuth, services::normalize_email},
    error::{AppError, AppResult},
    newsletter::{
        dto::{StatsResponse, SubscribeRequest, SubscribeResponse, UnsubscribeQuery},
        services::{self, DigestSummary},
        templates,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/newsletter/subscribe", post(subscribe))
        .route("/newsletter/unsubscribe", get(unsubscribe))
        .route("/newsletter/stats", get(stats))
        .route("/newsletter/send", post(send))
}

#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> AppResult<Json<SubscribeResponse>> {
    let Json(payload) = payload?;
    services::subscribe(&state, &payload.email, payload.name.as_deref()).await?;
    Ok(Json(SubscribeResponse {
        success: true,
        message: "You're subscribed to the newsletter!",
    }))
}

/// Renders the same page for known and unknown emails.
#[instrument(skip_all)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    query: Result<Query<UnsubscribeQuery>, QueryRejection>,
) -> (StatusCode, Html<String>) {
    let email = query
        .ok()
        .and_then(|Query(q)| q.email)
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty());
    let Some(email) = email else {
        return (
            StatusCode::BAD_REQUEST,
            Html(templates::error_page("Invalid request.")),
        );
    };

    match state.subscribers.unsubscribe(&email).await {
        Ok(()) => {
            info!(email = %email, "unsubscribed");
            (
                StatusCode::OK,
                Html(templates::unsubscribed_page(&state.config.public_base_url)),
            )
        }
        Err(e) => {
            error!(error = ?e, "unsubscribe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(templates::error_page("Something went wrong.")),
            )
        }
    }
}

#[instrument(skip_all)]
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.subscribers.stats().await.unwrap_or_else(|e| {
        warn!(error = %e, "subscriber stats unavailable");
        Default::default()
    });
    Json(StatsResponse { stats })
}

#[instrument(skip_all)]
pub async fn send(State(state): State<AppState>, _auth: CronAuth) -> AppResult<Json<DigestSummary>> {
    let Some(mailer) = state.mailer.clone() else {
        return Err(AppError::from(anyhow::anyhow!(
            "newsletter send requested without a mail provider"
        )));
    };
    let summary = services::run_digest(&state, mailer.as_ref()).await?;
    Ok(Json(summary))
}
