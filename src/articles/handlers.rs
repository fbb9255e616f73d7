use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    articles::{
        dto::{
            ArticleListResponse, ArticleQuery, ArticleResponse, ArticleSummary,
            BookmarkListResponse,
        },
        services::{can_read_full, gate_summaries},
    },
    auth::{
        dto::SuccessResponse,
        extractors::{AuthUser, MaybeUser},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/:slug", get(get_article))
}

pub fn bookmark_routes() -> Router<AppState> {
    Router::new()
        .route("/bookmarks", get(list_bookmarks))
        .route(
            "/bookmarks/:article_id",
            post(add_bookmark).delete(remove_bookmark),
        )
}

#[instrument(skip_all)]
pub async fn list_articles(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    query: Result<Query<ArticleQuery>, QueryRejection>,
) -> AppResult<Json<ArticleListResponse>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let items = state
        .articles
        .list(query.topic(), query.limit(), query.offset())
        .await?;
    let articles = gate_summaries(state.config.access_policy, user.as_ref(), items);
    Ok(Json(ArticleListResponse { articles }))
}

#[instrument(skip_all, fields(slug = %slug))]
pub async fn get_article(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ArticleResponse>> {
    let Some(article) = state.articles.find_by_slug(&slug).await? else {
        return Err(AppError::NotFound("Article not found.".into()));
    };

    if !can_read_full(state.config.access_policy, user.as_ref(), article.tier) {
        info!(slug = %article.slug, "pro article gated");
        return Err(AppError::TierRequired {
            preview: Box::new(ArticleSummary::from(&article).preview()),
        });
    }

    if let Some(user) = &user {
        let articles = state.articles.clone();
        let (user_id, article_id) = (user.id, article.id);
        tokio::spawn(async move {
            if let Err(e) = articles.record_read(user_id, article_id).await {
                warn!(error = %e, %user_id, %article_id, "record read failed");
            }
        });
    }

    Ok(Json(ArticleResponse { article }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_bookmarks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<BookmarkListResponse>> {
    let items = state.bookmarks.list(user.id).await?;
    let bookmarks = gate_summaries(state.config.access_policy, Some(&user), items);
    Ok(Json(BookmarkListResponse { bookmarks }))
}

fn article_id(path: Result<Path<Uuid>, PathRejection>) -> AppResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::Validation("Invalid article id.".into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_bookmark(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let article_id = article_id(path)?;
    if !state.bookmarks.add(user.id, article_id).await? {
        return Err(AppError::NotFound("Article not found.".into()));
    }
    info!(%article_id, "bookmark added");
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn remove_bookmark(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let article_id = article_id(path)?;
    state.bookmarks.remove(user.id, article_id).await?;
    info!(%article_id, "bookmark removed");
    Ok(Json(SuccessResponse { success: true }))
}
