use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{info, warn};

use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::auth::repo_types::{NewSession, NewUser, User};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates, hashes and stores a new user. Nothing is persisted unless
/// every check passes.
pub async fn signup(
    state: &AppState,
    email: &str,
    password: &str,
    nickname: &str,
) -> AppResult<User> {
    let email = normalize_email(email);
    let nickname = nickname.trim();

    if email.is_empty() || password.is_empty() || nickname.is_empty() {
        return Err(AppError::Validation("All fields are required.".into()));
    }
    validate_password(password).map_err(AppError::Validation)?;
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Please enter a valid email address.".into()));
    }

    // Fast path; the unique constraint below is what actually guarantees it.
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Duplicate("This email is already registered.".into()));
    }

    let password_hash = hash_password(password)?;
    let user = state
        .users
        .create(NewUser {
            email: email.clone(),
            password_hash,
            nickname: nickname.to_string(),
        })
        .await?
        .ok_or_else(|| AppError::Duplicate("This email is already registered.".into()))?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Please enter your email and password.".into(),
        ));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub async fn start_session(state: &AppState, user: &User) -> AppResult<NewSession> {
    let ttl = Duration::days(state.config.session.ttl_days);
    let session = state.sessions.create(user.id, ttl).await?;
    Ok(session)
}
