use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::SessionUser;

/// Request body for signup. Fields default so that missing ones yield a 400
/// from the handler instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub nickname: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public part of the user returned after signup/login.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MeUser {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub tier: crate::articles::dto::Tier,
}

impl From<SessionUser> for MeUser {
    fn from(u: SessionUser) -> Self {
        Self {
            id: u.id,
            email: u.email,
            nickname: u.nickname,
            profile_image: u.profile_image,
            tier: u.tier,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user: Option<MeUser>,
}
