use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::articles::dto::Tier;

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub nickname: String,
    pub profile_image: Option<String>,
    pub tier: Tier,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub tier: String,
    pub created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            nickname: r.nickname,
            profile_image: r.profile_image,
            tier: Tier::from_db(&r.tier),
            created_at: r.created_at,
        }
    }
}

/// Input for creating a user; the email is already normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
}

/// Stored session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

/// Freshly issued session token.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// The user projection a valid session resolves to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub tier: Tier,
}

#[derive(Debug, FromRow)]
pub struct SessionUserRow {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub tier: String,
}

impl From<SessionUserRow> for SessionUser {
    fn from(r: SessionUserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            nickname: r.nickname,
            profile_image: r.profile_image,
            tier: Tier::from_db(&r.tier),
        }
    }
}

impl From<&User> for SessionUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            nickname: u.nickname.clone(),
            profile_image: u.profile_image.clone(),
            tier: u.tier,
        }
    }
}
