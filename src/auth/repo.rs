use anyhow::Context;
use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::articles::dto::Tier;
use crate::auth::repo_types::{
    NewSession, NewUser, Session, SessionUser, SessionUserRow, User, UserRow,
};
use crate::auth::session::generate_token;
use crate::store::{MemoryStore, PgStore};

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Find a user by (normalized) email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Insert a user. `None` when the email is already taken.
    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<NewSession>;

    /// Joined user for a live token; `None` for unknown or expired tokens.
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<SessionUser>>;

    /// Idempotent.
    async fn invalidate(&self, token: &str) -> anyhow::Result<()>;
}

// ---- Postgres ----

#[async_trait]
impl UserRepo for PgStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, nickname, profile_image, tier, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(row.map(User::from))
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, nickname)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, nickname, profile_image, tier, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .fetch_optional(&self.pool)
        .await
        .context("insert user")?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl SessionRepo for PgStore {
    async fn create(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<NewSession> {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + ttl;
        sqlx::query(
            r#"
            INSERT INTO sessions (user_id, session_token, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("insert session")?;
        Ok(NewSession { token, expires_at })
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<SessionUser>> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT u.id, u.email, u.nickname, u.profile_image, u.tier
              FROM sessions s
              JOIN users u ON u.id = s.user_id
             WHERE s.session_token = $1
               AND s.expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .context("resolve session")?;
        Ok(row.map(SessionUser::from))
    }

    async fn invalidate(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE session_token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("delete session")?;
        Ok(())
    }
}

// ---- In-memory ----

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let data = self.lock()?;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let mut data = self.lock()?;
        if data.users.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            nickname: user.nickname,
            profile_image: None,
            tier: Tier::Basic,
            created_at: OffsetDateTime::now_utc(),
        };
        data.users.push(created.clone());
        Ok(Some(created))
    }
}

#[async_trait]
impl SessionRepo for MemoryStore {
    async fn create(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<NewSession> {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + ttl;
        let mut data = self.lock()?;
        anyhow::ensure!(
            data.users.iter().any(|u| u.id == user_id),
            "session for unknown user {user_id}"
        );
        data.sessions.insert(
            token.clone(),
            Session {
                token: token.clone(),
                user_id,
                expires_at,
            },
        );
        Ok(NewSession { token, expires_at })
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<SessionUser>> {
        let data = self.lock()?;
        let Some(session) = data.sessions.get(token) else {
            return Ok(None);
        };
        if session.expires_at <= OffsetDateTime::now_utc() {
            return Ok(None);
        }
        Ok(data
            .users
            .iter()
            .find(|u| u.id == session.user_id)
            .map(SessionUser::from))
    }

    async fn invalidate(&self, token: &str) -> anyhow::Result<()> {
        self.lock()?.sessions.remove(token);
        Ok(())
    }
}
