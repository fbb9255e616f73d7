use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::articles::repo_types::Article;
use crate::auth::repo_types::{Session, User};
use crate::newsletter::repo_types::{NewsletterLog, Subscriber};

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self { pool })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BookmarkRow {
    pub user_id: Uuid,
    pub article_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub(crate) struct ReadRow {
    pub user_id: Uuid,
    pub article_id: Uuid,
    pub read_at: OffsetDateTime,
}

#[derive(Default)]
pub(crate) struct MemoryData {
    pub users: Vec<User>,
    pub sessions: HashMap<String, Session>,
    pub articles: Vec<Article>,
    pub bookmarks: Vec<BookmarkRow>,
    pub read_history: Vec<ReadRow>,
    pub subscribers: Vec<Subscriber>,
    pub newsletter_logs: Vec<NewsletterLog>,
}

/// Process-local store used when no database is configured, and in tests.
/// Not shared between instances; every clone points at the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store preloaded with the demo article set.
    pub fn seeded() -> Self {
        let store = Self::new();
        if let Ok(mut data) = store.inner.lock() {
            data.articles = crate::articles::seed::demo_articles();
        }
        store
    }

    pub(crate) fn lock(&self) -> anyhow::Result<MutexGuard<'_, MemoryData>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    pub fn read_history_len(&self) -> usize {
        self.lock().map(|d| d.read_history.len()).unwrap_or(0)
    }

    pub fn newsletter_logs(&self) -> Vec<NewsletterLog> {
        self.lock()
            .map(|d| d.newsletter_logs.clone())
            .unwrap_or_default()
    }

    /// Test hook: mark a user as `pro`.
    pub fn set_user_tier(&self, email: &str, tier: crate::articles::dto::Tier) -> bool {
        let Ok(mut data) = self.lock() else {
            return false;
        };
        match data.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.tier = tier;
                true
            }
            None => false,
        }
    }

    /// Test hook: move a session's expiry.
    pub fn set_session_expiry(&self, token: &str, expires_at: OffsetDateTime) -> bool {
        let Ok(mut data) = self.lock() else {
            return false;
        };
        match data.sessions.get_mut(token) {
            Some(session) => {
                session.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}
