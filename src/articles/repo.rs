use anyhow::Context;
use async_trait::async_trait;
use sqlx::types::Json;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::articles::dto::ArticleSummary;
use crate::articles::repo_types::{Article, ArticleRow, ArticleSummaryRow, NewArticle};
use crate::store::{BookmarkRow, MemoryStore, PgStore, ReadRow};

#[async_trait]
pub trait ArticleRepo: Send + Sync {
    /// Newest first, optionally filtered by exact topic.
    async fn list(
        &self,
        topic: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ArticleSummary>>;

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Article>>;

    async fn record_read(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<()>;

    async fn exists_by_pmid(&self, pmid: &str) -> anyhow::Result<bool>;

    /// `false` when the slug or pmid is already taken.
    async fn insert(&self, article: NewArticle) -> anyhow::Result<bool>;

    /// Articles published on or after `since`, newest first.
    async fn recent(&self, since: Date, limit: i64) -> anyhow::Result<Vec<Article>>;
}

#[async_trait]
pub trait BookmarkRepo: Send + Sync {
    /// Newest bookmark first.
    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<ArticleSummary>>;

    /// Idempotent. `false` when the article does not exist.
    async fn add(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<bool>;

    /// Idempotent.
    async fn remove(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<()>;
}

const ARTICLE_COLUMNS: &str = "id, slug, title, original_title, journal, doi, pmid, topic, tier, \
     key_messages, study_n, study_endpoint, study_limitations, clinical_insight, published_at";

// ---- Postgres ----

#[async_trait]
impl ArticleRepo for PgStore {
    async fn list(
        &self,
        topic: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ArticleSummary>> {
        let rows = sqlx::query_as::<_, ArticleSummaryRow>(
            r#"
            SELECT id, slug, title, journal, topic, tier, key_messages, published_at
            FROM articles
            WHERE ($1::text IS NULL OR topic = $1)
            ORDER BY published_at DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(topic)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("list articles")?;
        Ok(rows.into_iter().map(ArticleSummary::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("find article by slug")?;
        Ok(row.map(Article::from))
    }

    async fn record_read(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO read_history (user_id, article_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(article_id)
            .execute(&self.pool)
            .await
            .context("insert read history")?;
        Ok(())
    }

    async fn exists_by_pmid(&self, pmid: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM articles WHERE pmid = $1)")
                .bind(pmid)
                .fetch_one(&self.pool)
                .await
                .context("check article pmid")?;
        Ok(exists)
    }

    async fn insert(&self, article: NewArticle) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO articles
                (slug, title, original_title, journal, doi, pmid, topic, tier,
                 key_messages, clinical_insight, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&article.slug)
        .bind(&article.title)
        .bind(&article.original_title)
        .bind(&article.journal)
        .bind(&article.doi)
        .bind(&article.pmid)
        .bind(&article.topic)
        .bind(article.tier.as_str())
        .bind(Json(&article.key_messages))
        .bind(&article.clinical_insight)
        .bind(article.published_at)
        .execute(&self.pool)
        .await
        .context("insert article")?;
        Ok(res.rows_affected() == 1)
    }

    async fn recent(&self, since: Date, limit: i64) -> anyhow::Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE published_at >= $1 \
             ORDER BY published_at DESC, created_at DESC \
             LIMIT $2"
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("recent articles")?;
        Ok(rows.into_iter().map(Article::from).collect())
    }
}

#[async_trait]
impl BookmarkRepo for PgStore {
    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<ArticleSummary>> {
        let rows = sqlx::query_as::<_, ArticleSummaryRow>(
            r#"
            SELECT a.id, a.slug, a.title, a.journal, a.topic, a.tier, a.key_messages, a.published_at
              FROM bookmarks b
              JOIN articles a ON a.id = b.article_id
             WHERE b.user_id = $1
             ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("list bookmarks")?;
        Ok(rows.into_iter().map(ArticleSummary::from).collect())
    }

    async fn add(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM articles WHERE id = $1)")
                .bind(article_id)
                .fetch_one(&self.pool)
                .await
                .context("check article id")?;
        if !exists {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO bookmarks (user_id, article_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, article_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .execute(&self.pool)
        .await
        .context("insert bookmark")?;
        Ok(true)
    }

    async fn remove(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND article_id = $2")
            .bind(user_id)
            .bind(article_id)
            .execute(&self.pool)
            .await
            .context("delete bookmark")?;
        Ok(())
    }
}

// ---- In-memory ----

fn newest_first(articles: &mut [&Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

#[async_trait]
impl ArticleRepo for MemoryStore {
    async fn list(
        &self,
        topic: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ArticleSummary>> {
        let data = self.lock()?;
        let mut matching: Vec<&Article> = data
            .articles
            .iter()
            .filter(|a| topic.map_or(true, |t| a.topic == t))
            .collect();
        newest_first(&mut matching);
        Ok(matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(ArticleSummary::from)
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Article>> {
        let data = self.lock()?;
        Ok(data.articles.iter().find(|a| a.slug == slug).cloned())
    }

    async fn record_read(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<()> {
        self.lock()?.read_history.push(ReadRow {
            user_id,
            article_id,
            read_at: OffsetDateTime::now_utc(),
        });
        Ok(())
    }

    async fn exists_by_pmid(&self, pmid: &str) -> anyhow::Result<bool> {
        let data = self.lock()?;
        Ok(data
            .articles
            .iter()
            .any(|a| a.pmid.as_deref() == Some(pmid)))
    }

    async fn insert(&self, article: NewArticle) -> anyhow::Result<bool> {
        let mut data = self.lock()?;
        let taken = data.articles.iter().any(|a| {
            a.slug == article.slug || (article.pmid.is_some() && a.pmid == article.pmid)
        });
        if taken {
            return Ok(false);
        }
        data.articles.push(article.into_article(Uuid::new_v4()));
        Ok(true)
    }

    async fn recent(&self, since: Date, limit: i64) -> anyhow::Result<Vec<Article>> {
        let data = self.lock()?;
        let mut matching: Vec<&Article> = data
            .articles
            .iter()
            .filter(|a| a.published_at >= since)
            .collect();
        newest_first(&mut matching);
        Ok(matching
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookmarkRepo for MemoryStore {
    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<ArticleSummary>> {
        let data = self.lock()?;
        Ok(data
            .bookmarks
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| data.articles.iter().find(|a| a.id == b.article_id))
            .map(ArticleSummary::from)
            .collect())
    }

    async fn add(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<bool> {
        let mut data = self.lock()?;
        if !data.articles.iter().any(|a| a.id == article_id) {
            return Ok(false);
        }
        let already = data
            .bookmarks
            .iter()
            .any(|b| b.user_id == user_id && b.article_id == article_id);
        if !already {
            data.bookmarks.push(BookmarkRow {
                user_id,
                article_id,
                created_at: OffsetDateTime::now_utc(),
            });
        }
        Ok(true)
    }

    async fn remove(&self, user_id: Uuid, article_id: Uuid) -> anyhow::Result<()> {
        self.lock()?
            .bookmarks
            .retain(|b| !(b.user_id == user_id && b.article_id == article_id));
        Ok(())
    }
}
