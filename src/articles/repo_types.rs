use serde::Serialize;
use sqlx::{types::Json, FromRow};
use time::Date;
use uuid::Uuid;

use crate::articles::dto::Tier;

/// Full article record as served by `GET /api/articles/:slug`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub original_title: Option<String>,
    pub journal: String,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub topic: String,
    pub tier: Tier,
    pub key_messages: Vec<String>,
    pub study_n: Option<i32>,
    pub study_endpoint: Option<String>,
    pub study_limitations: Option<String>,
    pub clinical_insight: String,
    pub published_at: Date,
}

#[derive(Debug, FromRow)]
pub struct ArticleRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub original_title: Option<String>,
    pub journal: String,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub topic: String,
    pub tier: String,
    pub key_messages: Json<Vec<String>>,
    pub study_n: Option<i32>,
    pub study_endpoint: Option<String>,
    pub study_limitations: Option<String>,
    pub clinical_insight: String,
    pub published_at: Date,
}

impl From<ArticleRow> for Article {
    fn from(r: ArticleRow) -> Self {
        Self {
            id: r.id,
            slug: r.slug,
            title: r.title,
            original_title: r.original_title,
            journal: r.journal,
            doi: r.doi,
            pmid: r.pmid,
            topic: r.topic,
            tier: Tier::from_db(&r.tier),
            key_messages: r.key_messages.0,
            study_n: r.study_n,
            study_endpoint: r.study_endpoint,
            study_limitations: r.study_limitations,
            clinical_insight: r.clinical_insight,
            published_at: r.published_at,
        }
    }
}

/// Insert payload produced by ingestion.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub slug: String,
    pub title: String,
    pub original_title: Option<String>,
    pub journal: String,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub topic: String,
    pub tier: Tier,
    pub key_messages: Vec<String>,
    pub clinical_insight: String,
    pub published_at: Date,
}

impl NewArticle {
    pub(crate) fn into_article(self, id: Uuid) -> Article {
        Article {
            id,
            slug: self.slug,
            title: self.title,
            original_title: self.original_title,
            journal: self.journal,
            doi: self.doi,
            pmid: self.pmid,
            topic: self.topic,
            tier: self.tier,
            key_messages: self.key_messages,
            study_n: None,
            study_endpoint: None,
            study_limitations: None,
            clinical_insight: self.clinical_insight,
            published_at: self.published_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ArticleSummaryRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub journal: String,
    pub topic: String,
    pub tier: String,
    pub key_messages: Json<Vec<String>>,
    pub published_at: Date,
}

impl From<ArticleSummaryRow> for crate::articles::dto::ArticleSummary {
    fn from(r: ArticleSummaryRow) -> Self {
        Self {
            id: r.id,
            slug: r.slug,
            title: r.title,
            journal: r.journal,
            topic: r.topic,
            tier: Tier::from_db(&r.tier),
            key_messages: r.key_messages.0,
            published_at: r.published_at,
        }
    }
}
