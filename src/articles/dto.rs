use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::articles::repo_types::Article;

/// Access level of an article or a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Basic,
    Pro,
}

impl Tier {
    /// Unknown values fall back to `basic`.
    pub fn from_db(s: &str) -> Self {
        match s {
            "pro" => Tier::Pro,
            _ => Tier::Basic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Pro => "pro",
        }
    }
}

/// List item shape; never carries study details or the clinical insight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub journal: String,
    pub topic: String,
    pub tier: Tier,
    pub key_messages: Vec<String>,
    pub published_at: Date,
}

impl ArticleSummary {
    /// What a non-pro caller may see of a pro article.
    pub fn preview(mut self) -> Self {
        self.key_messages.truncate(1);
        self
    }
}

impl From<&Article> for ArticleSummary {
    fn from(a: &Article) -> Self {
        Self {
            id: a.id,
            slug: a.slug.clone(),
            title: a.title.clone(),
            journal: a.journal.clone(),
            topic: a.topic.clone(),
            tier: a.tier,
            key_messages: a.key_messages.clone(),
            published_at: a.published_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleQuery {
    pub topic: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ArticleQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    /// Blank topics mean "all topics".
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleSummary>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub article: Article,
}

#[derive(Debug, Serialize)]
pub struct BookmarkListResponse {
    pub bookmarks: Vec<ArticleSummary>,
}
