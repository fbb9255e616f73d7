use async_trait::async_trait;

pub mod europe_pmc;
pub mod ingest;

pub use europe_pmc::EuropePmcClient;

/// A subject area the ingestion job searches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    /// Value stored in `articles.topic`.
    pub key: &'static str,
    pub terms: &'static [&'static str],
}

pub const TOPICS: [Topic; 4] = [
    Topic {
        key: "cardiovascular",
        terms: &["cardiovascular disease", "heart failure SGLT2"],
    },
    Topic {
        key: "endocrine",
        terms: &["GLP-1 agonist obesity", "tirzepatide semaglutide"],
    },
    Topic {
        key: "aging",
        terms: &["aging longevity senolytic", "NAD healthspan"],
    },
    Topic {
        key: "diabetes",
        terms: &["diabetes CGM insulin", "diabetic kidney"],
    },
];

/// A paper found upstream, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub pmid: String,
    pub title: String,
    pub journal: String,
    pub abstract_text: String,
    pub doi: Option<String>,
}

#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Never fails; upstream errors yield an empty list.
    async fn fetch_recent_papers(&self, topic: &Topic) -> Vec<ArticleDraft>;
}
