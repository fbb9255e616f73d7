use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::config::PapersConfig;
use crate::papers::{ArticleDraft, PaperSource, Topic};

/// Abstracts must be longer than this to be worth summarising.
const MIN_ABSTRACT_LEN: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "resultList", default)]
    result_list: ResultList,
}

#[derive(Debug, Default, Deserialize)]
struct ResultList {
    #[serde(default)]
    result: Vec<PaperRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaperRecord {
    pmid: Option<String>,
    title: Option<String>,
    journal_title: Option<String>,
    journal_info: Option<JournalInfo>,
    abstract_text: Option<String>,
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JournalInfo {
    journal: Option<Journal>,
}

#[derive(Debug, Deserialize)]
struct Journal {
    title: Option<String>,
}

fn strip_markup(s: &str) -> String {
    lazy_static! {
        static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
        static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
    }
    let text = TAG_RE.replace_all(s, " ");
    WS_RE.replace_all(text.trim(), " ").into_owned()
}

impl PaperRecord {
    fn into_draft(self) -> Option<ArticleDraft> {
        let pmid = self.pmid.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())?;
        let title = self
            .title
            .map(|t| strip_markup(&t))
            .filter(|t| !t.is_empty())?;
        let abstract_text = strip_markup(self.abstract_text.as_deref().unwrap_or_default());
        if abstract_text.chars().count() <= MIN_ABSTRACT_LEN {
            return None;
        }

        let journal = self
            .journal_info
            .and_then(|j| j.journal)
            .and_then(|j| j.title)
            .or(self.journal_title)
            .map(|j| strip_markup(&j))
            .filter(|j| !j.is_empty())
            .unwrap_or_else(|| "Unknown".into());

        Some(ArticleDraft {
            pmid,
            title,
            journal,
            abstract_text,
            doi: self.doi.filter(|d| !d.trim().is_empty()),
        })
    }
}

/// Parses a Europe PMC search response. Malformed bodies yield nothing.
pub fn parse_search_response(body: &str) -> Vec<ArticleDraft> {
    match serde_json::from_str::<SearchResponse>(body) {
        Ok(res) => res
            .result_list
            .result
            .into_iter()
            .filter_map(PaperRecord::into_draft)
            .collect(),
        Err(e) => {
            warn!(error = %e, "unparseable europe pmc response");
            Vec::new()
        }
    }
}

/// Search term restricted to the current and previous publication year.
pub fn build_query(term: &str, year: i32) -> String {
    format!("{term} AND PUB_YEAR:[{} TO {year}]", year - 1)
}

#[derive(Clone)]
pub struct EuropePmcClient {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
    page_size: usize,
}

impl EuropePmcClient {
    pub fn new(cfg: &PapersConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: cfg.api_url.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
            page_size: cfg.per_topic,
        }
    }

    async fn search(&self, term: &str) -> anyhow::Result<String> {
        let year = OffsetDateTime::now_utc().year();
        let page_size = self.page_size.to_string();
        let body = self
            .client
            .get(&self.api_url)
            .timeout(self.timeout)
            .query(&[
                ("query", build_query(term, year).as_str()),
                ("format", "json"),
                ("resultType", "core"),
                ("sort", "P_PDATE_D desc"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("europe pmc request")?
            .error_for_status()
            .context("europe pmc status")?
            .text()
            .await
            .context("europe pmc body")?;
        Ok(body)
    }
}

#[async_trait]
impl PaperSource for EuropePmcClient {
    async fn fetch_recent_papers(&self, topic: &Topic) -> Vec<ArticleDraft> {
        let term = topic
            .terms
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(topic.key);
        match self.search(term).await {
            Ok(body) => {
                let drafts = parse_search_response(&body);
                debug!(topic = topic.key, term, found = drafts.len(), "europe pmc search");
                drafts
            }
            Err(e) => {
                warn!(error = ?e, topic = topic.key, term, "europe pmc search failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_abstract() -> String {
        "<p>Background: ".to_string() + &"randomised evidence ".repeat(10) + "</p>"
    }

    #[test]
    fn parses_core_records() {
        let body = serde_json::json!({
            "hitCount": 1,
            "resultList": { "result": [{
                "pmid": "39000001",
                "title": "SGLT2 <i>inhibitors</i> in HFpEF",
                "journalInfo": { "journal": { "title": "Circulation" } },
                "abstractText": long_abstract(),
                "doi": "10.1161/CIRC.1"
            }]}
        })
        .to_string();

        let drafts = parse_search_response(&body);
        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.pmid, "39000001");
        assert_eq!(d.title, "SGLT2 inhibitors in HFpEF");
        assert_eq!(d.journal, "Circulation");
        assert!(d.abstract_text.starts_with("Background:"));
        assert!(!d.abstract_text.contains('<'));
        assert_eq!(d.doi.as_deref(), Some("10.1161/CIRC.1"));
    }

    #[test]
    fn drops_incomplete_records() {
        let body = serde_json::json!({
            "resultList": { "result": [
                { "title": "no pmid", "abstractText": long_abstract() },
                { "pmid": "1", "abstractText": long_abstract() },
                { "pmid": "2", "title": "short", "abstractText": "too short" },
                { "pmid": "3", "title": "kept", "journalTitle": "BMJ", "abstractText": long_abstract() }
            ]}
        })
        .to_string();

        let drafts = parse_search_response(&body);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].pmid, "3");
        assert_eq!(drafts[0].journal, "BMJ");
        assert_eq!(drafts[0].doi, None);
    }

    #[test]
    fn abstract_of_exactly_100_chars_is_dropped() {
        let body = serde_json::json!({
            "resultList": { "result": [
                { "pmid": "1", "title": "t", "abstractText": "a".repeat(100) },
                { "pmid": "2", "title": "t", "abstractText": "a".repeat(101) }
            ]}
        })
        .to_string();
        let drafts = parse_search_response(&body);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].pmid, "2");
        assert_eq!(drafts[0].journal, "Unknown");
    }

    #[test]
    fn malformed_json_yields_nothing() {
        assert!(parse_search_response("<html>rate limited</html>").is_empty());
        assert!(parse_search_response("{}").is_empty());
    }

    #[test]
    fn query_covers_two_years() {
        assert_eq!(
            build_query("diabetic kidney", 2026),
            "diabetic kidney AND PUB_YEAR:[2025 TO 2026]"
        );
    }
}
