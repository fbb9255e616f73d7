use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::articles::dto::Tier;
use crate::articles::repo::ArticleRepo;
use crate::articles::repo_types::NewArticle;
use crate::auth::extractors::CronAuth;
use crate::error::AppResult;
use crate::newsletter::services::run_digest;
use crate::papers::{ArticleDraft, PaperSource, TOPICS};
use crate::state::AppState;

const TITLE_MAX_CHARS: usize = 100;
const EXCERPT_CHARS: usize = 80;
const DEFAULT_INSIGHT: &str = "Recent research. See the original paper for details.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub saved: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct CronResponse {
    pub saved: usize,
    pub newsletter_sent: usize,
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// First four ASCII words of the title plus a base36 millisecond stamp.
/// Words carrying non-ASCII letters are skipped whole; with none left the
/// slug is built from `fallback`.
pub fn make_slug(title: &str, fallback: &str, now: OffsetDateTime) -> String {
    let words: Vec<String> = title
        .split_whitespace()
        .filter(|w| !w.chars().any(|c| c.is_alphanumeric() && !c.is_ascii()))
        .map(|w| {
            w.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|w| !w.is_empty())
        .take(4)
        .collect();
    let stem = if words.is_empty() {
        format!("pmid-{fallback}")
    } else {
        words.join("-")
    };
    let millis = u128::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
    format!("{stem}-{}", to_base36(millis))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub fn draft_to_article(draft: ArticleDraft, topic: &str, now: OffsetDateTime) -> NewArticle {
    let key_messages = vec![
        format!("{}...", truncate_chars(&draft.abstract_text, EXCERPT_CHARS)),
        format!("Journal: {}", draft.journal),
        format!("PMID: {}", draft.pmid),
    ];
    NewArticle {
        slug: make_slug(&draft.title, &draft.pmid, now),
        title: truncate_chars(&draft.title, TITLE_MAX_CHARS),
        original_title: Some(draft.title),
        journal: draft.journal,
        doi: draft.doi,
        pmid: Some(draft.pmid),
        topic: topic.to_string(),
        tier: Tier::Basic,
        key_messages,
        clinical_insight: DEFAULT_INSIGHT.into(),
        published_at: now.date(),
    }
}

/// One pass over every topic. Per-draft failures are logged and skipped.
#[instrument(skip_all)]
pub async fn run_ingest(articles: &dyn ArticleRepo, source: &dyn PaperSource) -> IngestReport {
    let mut report = IngestReport::default();

    for topic in TOPICS.iter() {
        for draft in source.fetch_recent_papers(topic).await {
            match articles.exists_by_pmid(&draft.pmid).await {
                Ok(false) => {}
                Ok(true) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, pmid = %draft.pmid, "pmid lookup failed");
                    report.skipped += 1;
                    continue;
                }
            }

            let pmid = draft.pmid.clone();
            match articles
                .insert(draft_to_article(draft, topic.key, OffsetDateTime::now_utc()))
                .await
            {
                Ok(true) => report.saved += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(error = %e, %pmid, "article insert failed");
                    report.skipped += 1;
                }
            }
        }
    }

    info!(saved = report.saved, skipped = report.skipped, "ingestion finished");
    report
}

/// Ingestion followed by the digest when a mailer is configured.
pub async fn run_cron(state: &AppState) -> CronResponse {
    let report = run_ingest(state.articles.as_ref(), state.papers.as_ref()).await;

    let mut newsletter_sent = 0;
    if let Some(mailer) = state.mailer.clone() {
        match run_digest(state, mailer.as_ref()).await {
            Ok(summary) => newsletter_sent = summary.report.successful,
            Err(e) => warn!(error = ?e, "digest after ingestion failed"),
        }
    }

    info!(saved = report.saved, newsletter_sent, "cron completed");
    CronResponse {
        saved: report.saved,
        newsletter_sent,
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/cron/trigger", post(trigger))
}

#[instrument(skip_all)]
pub async fn trigger(State(state): State<AppState>, _auth: CronAuth) -> AppResult<Json<CronResponse>> {
    Ok(Json(run_cron(&state).await))
}

/// Runs the cron pass every `hours` hours. The first tick fires after one interval.
pub fn spawn_interval(state: AppState, hours: u64) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_secs(hours * 60 * 60);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            run_cron(&state).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::papers::Topic;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use time::macros::datetime;

    struct FixedSource;

    #[async_trait]
    impl PaperSource for FixedSource {
        async fn fetch_recent_papers(&self, topic: &Topic) -> Vec<ArticleDraft> {
            if topic.key != "aging" {
                return Vec::new();
            }
            vec![
                ArticleDraft {
                    pmid: "111".into(),
                    title: "Senolytic Therapy: A Phase 2 Trial in Older Adults".into(),
                    journal: "Nature Aging".into(),
                    abstract_text: "x".repeat(150),
                    doi: Some("10.1/abc".into()),
                },
                ArticleDraft {
                    pmid: "222".into(),
                    title: "NAD+ precursors and healthspan".into(),
                    journal: "Cell".into(),
                    abstract_text: "y".repeat(150),
                    doi: None,
                },
            ]
        }
    }

    #[test]
    fn slug_uses_first_four_ascii_words() {
        let now = datetime!(2026-02-15 00:00 UTC);
        let slug = make_slug("SGLT2 Inhibitors: Effect on Heart Failure!", "1", now);
        let millis = (now.unix_timestamp() as u128) * 1000;
        assert_eq!(slug, format!("sglt2-inhibitors-effect-on-{}", to_base36(millis)));
    }

    #[test]
    fn slug_skips_non_ascii_words() {
        let now = datetime!(2026-02-15 00:00 UTC);
        let stamp = to_base36((now.unix_timestamp() as u128) * 1000);
        assert_eq!(
            make_slug("Évaluation clinique du Ωmega trial", "1", now),
            format!("clinique-du-trial-{stamp}")
        );
    }

    #[test]
    fn slug_falls_back_to_pmid_without_ascii_words() {
        let now = datetime!(2026-02-15 00:00 UTC);
        let stamp = to_base36((now.unix_timestamp() as u128) * 1000);
        let a = make_slug("Évaluation Ωmega", "38001", now);
        let b = make_slug("临床 试验", "38002", now);
        assert_eq!(a, format!("pmid-38001-{stamp}"));
        assert_ne!(a, b);
        assert!(!b.starts_with('-'));
    }

    #[test]
    fn base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn draft_becomes_basic_article_with_three_key_messages() {
        let now = datetime!(2026-02-15 09:30 UTC);
        let article = draft_to_article(
            ArticleDraft {
                pmid: "42".into(),
                title: "t".repeat(120),
                journal: "JAMA".into(),
                abstract_text: "a".repeat(200),
                doi: None,
            },
            "diabetes",
            now,
        );
        assert_eq!(article.tier, Tier::Basic);
        assert_eq!(article.title.chars().count(), 100);
        assert_eq!(article.original_title.as_deref().map(str::len), Some(120));
        assert_eq!(article.key_messages[0], format!("{}...", "a".repeat(80)));
        assert_eq!(article.key_messages[1], "Journal: JAMA");
        assert_eq!(article.key_messages[2], "PMID: 42");
        assert_eq!(article.topic, "diabetes");
        assert_eq!(article.published_at, now.date());
    }

    #[tokio::test]
    async fn ingestion_skips_known_pmids() {
        let store = MemoryStore::new();
        let first = run_ingest(&store, &FixedSource).await;
        assert_eq!(first, IngestReport { saved: 2, skipped: 0 });

        let second = run_ingest(&store, &FixedSource).await;
        assert_eq!(second, IngestReport { saved: 0, skipped: 2 });

        let aging = store.list(Some("aging"), 50, 0).await.unwrap();
        assert_eq!(aging.len(), 2);
    }
}
