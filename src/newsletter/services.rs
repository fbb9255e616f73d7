use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::articles::repo_types::Article;
use crate::auth::services::{is_valid_email, normalize_email};
use crate::error::{AppError, AppResult};
use crate::mail::{Email, Mailer};
use crate::newsletter::repo::SubscriberRepo;
use crate::newsletter::repo_types::{NewsletterLog, SubscribeOutcome, Subscriber};
use crate::newsletter::templates;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Response of an explicit send.
#[derive(Debug, Serialize)]
pub struct DigestSummary {
    pub message: &'static str,
    #[serde(flatten)]
    pub report: DigestReport,
}

pub async fn subscribe(
    state: &AppState,
    email: &str,
    name: Option<&str>,
) -> AppResult<SubscribeOutcome> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation(
            "Please enter a valid email address.".into(),
        ));
    }
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    let outcome = state.subscribers.subscribe(&email, name).await?;
    match outcome {
        SubscribeOutcome::AlreadyActive => {
            return Err(AppError::Duplicate(
                "This email is already subscribed.".into(),
            ))
        }
        SubscribeOutcome::Created => info!(email = %email, "subscriber created"),
        SubscribeOutcome::Reactivated => info!(email = %email, "subscriber reactivated"),
    }

    if let Some(mailer) = &state.mailer {
        let welcome = Email {
            to: email.clone(),
            subject: templates::WELCOME_SUBJECT.into(),
            html: templates::welcome_html(&state.config.public_base_url),
        };
        if let Err(e) = mailer.send(&welcome).await {
            warn!(error = %e, email = %email, "welcome email failed");
        }
    }

    Ok(outcome)
}

/// Sends one digest per recipient. Failures are counted, never retried.
#[instrument(skip_all, fields(recipients = recipients.len(), articles = articles.len()))]
pub async fn send_digest(
    subscribers: &dyn SubscriberRepo,
    mailer: &dyn Mailer,
    base_url: &str,
    delay: Duration,
    articles: &[Article],
    recipients: &[Subscriber],
) -> anyhow::Result<DigestReport> {
    let today = OffsetDateTime::now_utc().date();
    let subject = templates::digest_subject(today);
    let mut report = DigestReport {
        total: recipients.len(),
        ..DigestReport::default()
    };

    for (i, sub) in recipients.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let unsubscribe = templates::unsubscribe_url(base_url, &sub.email)?;
        let email = Email {
            to: sub.email.clone(),
            subject: subject.clone(),
            html: templates::digest_html(base_url, articles, &unsubscribe, today),
        };

        match mailer.send(&email).await {
            Ok(()) => {
                report.successful += 1;
                if let Err(e) = subscribers.mark_sent(sub.id).await {
                    warn!(error = %e, subscriber_id = %sub.id, "mark sent failed");
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!(error = %e, email = %sub.email, "digest send failed");
            }
        }
    }

    subscribers
        .log_send(NewsletterLog {
            subject: templates::log_subject(today),
            total_recipients: i32::try_from(report.total).unwrap_or(i32::MAX),
            successful: i32::try_from(report.successful).unwrap_or(i32::MAX),
            failed: i32::try_from(report.failed).unwrap_or(i32::MAX),
            article_ids: articles.iter().map(|a| a.id).collect(),
            sent_at: OffsetDateTime::now_utc(),
        })
        .await?;

    info!(
        total = report.total,
        successful = report.successful,
        failed = report.failed,
        "digest batch finished"
    );
    Ok(report)
}

/// Picks recent articles and active subscribers, then sends the digest.
pub async fn run_digest(state: &AppState, mailer: &dyn Mailer) -> anyhow::Result<DigestSummary> {
    let cfg = &state.config.newsletter;
    let since = OffsetDateTime::now_utc().date() - time::Duration::days(cfg.lookback_days);
    let articles = state
        .articles
        .recent(since, i64::try_from(cfg.max_articles).unwrap_or(5))
        .await?;
    if articles.is_empty() {
        return Ok(DigestSummary {
            message: "No new articles to send",
            report: DigestReport::default(),
        });
    }

    let recipients = state.subscribers.active().await?;
    if recipients.is_empty() {
        return Ok(DigestSummary {
            message: "No active subscribers",
            report: DigestReport::default(),
        });
    }

    let report = send_digest(
        state.subscribers.as_ref(),
        mailer,
        &state.config.public_base_url,
        Duration::from_millis(cfg.send_delay_ms),
        &articles,
        &recipients,
    )
    .await?;

    Ok(DigestSummary {
        message: "Newsletter sent",
        report,
    })
}
