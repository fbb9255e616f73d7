use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
    Unsubscribed,
}

impl SubscriberStatus {
    pub fn from_db(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            _ => Self::Unsubscribed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: SubscriberStatus,
    pub subscribed_at: OffsetDateTime,
    pub unsubscribed_at: Option<OffsetDateTime>,
    pub last_email_sent_at: Option<OffsetDateTime>,
    pub emails_sent: i32,
}

#[derive(Debug, FromRow)]
pub struct SubscriberRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: String,
    pub subscribed_at: OffsetDateTime,
    pub unsubscribed_at: Option<OffsetDateTime>,
    pub last_email_sent_at: Option<OffsetDateTime>,
    pub emails_sent: i32,
}

impl From<SubscriberRow> for Subscriber {
    fn from(r: SubscriberRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            status: SubscriberStatus::from_db(&r.status),
            subscribed_at: r.subscribed_at,
            unsubscribed_at: r.unsubscribed_at,
            last_email_sent_at: r.last_email_sent_at,
            emails_sent: r.emails_sent,
        }
    }
}

/// Result of the subscribe upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    Reactivated,
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct SubscriberStats {
    pub total: i64,
    pub active: i64,
    pub unsubscribed: i64,
}

/// One row per digest batch.
#[derive(Debug, Clone)]
pub struct NewsletterLog {
    pub subject: String,
    pub total_recipients: i32,
    pub successful: i32,
    pub failed: i32,
    pub article_ids: Vec<Uuid>,
    pub sent_at: OffsetDateTime,
}
