use anyhow::Context;
use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::newsletter::repo_types::{
    NewsletterLog, SubscribeOutcome, Subscriber, SubscriberRow, SubscriberStats, SubscriberStatus,
};
use crate::store::{MemoryStore, PgStore};

#[async_trait]
pub trait SubscriberRepo: Send + Sync {
    /// Atomic upsert keyed by the (lowercased) email.
    async fn subscribe(&self, email: &str, name: Option<&str>)
        -> anyhow::Result<SubscribeOutcome>;

    /// Idempotent; unknown emails are a no-op.
    async fn unsubscribe(&self, email: &str) -> anyhow::Result<()>;

    async fn stats(&self) -> anyhow::Result<SubscriberStats>;

    async fn active(&self) -> anyhow::Result<Vec<Subscriber>>;

    /// Bumps `emails_sent` and `last_email_sent_at`.
    async fn mark_sent(&self, subscriber_id: Uuid) -> anyhow::Result<()>;

    async fn log_send(&self, log: NewsletterLog) -> anyhow::Result<()>;
}

// ---- Postgres ----

#[async_trait]
impl SubscriberRepo for PgStore {
    async fn subscribe(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> anyhow::Result<SubscribeOutcome> {
        // xmax = 0 only for freshly inserted rows
        let inserted: Option<bool> = sqlx::query_scalar(
            r#"
            INSERT INTO subscribers (email, name, status)
            VALUES ($1, $2, 'active')
            ON CONFLICT (email) DO UPDATE
               SET status = 'active', unsubscribed_at = NULL, subscribed_at = now(),
                   name = COALESCE(EXCLUDED.name, subscribers.name)
             WHERE subscribers.status <> 'active'
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(email)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("upsert subscriber")?;

        Ok(match inserted {
            Some(true) => SubscribeOutcome::Created,
            Some(false) => SubscribeOutcome::Reactivated,
            None => SubscribeOutcome::AlreadyActive,
        })
    }

    async fn unsubscribe(&self, email: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE subscribers
               SET status = 'unsubscribed', unsubscribed_at = now()
             WHERE email = $1 AND status <> 'unsubscribed'
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await
        .context("unsubscribe")?;
        Ok(())
    }

    async fn stats(&self) -> anyhow::Result<SubscriberStats> {
        let stats = sqlx::query_as::<_, SubscriberStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'unsubscribed') AS unsubscribed
              FROM subscribers
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("subscriber stats")?;
        Ok(stats)
    }

    async fn active(&self) -> anyhow::Result<Vec<Subscriber>> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, name, status, subscribed_at, unsubscribed_at,
                   last_email_sent_at, emails_sent
              FROM subscribers
             WHERE status = 'active'
             ORDER BY subscribed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("active subscribers")?;
        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    async fn mark_sent(&self, subscriber_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE subscribers
               SET last_email_sent_at = now(), emails_sent = emails_sent + 1
             WHERE id = $1
            "#,
        )
        .bind(subscriber_id)
        .execute(&self.pool)
        .await
        .context("mark subscriber sent")?;
        Ok(())
    }

    async fn log_send(&self, log: NewsletterLog) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO newsletter_logs
                (subject, total_recipients, successful, failed, article_ids, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&log.subject)
        .bind(log.total_recipients)
        .bind(log.successful)
        .bind(log.failed)
        .bind(Json(&log.article_ids))
        .bind(log.sent_at)
        .execute(&self.pool)
        .await
        .context("insert newsletter log")?;
        Ok(())
    }
}

// ---- In-memory ----

#[async_trait]
impl SubscriberRepo for MemoryStore {
    async fn subscribe(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> anyhow::Result<SubscribeOutcome> {
        let mut data = self.lock()?;
        let now = OffsetDateTime::now_utc();
        if let Some(existing) = data.subscribers.iter_mut().find(|s| s.email == email) {
            if existing.status == SubscriberStatus::Active {
                return Ok(SubscribeOutcome::AlreadyActive);
            }
            existing.status = SubscriberStatus::Active;
            existing.unsubscribed_at = None;
            existing.subscribed_at = now;
            if let Some(name) = name {
                existing.name = Some(name.to_string());
            }
            return Ok(SubscribeOutcome::Reactivated);
        }

        data.subscribers.push(Subscriber {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.map(str::to_string),
            status: SubscriberStatus::Active,
            subscribed_at: now,
            unsubscribed_at: None,
            last_email_sent_at: None,
            emails_sent: 0,
        });
        Ok(SubscribeOutcome::Created)
    }

    async fn unsubscribe(&self, email: &str) -> anyhow::Result<()> {
        let mut data = self.lock()?;
        if let Some(sub) = data
            .subscribers
            .iter_mut()
            .find(|s| s.email == email && s.status == SubscriberStatus::Active)
        {
            sub.status = SubscriberStatus::Unsubscribed;
            sub.unsubscribed_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn stats(&self) -> anyhow::Result<SubscriberStats> {
        let data = self.lock()?;
        let active = data
            .subscribers
            .iter()
            .filter(|s| s.status == SubscriberStatus::Active)
            .count() as i64;
        let total = data.subscribers.len() as i64;
        Ok(SubscriberStats {
            total,
            active,
            unsubscribed: total - active,
        })
    }

    async fn active(&self) -> anyhow::Result<Vec<Subscriber>> {
        let data = self.lock()?;
        Ok(data
            .subscribers
            .iter()
            .filter(|s| s.status == SubscriberStatus::Active)
            .cloned()
            .collect())
    }

    async fn mark_sent(&self, subscriber_id: Uuid) -> anyhow::Result<()> {
        let mut data = self.lock()?;
        if let Some(sub) = data.subscribers.iter_mut().find(|s| s.id == subscriber_id) {
            sub.last_email_sent_at = Some(OffsetDateTime::now_utc());
            sub.emails_sent += 1;
        }
        Ok(())
    }

    async fn log_send(&self, log: NewsletterLog) -> anyhow::Result<()> {
        self.lock()?.newsletter_logs.push(log);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_lifecycle() {
        let store = MemoryStore::new();
        assert_eq!(
            store.subscribe("a@x.com", Some("A")).await.unwrap(),
            SubscribeOutcome::Created
        );
        assert_eq!(
            store.subscribe("a@x.com", None).await.unwrap(),
            SubscribeOutcome::AlreadyActive
        );

        store.unsubscribe("a@x.com").await.unwrap();
        store.unsubscribe("a@x.com").await.unwrap();
        assert_eq!(
            store.stats().await.unwrap(),
            SubscriberStats {
                total: 1,
                active: 0,
                unsubscribed: 1
            }
        );

        assert_eq!(
            store.subscribe("a@x.com", None).await.unwrap(),
            SubscribeOutcome::Reactivated
        );
        let stats = store.stats().await.unwrap();
        assert_eq!((stats.total, stats.active), (1, 1));
    }

    #[tokio::test]
    async fn reactivation_keeps_or_replaces_name() {
        let store = MemoryStore::new();
        store.subscribe("a@x.com", Some("Ann")).await.unwrap();
        store.unsubscribe("a@x.com").await.unwrap();
        store.subscribe("a@x.com", None).await.unwrap();
        let sub = store.active().await.unwrap().remove(0);
        assert_eq!(sub.name.as_deref(), Some("Ann"));

        store.unsubscribe("a@x.com").await.unwrap();
        assert_eq!(
            store.subscribe("a@x.com", Some("Anna")).await.unwrap(),
            SubscribeOutcome::Reactivated
        );
        let sub = store.active().await.unwrap().remove(0);
        assert_eq!(sub.name.as_deref(), Some("Anna"));
    }

    #[tokio::test]
    async fn unsubscribing_unknown_email_is_a_no_op() {
        let store = MemoryStore::new();
        store.unsubscribe("ghost@x.com").await.unwrap();
        assert_eq!(store.stats().await.unwrap(), SubscriberStats::default());
    }

    #[tokio::test]
    async fn mark_sent_bumps_counters() {
        let store = MemoryStore::new();
        store.subscribe("a@x.com", None).await.unwrap();
        let sub = store.active().await.unwrap().remove(0);
        store.mark_sent(sub.id).await.unwrap();
        store.mark_sent(sub.id).await.unwrap();

        let sub = store.active().await.unwrap().remove(0);
        assert_eq!(sub.emails_sent, 2);
        assert!(sub.last_email_sent_at.is_some());
    }
}
