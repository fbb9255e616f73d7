use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_key: String,
    pub api_url: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterConfig {
    pub send_delay_ms: u64,
    pub lookback_days: i64,
    pub max_articles: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PapersConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub per_topic: usize,
    pub ingest_interval_hours: Option<u64>,
}

/// Who may read `pro` articles in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessPolicy {
    /// `pro` articles need a `pro` user; everyone else gets a preview.
    Gated,
    /// Every article is served in full.
    Open,
}

impl FromStr for AccessPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gated" => Ok(Self::Gated),
            "open" => Ok(Self::Open),
            other => anyhow::bail!("unknown ARTICLE_ACCESS value: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub platform: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub session: SessionConfig,
    pub access_policy: AccessPolicy,
    pub mail: Option<MailConfig>,
    pub public_base_url: String,
    pub cron_secret: Option<String>,
    pub adsense_client_id: Option<String>,
    pub newsletter: NewsletterConfig,
    pub papers: PapersConfig,
    pub static_dir: String,
}

fn var_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_parse<T: FromStr>(key: &str, default: T) -> T {
    var_opt(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let session = SessionConfig {
            cookie_name: var_opt("SESSION_COOKIE_NAME").unwrap_or_else(|| "session".into()),
            ttl_days: var_parse("SESSION_TTL_DAYS", 30),
        };

        let access_policy = match var_opt("ARTICLE_ACCESS") {
            Some(v) => v.parse()?,
            None => AccessPolicy::Gated,
        };

        let mail = var_opt("RESEND_API_KEY").map(|api_key| MailConfig {
            api_key,
            api_url: var_opt("RESEND_API_URL")
                .unwrap_or_else(|| "https://api.resend.com/emails".into()),
            from: var_opt("MAIL_FROM")
                .unwrap_or_else(|| "MedDigest <newsletter@meddigest.io>".into()),
        });

        let newsletter = NewsletterConfig {
            send_delay_ms: var_parse("NEWSLETTER_SEND_DELAY_MS", 100),
            lookback_days: var_parse("NEWSLETTER_LOOKBACK_DAYS", 1),
            max_articles: 5,
        };

        let papers = PapersConfig {
            api_url: var_opt("EUROPE_PMC_URL").unwrap_or_else(|| {
                "https://www.ebi.ac.uk/europepmc/webservices/rest/search".into()
            }),
            timeout_secs: var_parse("PAPERS_TIMEOUT_SECS", 5),
            per_topic: var_parse("PAPERS_PER_TOPIC", 2),
            ingest_interval_hours: var_opt("INGEST_INTERVAL_HOURS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|h| *h > 0),
        };

        Ok(Self {
            app_name: var_opt("APP_NAME").unwrap_or_else(|| "MedDigest".into()),
            platform: var_opt("APP_PLATFORM").unwrap_or_else(|| "axum".into()),
            database_url: var_opt("DATABASE_URL"),
            database_max_connections: var_parse("DATABASE_MAX_CONNECTIONS", 10),
            session,
            access_policy,
            mail,
            public_base_url: var_opt("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "https://meddigest.io".into())
                .trim_end_matches('/')
                .to_string(),
            cron_secret: var_opt("CRON_SECRET"),
            adsense_client_id: var_opt("ADSENSE_CLIENT_ID"),
            newsletter,
            papers,
            static_dir: var_opt("STATIC_DIR").unwrap_or_else(|| "static".into()),
        })
    }

    /// Configuration used by the in-memory demo and by tests: no database,
    /// no mail provider, no shared secret.
    pub fn demo() -> Self {
        Self {
            app_name: "MedDigest".into(),
            platform: "axum".into(),
            database_url: None,
            database_max_connections: 1,
            session: SessionConfig {
                cookie_name: "session".into(),
                ttl_days: 30,
            },
            access_policy: AccessPolicy::Gated,
            mail: None,
            public_base_url: "https://meddigest.io".into(),
            cron_secret: None,
            adsense_client_id: None,
            newsletter: NewsletterConfig {
                send_delay_ms: 0,
                lookback_days: 1,
                max_articles: 5,
            },
            papers: PapersConfig {
                api_url: "https://www.ebi.ac.uk/europepmc/webservices/rest/search".into(),
                timeout_secs: 5,
                per_topic: 2,
                ingest_interval_hours: None,
            },
            static_dir: "static".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_policy_parses_case_insensitively() {
        assert_eq!("gated".parse::<AccessPolicy>().unwrap(), AccessPolicy::Gated);
        assert_eq!(" OPEN ".parse::<AccessPolicy>().unwrap(), AccessPolicy::Open);
        assert!("free".parse::<AccessPolicy>().is_err());
    }

    #[test]
    fn demo_config_has_no_external_services() {
        let cfg = AppConfig::demo();
        assert!(cfg.database_url.is_none());
        assert!(cfg.mail.is_none());
        assert!(cfg.cron_secret.is_none());
        assert_eq!(cfg.session.cookie_name, "session");
        assert_eq!(cfg.newsletter.max_articles, 5);
    }
}
