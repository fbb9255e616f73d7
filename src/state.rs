use std::sync::Arc;

use tracing::{info, warn};

use crate::articles::repo::{ArticleRepo, BookmarkRepo};
use crate::auth::repo::{SessionRepo, UserRepo};
use crate::config::AppConfig;
use crate::mail::{Mailer, ResendMailer};
use crate::newsletter::repo::SubscriberRepo;
use crate::papers::{EuropePmcClient, PaperSource};
use crate::store::{MemoryStore, PgStore};

/// Which persistence backend is serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Memory,
}

impl Backend {
    pub fn label(self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Memory => "demo-mode",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Backend,
    pub users: Arc<dyn UserRepo>,
    pub sessions: Arc<dyn SessionRepo>,
    pub articles: Arc<dyn ArticleRepo>,
    pub bookmarks: Arc<dyn BookmarkRepo>,
    pub subscribers: Arc<dyn SubscriberRepo>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub papers: Arc<dyn PaperSource>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let mailer = match &config.mail {
            Some(mail) => Some(Arc::new(ResendMailer::new(mail)?) as Arc<dyn Mailer>),
            None => {
                info!("RESEND_API_KEY not set; mail disabled");
                None
            }
        };

        let state = match config.database_url.as_deref() {
            Some(url) => {
                let store = PgStore::connect(url, config.database_max_connections).await?;
                Self::from_pg(config, store)
            }
            None => {
                warn!("DATABASE_URL not set; serving demo data from memory");
                Self::in_memory(config)
            }
        };

        Ok(match mailer {
            Some(mailer) => state.with_mailer(mailer),
            None => state,
        })
    }

    pub fn from_pg(config: AppConfig, store: PgStore) -> Self {
        let papers = Arc::new(EuropePmcClient::new(&config.papers));
        let store = Arc::new(store);
        Self {
            config: Arc::new(config),
            backend: Backend::Postgres,
            users: store.clone(),
            sessions: store.clone(),
            articles: store.clone(),
            bookmarks: store.clone(),
            subscribers: store,
            mailer: None,
            papers,
        }
    }

    /// Everything backed by `store`; no mailer.
    pub fn from_memory(config: AppConfig, store: MemoryStore) -> Self {
        let papers = Arc::new(EuropePmcClient::new(&config.papers));
        let store = Arc::new(store);
        Self {
            config: Arc::new(config),
            backend: Backend::Memory,
            users: store.clone(),
            sessions: store.clone(),
            articles: store.clone(),
            bookmarks: store.clone(),
            subscribers: store,
            mailer: None,
            papers,
        }
    }

    /// Demo state over the seeded article set.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_memory(config, MemoryStore::seeded())
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_papers(mut self, papers: Arc<dyn PaperSource>) -> Self {
        self.papers = papers;
        self
    }

    pub fn fake() -> Self {
        Self::in_memory(AppConfig::demo())
    }
}
