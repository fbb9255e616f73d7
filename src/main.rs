use meddigest::{app, papers, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "meddigest=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;
    tracing::info!(
        backend = state.backend.label(),
        access = ?state.config.access_policy,
        mail = state.mailer.is_some(),
        "state initialised"
    );

    if let Some(hours) = state.config.papers.ingest_interval_hours {
        tracing::info!(hours, "scheduling periodic ingestion");
        papers::ingest::spawn_interval(state.clone(), hours);
    }

    app::serve(app::build_app(state)).await
}
