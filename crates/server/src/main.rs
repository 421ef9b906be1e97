use std::sync::Arc;

use tower_http::services::{ServeDir, ServeFile};

use classroom_server::{AppConfig, AppState, build_router, mail::LogMailer, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom_server=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("data directory: {}", config.data_dir.display());

    // Initialize database
    let db = storage::init_db(&config.data_dir)?;
    storage::seed_schools(&db, &config.schools)?;
    tracing::info!("database initialized");

    let base_url = config.base_url.clone();
    let web_dir = config.web_dir.clone();
    let port = config.port;

    let state = AppState {
        db,
        config,
        mailer: Arc::new(LogMailer),
    };
    let mut app = build_router(state);

    // Serve static files from web build if present
    if web_dir.exists() {
        tracing::info!("serving static files from {}", web_dir.display());
        let index_html = web_dir.join("index.html");
        app = app.fallback_service(ServeDir::new(&web_dir).fallback(ServeFile::new(index_html)));
    }

    tracing::info!("starting server at {base_url}");

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
