use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use yatube::config::{Cli, Command, Config};
use yatube::db::{self, groups};
use yatube::state::{AppState, DbPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure uploads directory exists
    std::fs::create_dir_all(config.uploads_path())?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    if let Some(Command::CreateGroup {
        title,
        slug,
        description,
    }) = cli.command
    {
        return create_group(&pool, &title, &slug, &description);
    }

    let state = AppState::new(pool, config.clone());
    let app = yatube::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Groups are managed by operators, not through the web UI.
fn create_group(pool: &DbPool, title: &str, slug: &str, description: &str) -> anyhow::Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("Group title must not be empty");
    }
    if !groups::is_valid_slug(slug) {
        anyhow::bail!("Invalid slug {:?}: use letters, digits, '-' or '_'", slug);
    }

    let conn = pool.get()?;
    if groups::find_by_slug(&conn, slug)?.is_some() {
        anyhow::bail!("A group with slug {:?} already exists", slug);
    }

    let id = groups::create(&conn, title.trim(), slug, description)?;
    tracing::info!("Created group {} ({}) with id {}", title.trim(), slug, id);
    Ok(())
}
