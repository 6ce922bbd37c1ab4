use clap::Parser;
use migration::{Migrator, MigratorTrait};
use server::{Credentials, CredentialsConfig, ServerState};
use settings::Database;

mod settings;

/// Personal income and expense tracker.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, env = "TRACKER_CONFIG", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expense_tracker={level},server={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let credentials = Credentials::new(CredentialsConfig {
        secret: settings.auth.secret,
        token_ttl: chrono::Duration::hours(settings.auth.token_ttl_hours),
        hash_cost: settings.auth.hash_cost,
    })?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(ServerState::new(engine, credentials), listener).await?;
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => {
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            format!("sqlite:{}?mode=rwc", path)
        }
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
