//! Schema management for the tracker database.
//!
//! The database location comes from the same settings file the server reads
//! (`[server] database`, overridable with `TRACKER__SERVER__DATABASE__SQLITE`).
//! `DATABASE_URL` takes precedence when set.
use clap::{Parser, ValueEnum};
use config::{Config, Environment, File};
use sea_orm::Database;
use sea_orm_migration::prelude::*;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Command {
    Up,
    Down,
    Fresh,
    Status,
}

#[derive(Debug, Parser)]
#[command(about = "Apply or inspect tracker migrations")]
struct Cli {
    #[arg(value_enum, default_value = "up")]
    command: Command,
    /// Settings file, without extension.
    #[arg(long, env = "TRACKER_CONFIG", default_value = "settings")]
    config: String,
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DatabaseSetting {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    database: DatabaseSetting,
}

#[derive(Debug, Deserialize)]
struct Settings {
    server: ServerSection,
}

fn database_url(cli: &Cli) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(url) = &cli.database_url {
        return Ok(url.clone());
    }

    let settings: Settings = Config::builder()
        .add_source(File::with_name(&cli.config))
        .add_source(Environment::with_prefix("TRACKER").separator("__"))
        .build()?
        .try_deserialize()?;

    Ok(match settings.server.database {
        DatabaseSetting::Memory => "sqlite::memory:".to_string(),
        DatabaseSetting::Sqlite(path) => {
            if let Some(parent) = std::path::Path::new(&path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            format!("sqlite:{path}?mode=rwc")
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let db = Database::connect(&database_url(&cli)?).await?;

    match cli.command {
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down => migration::Migrator::down(&db, None).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
