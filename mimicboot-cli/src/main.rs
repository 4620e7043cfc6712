//! Mimicboot CLI
//!
//! Command-line bootstrapper for a MIMIC-III PostgreSQL research
//! environment. Collects configuration from flags, environment variables,
//! or interactive prompts, validates preconditions, then drives the
//! external build tooling and fixed SQL scripts in sequence.

mod prompt;
mod setup;

use anyhow::Result;
use clap::Parser;
use colored::*;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mimicboot_core::config::{self, DbConfig, SetupConfig};
use mimicboot_core::process::StandardProcessRunner;
use mimicboot_db::PgBatchExecutor;

#[derive(Parser)]
#[command(name = "mimicboot")]
#[command(
    about = "Bootstrap a MIMIC-III PostgreSQL research environment",
    long_about = None
)]
struct Cli {
    /// Directory containing the compressed MIMIC-III dump
    #[arg(long, env = "MIMICBOOT_DUMP_PATH")]
    dump_path: Option<String>,

    /// mimic-code repository checkout
    #[arg(long, env = "MIMICBOOT_MIMIC_CODE_PATH")]
    mimic_code_path: Option<String>,

    /// MIMIC-Extract repository checkout
    #[arg(long, env = "MIMICBOOT_MIMIC_EXTRACT_PATH")]
    mimic_extract_path: Option<String>,

    /// PostgreSQL server host
    #[arg(long, env = "MIMICBOOT_PG_HOST")]
    host: Option<String>,

    /// Target database name
    #[arg(long, env = "MIMICBOOT_PG_DBNAME")]
    dbname: Option<String>,

    /// Database user
    #[arg(long, env = "MIMICBOOT_PG_USER")]
    user: Option<String>,

    /// Database password
    #[arg(long, env = "MIMICBOOT_PG_PASSWORD")]
    password: Option<String>,

    /// PostgreSQL server port
    #[arg(long, env = "MIMICBOOT_PG_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mimicboot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli)?;

    // Precondition checks run before anything touches the server
    config.validate()?;

    let probe = mimicboot_db::probe(&config.db).await?;
    if probe.database_exists {
        warn!(
            "Database '{}' already exists; the build step may fail or duplicate work",
            config.db.name
        );
        println!(
            "{}",
            format!(
                "⚠ Database '{}' already exists on the server.",
                config.db.name
            )
            .yellow()
        );
    }

    let executor = PgBatchExecutor::new(&config.db);
    setup::run_setup(&config, &StandardProcessRunner, &executor).await
}

/// Resolves the full configuration from flags, environment, and prompts
///
/// Any value not supplied on the command line is prompted for, with its
/// default offered. The OS-login default for the database user is
/// resolved here, once, not read ambiently later.
fn resolve_config(cli: Cli) -> Result<SetupConfig> {
    let dump_path = match cli.dump_path {
        Some(value) => value,
        None => prompt::required("Full path of the MIMIC-III dump directory")?,
    };
    let mimic_code_path = match cli.mimic_code_path {
        Some(value) => value,
        None => prompt::required("Full path of the mimic-code repository")?,
    };
    let mimic_extract_path = match cli.mimic_extract_path {
        Some(value) => value,
        None => prompt::required("Full path of the MIMIC-Extract repository")?,
    };

    let host = match cli.host {
        Some(value) => value,
        None => prompt::with_default("PostgreSQL host", config::DEFAULT_HOST)?,
    };
    let name = match cli.dbname {
        Some(value) => value,
        None => prompt::with_default("PostgreSQL database name", config::DEFAULT_DBNAME)?,
    };
    let user = match cli.user {
        Some(value) => value,
        None => prompt::with_default("PostgreSQL user", &default_db_user())?,
    };
    let password = match cli.password {
        Some(value) => value,
        None => prompt::password("PostgreSQL password")?,
    };
    let port = match cli.port {
        Some(value) => value,
        None => prompt::port("PostgreSQL port", config::DEFAULT_PORT)?,
    };

    Ok(SetupConfig::new(
        dump_path,
        mimic_code_path,
        mimic_extract_path,
        DbConfig {
            host,
            name,
            user,
            password,
            port,
        },
    ))
}

/// Default database user, resolved from the host environment
fn default_db_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "postgres".to_string())
}
