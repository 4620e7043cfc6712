//! Connection options and connectivity probe

use anyhow::{Context, Result};
use mimicboot_core::config::DbConfig;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use tracing::debug;

/// Builds connect options for the server with no database selected
///
/// The server then resolves the startup database to the username, which is
/// exactly what the pre-flight probe wants: it must succeed before the
/// target database exists.
pub fn server_options(db: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password)
}

/// Builds connect options for the target database
pub fn target_options(db: &DbConfig) -> PgConnectOptions {
    server_options(db).database(&db.name)
}

/// Result of the pre-flight connectivity probe
#[derive(Debug, Clone, Copy)]
pub struct ServerProbe {
    /// Whether the target database already exists on the server
    pub database_exists: bool,
}

/// Probes server connectivity with the supplied credentials
///
/// Opens a scoped connection, checks `pg_database` for the target name,
/// and closes the connection. A failure here aborts the run before any
/// mutating step; a pre-existing target database is reported so the
/// caller can warn that the build step may fail or duplicate work.
pub async fn probe(db: &DbConfig) -> Result<ServerProbe> {
    debug!("Probing PostgreSQL server at {}:{}", db.host, db.port);

    let mut conn = PgConnection::connect_with(&server_options(db))
        .await
        .context("Error connecting to PostgreSQL server. Check connection inputs.")?;

    let existing: Option<i32> = sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(&db.name)
        .fetch_optional(&mut conn)
        .await
        .context("Failed to query pg_database during the connectivity probe")?;

    conn.close()
        .await
        .context("Failed to close the probe connection")?;

    Ok(ServerProbe {
        database_exists: existing.is_some(),
    })
}
