//! PostgreSQL batch executor

use anyhow::{Context, Result};
use async_trait::async_trait;
use mimicboot_core::config::DbConfig;
use mimicboot_core::executor::SqlBatchExecutor;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use tracing::debug;

use crate::connect::target_options;

/// [`SqlBatchExecutor`] backed by a scoped connection to the target database
///
/// Each batch gets its own connection: connect, execute the script as one
/// multi-statement batch, close. The scripts carry their own transaction
/// boundaries where they need them; everything else autocommits statement
/// by statement.
pub struct PgBatchExecutor {
    options: PgConnectOptions,
}

impl PgBatchExecutor {
    /// Creates an executor for the configured target database
    pub fn new(db: &DbConfig) -> Self {
        Self {
            options: target_options(db),
        }
    }
}

#[async_trait]
impl SqlBatchExecutor for PgBatchExecutor {
    async fn execute_batch(&self, script: &str) -> Result<()> {
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .context("Failed to connect to the target database")?;

        debug!("Executing SQL batch ({} bytes)", script.len());

        sqlx::Executor::execute(&mut conn, sqlx::raw_sql(script))
            .await
            .context("SQL batch execution failed")?;

        conn.close()
            .await
            .context("Failed to close the database connection")?;

        Ok(())
    }
}
