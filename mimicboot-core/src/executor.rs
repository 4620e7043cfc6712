//! SQL batch execution seam
//!
//! The concept and duration scripts are executed verbatim as one
//! multi-statement batch each. The trait lives here so the setup phases
//! can be tested against a fake; the PostgreSQL implementation lives in
//! the database crate.

use anyhow::Result;
use async_trait::async_trait;

/// Capability for executing a SQL script against the target database
///
/// Each call opens a fresh connection, executes the whole script as one
/// batch, and closes the connection before returning. Connections are
/// never held across calls or across external-process steps.
#[async_trait]
pub trait SqlBatchExecutor: Send + Sync {
    /// Executes the script text as-is
    async fn execute_batch(&self, script: &str) -> Result<()>;
}
