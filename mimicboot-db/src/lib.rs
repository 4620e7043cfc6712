//! Mimicboot DB
//!
//! PostgreSQL connectivity for the bootstrapper: connect-option
//! construction, the pre-flight connectivity probe, and the SQL batch
//! executor used by the concept and duration phases.
//!
//! Connections are scoped: every operation opens one, uses it, and closes
//! it before returning. Nothing here holds a connection across an
//! external-process step.

mod connect;
mod executor;

pub use connect::{ServerProbe, probe, server_options, target_options};
pub use executor::PgBatchExecutor;
