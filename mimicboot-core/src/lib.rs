//! Mimicboot Core
//!
//! Core types and capability seams for the MIMIC-III environment
//! bootstrapper.
//!
//! This crate contains:
//! - Configuration: invocation values, normalization and validation
//! - Layout: fixed relative-path derivation into the external repositories
//! - Capabilities: the process-runner and SQL-batch-executor seams the
//!   setup phases are written against

pub mod config;
pub mod executor;
pub mod layout;
pub mod process;
