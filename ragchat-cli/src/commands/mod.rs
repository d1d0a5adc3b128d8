//! Subcommand implementations.

pub mod chat;
pub mod check;
pub mod ingest;
