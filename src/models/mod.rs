//! Data structures shared by the core and the CLI.

pub mod config;
pub mod format;
pub mod kind;
pub mod payload;
pub mod record;
