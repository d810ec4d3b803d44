//! Core credential lifecycle logic and its collaborators.

pub mod audit_log;
pub mod config;
pub mod credential;
pub mod delivery;
pub mod dir_store;
pub mod file_lock;
pub mod identity;
pub mod index;
pub mod lifecycle;
pub mod memory_store;
pub mod operations;
pub mod paths;
pub mod session;
pub mod signer;
pub mod store;
