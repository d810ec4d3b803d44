//! Credential lifecycle client.
//!
//! Lists, downloads, creates and revokes the certificates an operator owns
//! in a remote credential store, materializing them as PEM, PKCS#12,
//! OpenVPN or Apple configuration profiles.
//!
//! ## Modules
//! - `cli`: Command-line handlers
//! - `core`: Session, credential variants, stores, lifecycle, audit
//! - `models`: Data structures
//! - `util`: Filesystem, path and openssl helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod error;
pub mod models;
pub mod util;

pub use error::{Error, Result};
