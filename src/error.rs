//! Error taxonomy for credential lifecycle operations.
//!
//! Every variant names the credential, kind, attribute or file it concerns so
//! the operator can act on a failure without re-running in verbose mode.

use crate::models::kind::CredentialKind;
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot resolve identity: {0}")]
    IdentityResolution(String),

    #[error("credential index unavailable for {identity}: {reason}")]
    IndexUnavailable { identity: String, reason: String },

    #[error("credential not found: {id}")]
    CredentialNotFound { id: String },

    #[error("credential index lists {id} more than once")]
    DuplicateCredentialId { id: String },

    #[error("credential {id} does not support format '{format}'")]
    UnsupportedFormat { id: String, format: String },

    #[error("fetch {artifact} for {id}: {reason}")]
    RemoteFetch {
        id: String,
        artifact: String,
        reason: String,
    },

    #[error("signing {id}: {reason}")]
    Signing { id: String, reason: String },

    #[error("encode {id} as '{format}': {reason}")]
    FormatEncoding {
        id: String,
        format: String,
        reason: String,
    },

    #[error("deliver {id} ({target}): {source}")]
    Delivery {
        id: String,
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} credential requires {attribute}")]
    MissingAttribute {
        kind: CredentialKind,
        attribute: &'static str,
    },

    #[error("{kind} credential for {identity} already exists")]
    CreationConflict {
        kind: CredentialKind,
        identity: String,
    },

    #[error("create {kind} credential for {identity}: {reason}")]
    CreationFailed {
        kind: CredentialKind,
        identity: String,
        reason: String,
    },

    #[error("revoke {kind} credential for {identity}: {reason}")]
    Revocation {
        kind: CredentialKind,
        identity: String,
        reason: String,
    },

    #[error("credential {id} has been revoked")]
    CredentialRevoked { id: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn fetch(id: &str, artifact: impl ToString, reason: impl ToString) -> Self {
        Error::RemoteFetch {
            id: id.to_string(),
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encoding(id: &str, format: &str, reason: impl ToString) -> Self {
        Error::FormatEncoding {
            id: id.to_string(),
            format: format.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn delivery(id: &str, target: &str, source: std::io::Error) -> Self {
        Error::Delivery {
            id: id.to_string(),
            target: target.to_string(),
            source,
        }
    }

    pub(crate) fn signing(id: &str, reason: impl ToString) -> Self {
        Error::Signing {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure was detected locally, before any remote call.
    pub fn is_local_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingAttribute { .. } | Error::UnsupportedFormat { .. }
        )
    }
}
