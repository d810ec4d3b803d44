//! The set of credentials an identity owns, hydrated into variants.

use crate::core::credential::{self, Credential};
use crate::core::session::Session;
use crate::error::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Active credentials of one identity, in store order.
#[derive(Debug)]
pub struct CredentialIndex {
    credentials: Vec<Box<dyn Credential>>,
}

impl CredentialIndex {
    /// Query the store for everything `identity` owns.
    ///
    /// Revoked records are dropped. Duplicate ids are rejected here rather
    /// than resolved by lookup order.
    pub fn fetch(session: &Session, identity: &str) -> Result<Self> {
        let records = session.store().list(identity).map_err(|e| match e {
            Error::IndexUnavailable { .. } => e,
            other => Error::IndexUnavailable {
                identity: identity.to_string(),
                reason: other.to_string(),
            },
        })?;
        debug!(identity, records = records.len(), "fetched credential index");

        let mut seen = HashSet::new();
        let mut credentials = Vec::new();
        for record in records.iter().filter(|r| r.is_active()) {
            if !seen.insert(record.id.as_str()) {
                warn!(id = %record.id, "duplicate id in credential index");
                return Err(Error::DuplicateCredentialId {
                    id: record.id.clone(),
                });
            }
            credentials.push(credential::from_record(record));
        }
        Ok(Self { credentials })
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Credential> {
        self.credentials.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Exact-match lookup by credential id.
    pub fn find_by_id(&self, id: &str) -> Result<&dyn Credential> {
        self.iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| Error::CredentialNotFound { id: id.to_string() })
    }
}
