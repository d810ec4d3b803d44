//! In-memory credential store for tests and embedding.

use crate::core::store::{CreateRequest, CredentialStore};
use crate::error::{Error, Result};
use crate::models::format::Artifact;
use crate::models::kind::CredentialKind;
use crate::models::record::{CredentialRecord, CredentialState};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    records: BTreeMap<String, CredentialRecord>,
    artifacts: HashMap<(String, Artifact), Vec<u8>>,
    failing_revokes: HashSet<CredentialKind>,
    failing_list: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Place issued material for `id`, as the issuing service would.
    pub fn put_artifact(&self, id: &str, artifact: Artifact, data: impl Into<Vec<u8>>) {
        self.lock()
            .artifacts
            .insert((id.to_string(), artifact), data.into());
    }

    /// Insert a record verbatim, bypassing create policy.
    pub fn insert_record(&self, record: CredentialRecord) {
        self.lock().records.insert(record.id.clone(), record);
    }

    /// Make every revoke of `kind` fail.
    pub fn fail_revokes_of(&self, kind: CredentialKind) {
        self.lock().failing_revokes.insert(kind);
    }

    /// Make `list` fail as an unreachable store would.
    pub fn fail_list(&self) {
        self.lock().failing_list = true;
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryStore {
    fn list(&self, owner: &str) -> Result<Vec<CredentialRecord>> {
        let inner = self.lock();
        if inner.failing_list {
            return Err(Error::IndexUnavailable {
                identity: owner.to_string(),
                reason: "store unreachable".into(),
            });
        }
        Ok(inner
            .records
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }

    fn fetch(&self, id: &str, artifact: Artifact) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let inner = self.lock();
        match inner.records.get(id) {
            None => return Err(Error::CredentialNotFound { id: id.to_string() }),
            Some(r) if !r.is_active() => {
                return Err(Error::CredentialRevoked { id: id.to_string() })
            }
            Some(_) => {}
        }
        inner
            .artifacts
            .get(&(id.to_string(), artifact))
            .cloned()
            .ok_or_else(|| Error::fetch(id, artifact, "not issued"))
    }

    fn create(&self, request: &CreateRequest) -> Result<String> {
        let id = request.id();
        let mut inner = self.lock();
        if let Some(existing) = inner.records.get(&id) {
            if existing.is_active() {
                return Err(Error::CreationConflict {
                    kind: request.kind,
                    identity: request.identity.clone(),
                });
            }
        }
        let record = CredentialRecord {
            id: id.clone(),
            kind: request.kind,
            owner: request.owner.clone(),
            identity: request.identity.clone(),
            state: CredentialState::Active,
            hostname: request.hostname.clone(),
            allocator: request.allocator.clone(),
            endpoint: request.endpoint.clone(),
            soc: request.soc.clone(),
            created_at: Some(Utc::now()),
            revoked_at: None,
        };
        inner.records.insert(id.clone(), record);
        Ok(id)
    }

    fn revoke(&self, kind: CredentialKind, owner: &str, identity: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.failing_revokes.contains(&kind) {
            return Err(Error::Revocation {
                kind,
                identity: identity.to_string(),
                reason: "store rejected revocation".into(),
            });
        }
        let id = kind.credential_id(identity);
        let revoked = match inner.records.get_mut(&id) {
            Some(record) if record.owner == owner && record.is_active() => {
                record.state = CredentialState::Revoked;
                record.revoked_at = Some(Utc::now());
                true
            }
            _ => false,
        };
        if revoked {
            inner.artifacts.retain(|(aid, _), _| aid != &id);
        }
        Ok(())
    }
}
