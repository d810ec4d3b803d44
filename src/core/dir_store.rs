//! Directory-backed bucket mirror.
//!
//! Layout under `<store root>/<project>/<bucket>/`:
//!
//! ```text
//! index.toml            credential records
//! index.lock            flock guarding index updates
//! <uuid>/cert.pem        issued material, one directory per credential id
//! ```
//!
//! The issuing service drops material into the per-credential directory;
//! this store only manages records and serves what has been issued.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::store::{CreateRequest, CredentialStore};
use crate::error::{Error, Result};
use crate::models::format::Artifact;
use crate::models::kind::CredentialKind;
use crate::models::record::{CredentialRecord, CredentialState};
use crate::util::{fs as cred_fs, path};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Namespace for per-credential material directory names.
const MATERIAL_NAMESPACE: Uuid = Uuid::from_u128(0x8e2d4b61_0c5a_5f3e_a7d9_61b2c4e8f057);

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreIndex {
    #[serde(default)]
    credentials: Vec<CredentialRecord>,
}

#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) the bucket directory for `project`/`bucket`.
    pub fn open(root: &Path, project: &str, bucket: &str) -> Result<Self> {
        for (what, name) in [("project", project), ("bucket", bucket)] {
            if !path::is_plain_file_name(name) {
                return Err(Error::Config(format!("invalid {} name '{}'", what, name)));
            }
        }
        let dir = root.join(project).join(bucket);
        cred_fs::ensure_dir(&dir, constants::STATE_DIR_MODE)
            .map_err(|e| Error::Config(format!("{:#}", e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory the issuing service fills with material for `id`.
    ///
    /// Named by a UUIDv5 of the id: distinct ids never share a directory,
    /// whatever characters the identity contains.
    pub fn artifact_dir(&self, id: &str) -> PathBuf {
        self.dir
            .join(Uuid::new_v5(&MATERIAL_NAMESPACE, id.as_bytes()).to_string())
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(constants::STORE_INDEX_FILE)
    }

    fn lock(&self) -> anyhow::Result<FileLock> {
        FileLock::exclusive(&self.dir.join(constants::STORE_LOCK_FILE))
    }

    fn load_index(&self) -> anyhow::Result<StoreIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(StoreIndex::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("read store index {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parse store index {}", path.display()))
    }

    fn save_index(&self, index: &StoreIndex) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(index).context("serialize store index")?;
        let path = self.index_path();
        cred_fs::write_atomic(&path, content.as_bytes(), constants::CRED_FILE_MODE)
            .with_context(|| format!("persist store index {}", path.display()))
    }
}

impl CredentialStore for DirStore {
    fn list(&self, owner: &str) -> Result<Vec<CredentialRecord>> {
        let index = self.load_index().map_err(|e| Error::IndexUnavailable {
            identity: owner.to_string(),
            reason: format!("{:#}", e),
        })?;
        Ok(index
            .credentials
            .into_iter()
            .filter(|r| r.owner == owner)
            .collect())
    }

    fn fetch(&self, id: &str, artifact: Artifact) -> Result<Vec<u8>> {
        let index = self
            .load_index()
            .map_err(|e| Error::fetch(id, artifact, format!("{:#}", e)))?;
        let record = index
            .credentials
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::CredentialNotFound { id: id.to_string() })?;
        if !record.is_active() {
            return Err(Error::CredentialRevoked { id: id.to_string() });
        }
        let file = self.artifact_dir(id).join(artifact.file_name());
        debug!(id, %artifact, file = %file.display(), "fetch artifact");
        fs::read(&file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::fetch(id, artifact, "not issued yet"),
            _ => Error::fetch(id, artifact, e),
        })
    }

    fn create(&self, request: &CreateRequest) -> Result<String> {
        let failed = |e: anyhow::Error| Error::CreationFailed {
            kind: request.kind,
            identity: request.identity.clone(),
            reason: format!("{:#}", e),
        };
        let id = request.id();
        let _lock = self.lock().map_err(failed)?;
        let mut index = self.load_index().map_err(failed)?;

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

        match index.credentials.iter().position(|r| r.id == id) {
            Some(pos) if index.credentials[pos].is_active() => {
                return Err(Error::CreationConflict {
                    kind: request.kind,
                    identity: request.identity.clone(),
                });
            }
            Some(pos) => {
                info!(%id, "re-activating revoked credential");
                index.credentials[pos] = record;
            }
            None => index.credentials.push(record),
        }
        index.credentials.sort_by(|a, b| a.id.cmp(&b.id));

        cred_fs::ensure_dir(&self.artifact_dir(&id), constants::STATE_DIR_MODE).map_err(failed)?;
        self.save_index(&index).map_err(failed)?;
        Ok(id)
    }

    fn revoke(&self, kind: CredentialKind, owner: &str, identity: &str) -> Result<()> {
        let failed = |e: anyhow::Error| Error::Revocation {
            kind,
            identity: identity.to_string(),
            reason: format!("{:#}", e),
        };
        let id = kind.credential_id(identity);
        let _lock = self.lock().map_err(failed)?;
        let mut index = self.load_index().map_err(failed)?;

        let Some(record) = index
            .credentials
            .iter_mut()
            .find(|r| r.id == id && r.owner == owner)
        else {
            debug!(%id, "revoke of absent credential ignored");
            return Ok(());
        };
        if !record.is_active() {
            debug!(%id, "credential already revoked");
            return Ok(());
        }

        // Material goes first: a failed cleanup leaves the credential Active
        // so a retry revokes it again.
        let material = self.artifact_dir(&id);
        match fs::remove_dir_all(&material) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                return Err(failed(
                    anyhow::Error::new(e).context(format!("remove material {}", material.display())),
                ));
            }
            _ => {}
        }

        record.state = CredentialState::Revoked;
        record.revoked_at = Some(Utc::now());
        self.save_index(&index).map_err(failed)
    }
}
