//! Client-side contract of the remote credential store.
//!
//! Stores decide their own conflict and revocation policy; callers surface
//! the store's answer unchanged. Both bundled stores ([`DirStore`] and
//! [`MemoryStore`]) follow the same policy:
//!
//! - creating an Active (kind, identity) pair fails with `CreationConflict`,
//!   creating over a Revoked one re-activates it;
//! - revoking an Absent or already Revoked credential is a no-op;
//! - `list` reports revoked records, `fetch` on them fails with
//!   `CredentialRevoked`.
//!
//! [`DirStore`]: crate::core::dir_store::DirStore
//! [`MemoryStore`]: crate::core::memory_store::MemoryStore

use crate::error::Result;
use crate::models::format::Artifact;
use crate::models::kind::CredentialKind;
use crate::models::record::CredentialRecord;

/// A locally validated creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub kind: CredentialKind,
    pub owner: String,
    pub identity: String,
    pub hostname: Option<String>,
    pub allocator: Option<String>,
    pub endpoint: Option<String>,
    pub soc: Option<String>,
}

impl CreateRequest {
    pub fn id(&self) -> String {
        self.kind.credential_id(&self.identity)
    }
}

pub trait CredentialStore: Send + Sync {
    /// All records owned by `owner`, revoked ones included.
    fn list(&self, owner: &str) -> Result<Vec<CredentialRecord>>;

    /// Raw material of one artifact of an issued credential.
    fn fetch(&self, id: &str, artifact: Artifact) -> Result<Vec<u8>>;

    /// Issue a credential. Returns the new credential id.
    fn create(&self, request: &CreateRequest) -> Result<String>;

    /// Revoke the credential issued to `owner` for (`kind`, `identity`).
    fn revoke(&self, kind: CredentialKind, owner: &str, identity: &str) -> Result<()>;
}
