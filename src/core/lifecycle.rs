//! Create, revoke and revoke-all transitions.
//!
//! Every local precondition is checked before the store is contacted, so a
//! rejected request never leaves partial remote state behind.

use crate::core::session::Session;
use crate::core::store::CreateRequest;
use crate::error::{Error, Result};
use crate::models::kind::CredentialKind;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Kind-specific attributes supplied at creation.
#[derive(Debug, Clone, Default)]
pub struct CreationAttributes {
    pub identity: String,
    pub hostname: Option<String>,
    pub allocator: Option<String>,
    pub endpoint: Option<String>,
}

impl CreationAttributes {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Self::default()
        }
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn allocator(mut self, allocator: impl Into<String>) -> Self {
        self.allocator = Some(allocator.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn validate(&self, kind: CredentialKind) -> Result<()> {
        if self.identity.trim().is_empty() {
            return Err(Error::MissingAttribute {
                kind,
                attribute: "identity",
            });
        }
        let required: &[(&'static str, &Option<String>)] = match kind {
            CredentialKind::Web | CredentialKind::Vpn => &[],
            CredentialKind::VpnService => &[
                ("hostname", &self.hostname),
                ("allocator", &self.allocator),
            ],
            CredentialKind::Probe => &[("endpoint", &self.endpoint)],
        };
        for (attribute, value) in required {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(Error::MissingAttribute {
                    kind,
                    attribute: *attribute,
                });
            }
        }
        Ok(())
    }
}

/// Issue a credential of `kind` for the session's user.
///
/// Returns the new credential id. Attributes the kind does not use are
/// dropped rather than recorded.
pub fn create(session: &Session, kind: CredentialKind, attrs: &CreationAttributes) -> Result<String> {
    attrs.validate(kind)?;
    let owner = session.resolve_identity()?.to_string();

    let request = CreateRequest {
        kind,
        owner,
        identity: attrs.identity.clone(),
        hostname: match kind {
            CredentialKind::VpnService => attrs.hostname.clone(),
            _ => None,
        },
        allocator: match kind {
            CredentialKind::VpnService => attrs.allocator.clone(),
            _ => None,
        },
        endpoint: match kind {
            CredentialKind::Probe => attrs.endpoint.clone(),
            _ => None,
        },
        soc: session.config().soc.clone(),
    };
    let id = session.store().create(&request)?;
    info!(id = %id, owner = %request.owner, "credential created");
    Ok(id)
}

/// Revoke the `kind` credential issued for `identity`.
///
/// Absent and already revoked credentials are forwarded to the store,
/// which decides whether that is an error.
pub fn revoke(session: &Session, kind: CredentialKind, identity: &str) -> Result<()> {
    if identity.trim().is_empty() {
        return Err(Error::MissingAttribute {
            kind,
            attribute: "identity",
        });
    }
    let owner = session.resolve_identity()?;
    session.store().revoke(kind, owner, identity)?;
    info!(kind = %kind, identity, owner, "credential revoked");
    Ok(())
}

/// Result of revoking every credential of one kind.
#[derive(Debug)]
pub struct KindOutcome {
    pub kind: CredentialKind,
    pub revoked: Vec<String>,
    pub failed: Vec<(String, Error)>,
}

impl KindOutcome {
    fn new(kind: CredentialKind) -> Self {
        Self {
            kind,
            revoked: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Per-kind outcomes of a revoke-all, ordered by kind.
#[derive(Debug, Default)]
pub struct RevokeAllReport {
    pub outcomes: Vec<KindOutcome>,
}

impl RevokeAllReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(KindOutcome::is_success)
    }

    /// Kinds with at least one failed revocation.
    pub fn failed_kinds(&self) -> Vec<CredentialKind> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.kind)
            .collect()
    }
}

/// Revoke every credential the session's user owns.
///
/// Records are grouped by kind, revoked ones included, and every identity
/// is attempted even after a failure. Only listing the records can fail
/// the whole operation.
pub fn revoke_all(session: &Session) -> Result<RevokeAllReport> {
    let owner = session.resolve_identity()?;
    let records = session.store().list(owner).map_err(|e| match e {
        Error::IndexUnavailable { .. } => e,
        other => Error::IndexUnavailable {
            identity: owner.to_string(),
            reason: other.to_string(),
        },
    })?;

    let mut by_kind: BTreeMap<CredentialKind, Vec<String>> = BTreeMap::new();
    for record in records {
        let identities = by_kind.entry(record.kind).or_default();
        if !identities.contains(&record.identity) {
            identities.push(record.identity);
        }
    }

    let mut report = RevokeAllReport::default();
    for (kind, identities) in by_kind {
        let mut outcome = KindOutcome::new(kind);
        for identity in identities {
            match session.store().revoke(kind, owner, &identity) {
                Ok(()) => outcome.revoked.push(identity),
                Err(err) => {
                    warn!(kind = %kind, identity = %identity, error = %err, "revocation failed");
                    outcome.failed.push((identity, err));
                }
            }
        }
        report.outcomes.push(outcome);
    }
    info!(owner, kinds = report.outcomes.len(), "revoke-all finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credential::testing::{record, session};
    use crate::core::index::CredentialIndex;
    use crate::core::memory_store::MemoryStore;
    use crate::core::store::CredentialStore;
    use crate::models::config::SessionConfig;
    use crate::models::record::CredentialState;
    use std::sync::Arc;

    fn alice() -> SessionConfig {
        SessionConfig {
            user: Some("alice".into()),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_create_then_index_resolves_kind() {
        let store = Arc::new(MemoryStore::new());
        let session = session(store, alice());
        let cases = [
            (CredentialKind::Web, CreationAttributes::new("alice@example.com")),
            (CredentialKind::Vpn, CreationAttributes::new("laptop")),
            (
                CredentialKind::VpnService,
                CreationAttributes::new("gw1")
                    .hostname("gw1.example.com")
                    .allocator("alloc.example.com"),
            ),
            (
                CredentialKind::Probe,
                CreationAttributes::new("probe-1").endpoint("10.0.0.5:9000"),
            ),
        ];
        for (kind, attrs) in &cases {
            let id = create(&session, *kind, attrs).unwrap();
            let index = CredentialIndex::fetch(&session, "alice").unwrap();
            assert_eq!(index.find_by_id(&id).unwrap().kind(), *kind);
        }
    }

    #[test]
    fn test_missing_attribute_fails_before_store() {
        let store = Arc::new(MemoryStore::new());
        let session = session(store.clone(), alice());

        let err = create(
            &session,
            CredentialKind::VpnService,
            &CreationAttributes::new("gw1").hostname("gw1.example.com"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAttribute {
                attribute: "allocator",
                ..
            }
        ));

        let err = create(&session, CredentialKind::Probe, &CreationAttributes::new("p")).unwrap_err();
        assert!(err.to_string().contains("endpoint"));

        let err = create(&session, CredentialKind::Web, &CreationAttributes::new("  ")).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAttribute {
                attribute: "identity",
                ..
            }
        ));
        assert!(store.list("alice").unwrap().is_empty());
    }

    #[test]
    fn test_create_without_user_is_identity_error() {
        let store = Arc::new(MemoryStore::new());
        let session = session(store.clone(), SessionConfig::default());
        let err = create(&session, CredentialKind::Web, &CreationAttributes::new("a")).unwrap_err();
        assert!(matches!(err, Error::IdentityResolution(_)));
    }

    #[test]
    fn test_create_records_soc_and_drops_unused_attributes() {
        let store = Arc::new(MemoryStore::new());
        let config = SessionConfig {
            soc: Some("soc-7".into()),
            ..alice()
        };
        let session = session(store.clone(), config);
        create(
            &session,
            CredentialKind::Web,
            &CreationAttributes::new("a@example.com").endpoint("ignored:1"),
        )
        .unwrap();
        let records = store.list("alice").unwrap();
        assert_eq!(records[0].soc.as_deref(), Some("soc-7"));
        assert_eq!(records[0].endpoint, None);
    }

    #[test]
    fn test_duplicate_create_surfaces_conflict() {
        let store = Arc::new(MemoryStore::new());
        let session = session(store, alice());
        let attrs = CreationAttributes::new("a@example.com");
        create(&session, CredentialKind::Web, &attrs).unwrap();
        assert!(matches!(
            create(&session, CredentialKind::Web, &attrs),
            Err(Error::CreationConflict { .. })
        ));
    }

    #[test]
    fn test_revoke_removes_from_index() {
        let store = Arc::new(MemoryStore::new());
        let session = session(store, alice());
        let id = create(&session, CredentialKind::Vpn, &CreationAttributes::new("laptop")).unwrap();
        revoke(&session, CredentialKind::Vpn, "laptop").unwrap();
        let index = CredentialIndex::fetch(&session, "alice").unwrap();
        assert!(matches!(
            index.find_by_id(&id),
            Err(Error::CredentialNotFound { .. })
        ));
        // Second revoke is a no-op for this store.
        revoke(&session, CredentialKind::Vpn, "laptop").unwrap();
    }

    #[test]
    fn test_revoke_all_reports_every_kind() {
        let store = Arc::new(MemoryStore::new());
        store.insert_record(record(CredentialKind::Web, "alice@example.com"));
        let mut vpn = record(CredentialKind::Vpn, "laptop");
        vpn.state = CredentialState::Revoked;
        store.insert_record(vpn);
        let mut probe = record(CredentialKind::Probe, "probe-1");
        probe.endpoint = Some("10.0.0.5:9000".into());
        store.insert_record(probe);
        store.fail_revokes_of(CredentialKind::Vpn);

        let session = session(store.clone(), alice());
        let report = revoke_all(&session).unwrap();

        let kinds: Vec<_> = report.outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![CredentialKind::Web, CredentialKind::Vpn, CredentialKind::Probe]
        );
        assert!(!report.is_success());
        assert_eq!(report.failed_kinds(), vec![CredentialKind::Vpn]);
        assert_eq!(report.outcomes[0].revoked, vec!["alice@example.com"]);
        assert_eq!(report.outcomes[2].revoked, vec!["probe-1"]);
        assert!(matches!(report.outcomes[1].failed[0].1, Error::Revocation { .. }));

        assert!(store.list("alice").unwrap().iter().all(|r| !r.is_active()));
    }

    #[test]
    fn test_revoke_all_with_nothing_owned() {
        let store = Arc::new(MemoryStore::new());
        let session = session(store, alice());
        let report = revoke_all(&session).unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.is_success());
    }

    #[test]
    fn test_revoke_all_list_failure_is_whole_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_list();
        let session = session(store, alice());
        assert!(matches!(
            revoke_all(&session),
            Err(Error::IndexUnavailable { .. })
        ));
    }
}
