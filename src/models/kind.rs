use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of credential variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    Web,
    Vpn,
    VpnService,
    Probe,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 4] = [
        CredentialKind::Web,
        CredentialKind::Vpn,
        CredentialKind::VpnService,
        CredentialKind::Probe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Web => "web",
            CredentialKind::Vpn => "vpn",
            CredentialKind::VpnService => "vpn-service",
            CredentialKind::Probe => "probe",
        }
    }

    /// Credential id for a (kind, identity) pair, e.g. `vpn:alice@example.com`.
    pub fn credential_id(&self, identity: &str) -> String {
        format!("{}:{}", self.as_str(), identity)
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(CredentialKind::Web),
            "vpn" => Ok(CredentialKind::Vpn),
            "vpn-service" | "vpn_service" => Ok(CredentialKind::VpnService),
            "probe" => Ok(CredentialKind::Probe),
            other => Err(format!(
                "unknown credential kind '{}', must be one of: web, vpn, vpn-service, probe",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_display() {
        for kind in CredentialKind::ALL {
            assert_eq!(kind.as_str().parse::<CredentialKind>().unwrap(), kind);
        }
        assert!("ssh".parse::<CredentialKind>().is_err());
    }

    #[test]
    fn test_credential_id() {
        assert_eq!(
            CredentialKind::VpnService.credential_id("gw1"),
            "vpn-service:gw1"
        );
    }
}
