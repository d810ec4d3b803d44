//! Configuration file model and the resolved session configuration.

use crate::constants;
use serde::{Deserialize, Serialize};

/// On-disk `config.toml`. Every field is optional; CLI flags and
/// environment variables take precedence over it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub device_profile: DeviceProfile,
    #[serde(default)]
    pub signing: Option<SigningMaterial>,
    #[serde(default)]
    pub audit: AuditSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub soc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Metadata stamped into Apple configuration profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// References to the key and certificate used to sign output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningMaterial {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub cert: String,
}

impl SigningMaterial {
    pub fn is_complete(&self) -> bool {
        !self.key.trim().is_empty() && !self.cert.trim().is_empty()
    }
}

/// Fully-resolved, immutable configuration of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub project: String,
    pub bucket: String,
    /// Explicit identity; takes precedence over the identity provider.
    pub user: Option<String>,
    pub signing: Option<SigningMaterial>,
    pub device_profile: DeviceProfile,
    pub soc: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            project: constants::DEFAULT_PROJECT.to_string(),
            bucket: constants::DEFAULT_BUCKET.to_string(),
            user: None,
            signing: None,
            device_profile: DeviceProfile::default(),
            soc: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_parses_partial_sections() {
        let cfg: ConfigFile = toml::from_str(
            r#"
            [session]
            bucket = "team-creds"

            [signing]
            key = "/etc/creds/sign.key"
            cert = "/etc/creds/sign.crt"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.session.bucket.as_deref(), Some("team-creds"));
        assert!(cfg.session.project.is_none());
        assert!(cfg.signing.unwrap().is_complete());
        assert!(cfg.audit.enabled);
    }

    #[test]
    fn test_signing_material_incomplete() {
        let material = SigningMaterial {
            key: "k.pem".into(),
            cert: " ".into(),
        };
        assert!(!material.is_complete());
    }
}
