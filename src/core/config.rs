//! Loading `config.toml` and merging it with command-line values.

use crate::models::config::{ConfigFile, DeviceProfile, SessionConfig, SigningMaterial};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load the config file, or defaults when it does not exist.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub project: Option<String>,
    pub bucket: Option<String>,
    pub user: Option<String>,
    pub soc: Option<String>,
    pub sign: bool,
    pub signing_key: Option<String>,
    pub signing_cert: Option<String>,
    pub mc_identifier: Option<String>,
    pub mc_name: Option<String>,
    pub mc_description: Option<String>,
}

/// Merge `overrides` over `file` over built-in defaults.
///
/// Signing only turns on with `sign`; the file just supplies key and
/// certificate paths.
pub fn resolve(file: &ConfigFile, overrides: SessionOverrides) -> SessionConfig {
    let defaults = SessionConfig::default();
    let pick = |flag: Option<String>, from_file: &Option<String>, default: String| {
        flag.or_else(|| from_file.clone()).unwrap_or(default)
    };

    let signing = overrides.sign.then(|| {
        let from_file = file.signing.clone().unwrap_or_default();
        SigningMaterial {
            key: overrides.signing_key.unwrap_or(from_file.key),
            cert: overrides.signing_cert.unwrap_or(from_file.cert),
        }
    });

    let device_profile = DeviceProfile {
        identifier: overrides
            .mc_identifier
            .unwrap_or_else(|| file.device_profile.identifier.clone()),
        name: overrides
            .mc_name
            .unwrap_or_else(|| file.device_profile.name.clone()),
        description: overrides
            .mc_description
            .unwrap_or_else(|| file.device_profile.description.clone()),
    };

    SessionConfig {
        project: pick(overrides.project, &file.session.project, defaults.project),
        bucket: pick(overrides.bucket, &file.session.bucket, defaults.bucket),
        user: overrides.user,
        signing,
        device_profile,
        soc: overrides.soc.or_else(|| file.session.soc.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let cfg = load(&dir.path().join("config.toml")).unwrap();
        assert!(cfg.session.project.is_none());
        assert!(cfg.audit.enabled);
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[session\n").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }

    #[test]
    fn test_flag_beats_file_beats_default() {
        let file: ConfigFile = toml::from_str(
            r#"
            [session]
            project = "from-file"
            bucket = "file-bucket"
            soc = "soc-file"
            "#,
        )
        .unwrap();
        let cfg = resolve(
            &file,
            SessionOverrides {
                bucket: Some("flag-bucket".into()),
                ..Default::default()
            },
        );
        assert_eq!(cfg.project, "from-file");
        assert_eq!(cfg.bucket, "flag-bucket");
        assert_eq!(cfg.soc.as_deref(), Some("soc-file"));

        let cfg = resolve(&ConfigFile::default(), SessionOverrides::default());
        assert_eq!(cfg.project, constants::DEFAULT_PROJECT);
        assert_eq!(cfg.bucket, constants::DEFAULT_BUCKET);
    }

    #[test]
    fn test_signing_requires_flag() {
        let file: ConfigFile = toml::from_str(
            r#"
            [signing]
            key = "sign.key"
            cert = "sign.crt"
            "#,
        )
        .unwrap();
        assert!(resolve(&file, SessionOverrides::default()).signing.is_none());

        let cfg = resolve(
            &file,
            SessionOverrides {
                sign: true,
                signing_cert: Some("other.crt".into()),
                ..Default::default()
            },
        );
        let signing = cfg.signing.unwrap();
        assert_eq!(signing.key, "sign.key");
        assert_eq!(signing.cert, "other.crt");
    }

    #[test]
    fn test_device_profile_overrides() {
        let file: ConfigFile = toml::from_str(
            r#"
            [device_profile]
            identifier = "com.example.vpn"
            name = "Example VPN"
            "#,
        )
        .unwrap();
        let cfg = resolve(
            &file,
            SessionOverrides {
                mc_name: Some("Corp VPN".into()),
                ..Default::default()
            },
        );
        assert_eq!(cfg.device_profile.identifier, "com.example.vpn");
        assert_eq!(cfg.device_profile.name, "Corp VPN");
        assert_eq!(cfg.device_profile.description, "");
    }
}
