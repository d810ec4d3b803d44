//! Identity providers backing session identity resolution.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub trait IdentityProvider: Send + Sync {
    /// Email address of the authenticated operator.
    fn email(&self) -> Result<String>;
}

/// Identity recorded in a stored offline token file.
#[derive(Debug, Clone)]
pub struct TokenFileIdentity {
    path: PathBuf,
}

#[derive(Deserialize)]
struct TokenFile {
    #[serde(default)]
    email: Option<String>,
}

impl TokenFileIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityProvider for TokenFileIdentity {
    fn email(&self) -> Result<String> {
        let token: TokenFile = read_json(&self.path)?;
        non_empty(token.email, &self.path, "email")
    }
}

/// Identity of a service account, taken from its JSON key.
#[derive(Debug, Clone)]
pub struct ServiceAccountIdentity {
    path: PathBuf,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    #[serde(default)]
    client_email: Option<String>,
}

impl ServiceAccountIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityProvider for ServiceAccountIdentity {
    fn email(&self) -> Result<String> {
        let key: ServiceAccountKey = read_json(&self.path)?;
        non_empty(key.client_email, &self.path, "client_email")
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::IdentityResolution(format!("read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::IdentityResolution(format!("parse {}: {}", path.display(), e))
    })
}

fn non_empty(value: Option<String>, path: &Path, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::IdentityResolution(format!(
            "{} has no {}",
            path.display(),
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_token_file_email() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, r#"{"email":"alice@example.com","refresh_token":"r"}"#).unwrap();
        assert_eq!(
            TokenFileIdentity::new(&path).email().unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn test_service_account_client_email() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.json");
        fs::write(
            &path,
            r#"{"type":"service_account","client_email":"ops@example.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        assert_eq!(
            ServiceAccountIdentity::new(&path).email().unwrap(),
            "ops@example.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = TokenFileIdentity::new("/nonexistent/auth.json")
            .email()
            .unwrap_err();
        assert!(matches!(err, Error::IdentityResolution(_)));
        assert!(err.to_string().contains("/nonexistent/auth.json"));
    }

    #[test]
    fn test_token_without_email_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, r#"{"email":"  "}"#).unwrap();
        let err = TokenFileIdentity::new(&path).email().unwrap_err();
        assert!(err.to_string().contains("has no email"));
    }
}
