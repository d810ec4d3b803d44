//! Signing capability applied to signable output formats.

use crate::models::config::SigningMaterial;
use crate::util::openssl;
use anyhow::{bail, Result};
use std::path::Path;

pub trait Signer: Send + Sync {
    /// Transform `data` into its signed encoding.
    fn sign(&self, material: &SigningMaterial, data: &[u8]) -> Result<Vec<u8>>;
}

/// Signs with the `openssl` binary; key and cert are file paths.
#[derive(Debug, Clone, Default)]
pub struct OpensslSigner;

impl Signer for OpensslSigner {
    fn sign(&self, material: &SigningMaterial, data: &[u8]) -> Result<Vec<u8>> {
        let key = Path::new(&material.key);
        let cert = Path::new(&material.cert);
        if !key.is_file() {
            bail!("signing key not found: {}", key.display());
        }
        if !cert.is_file() {
            bail!("signing cert not found: {}", cert.display());
        }
        if !openssl::available() {
            bail!("openssl not found on PATH");
        }
        openssl::smime_sign(key, cert, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_rejected_before_running_openssl() {
        let material = SigningMaterial {
            key: "/nonexistent/sign.key".into(),
            cert: "/nonexistent/sign.crt".into(),
        };
        let err = OpensslSigner.sign(&material, b"profile").unwrap_err();
        assert!(err.to_string().contains("signing key not found"));
    }
}
