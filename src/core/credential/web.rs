use super::{material, Credential, Issued};
use crate::core::session::Session;
use crate::error::{Error, Result};
use crate::models::format::{Artifact, FormatDescriptor};
use crate::models::kind::CredentialKind;
use crate::models::payload::Payload;

const FORMATS: &[FormatDescriptor] = &[
    FormatDescriptor::new("pem", "PEM certificate, printed"),
    FormatDescriptor::new("p12", "PKCS#12 bundle for browser import"),
];

/// Client certificate for web access.
#[derive(Debug, Clone)]
pub struct WebCredential {
    issued: Issued,
}

impl WebCredential {
    pub fn new(issued: Issued) -> Self {
        Self { issued }
    }
}

impl Credential for WebCredential {
    fn id(&self) -> &str {
        &self.issued.id
    }

    fn kind(&self) -> CredentialKind {
        CredentialKind::Web
    }

    fn formats(&self) -> &'static [FormatDescriptor] {
        FORMATS
    }

    fn issued(&self) -> &Issued {
        &self.issued
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn materialize(&self, session: &Session, format: &FormatDescriptor) -> Result<Vec<Payload>> {
        let id = self.id();
        match format.id {
            "pem" => {
                let cert = material::fetch_pem(session, id, format.id, Artifact::Certificate)?;
                Ok(vec![Payload::show("Certificate", cert.as_bytes().to_vec())])
            }
            "p12" => material::pkcs12_bundle(session, id, &self.issued.file_stem()),
            other => Err(Error::UnsupportedFormat {
                id: id.to_string(),
                format: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::models::config::SessionConfig;
    use crate::models::payload::Disposition;

    #[test]
    fn test_pem_is_shown_not_stored() {
        let rec = record(CredentialKind::Web, "alice@example.com");
        let session = session(issued_store(&rec), SessionConfig::default());
        let payloads = WebCredential::new(Issued::from_record(&rec))
            .get(&session, "pem")
            .unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].description, "Certificate");
        assert_eq!(payloads[0].disposition, Disposition::Show);
        assert_eq!(payloads[0].data.as_slice(), CERT.as_bytes());
    }

    #[test]
    fn test_p12_stores_bundle_and_shows_password() {
        let rec = record(CredentialKind::Web, "alice@example.com");
        let session = session(issued_store(&rec), SessionConfig::default());
        let payloads = WebCredential::new(Issued::from_record(&rec))
            .get(&session, "p12")
            .unwrap();
        assert_eq!(payloads[0].filename(), Some("web-alice@example.com.p12"));
        assert_eq!(payloads[1].disposition, Disposition::Show);
        assert_eq!(payloads[1].data.as_slice(), b"s3cret");
    }

    #[test]
    fn test_non_pem_certificate_is_encoding_error() {
        let rec = record(CredentialKind::Web, "alice@example.com");
        let store = issued_store(&rec);
        store.put_artifact(&rec.id, Artifact::Certificate, "garbage");
        let session = session(store, SessionConfig::default());
        let err = WebCredential::new(Issued::from_record(&rec))
            .get(&session, "pem")
            .unwrap_err();
        assert!(matches!(err, Error::FormatEncoding { .. }));
    }
}
