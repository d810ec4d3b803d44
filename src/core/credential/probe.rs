use super::{material, Credential, Issued};
use crate::core::session::Session;
use crate::error::{Error, Result};
use crate::models::format::FormatDescriptor;
use crate::models::kind::CredentialKind;
use crate::models::payload::Payload;

const FORMATS: &[FormatDescriptor] = &[
    FormatDescriptor::new("pem", "PEM certificate, key and CA files"),
    FormatDescriptor::new("p12", "PKCS#12 bundle"),
];

/// Credential a monitoring probe presents to its collection endpoint.
#[derive(Debug, Clone)]
pub struct ProbeCredential {
    issued: Issued,
    endpoint: String,
}

impl ProbeCredential {
    pub fn new(issued: Issued, endpoint: String) -> Self {
        Self { issued, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Credential for ProbeCredential {
    fn id(&self) -> &str {
        &self.issued.id
    }

    fn kind(&self) -> CredentialKind {
        CredentialKind::Probe
    }

    fn formats(&self) -> &'static [FormatDescriptor] {
        FORMATS
    }

    fn issued(&self) -> &Issued {
        &self.issued
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![("endpoint", self.endpoint.clone())]
    }

    fn materialize(&self, session: &Session, format: &FormatDescriptor) -> Result<Vec<Payload>> {
        let id = self.id();
        let stem = self.issued.file_stem();
        match format.id {
            "pem" => material::pem_files(session, id, &stem),
            "p12" => material::pkcs12_bundle(session, id, &stem),
            other => Err(Error::UnsupportedFormat {
                id: id.to_string(),
                format: other.to_string(),
            }),
        }
    }
}
