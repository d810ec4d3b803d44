use super::{material, Credential, Issued};
use crate::core::session::Session;
use crate::error::{Error, Result};
use crate::models::format::FormatDescriptor;
use crate::models::kind::CredentialKind;
use crate::models::payload::Payload;

const FORMATS: &[FormatDescriptor] = &[
    FormatDescriptor::new("pem", "PEM certificate, key and CA files"),
    FormatDescriptor::new("ovpn", "OpenVPN server configuration"),
];

/// Credential of a VPN endpoint, bound to its host and address allocator.
#[derive(Debug, Clone)]
pub struct VpnServiceCredential {
    issued: Issued,
    hostname: String,
    allocator: String,
}

impl VpnServiceCredential {
    pub fn new(issued: Issued, hostname: String, allocator: String) -> Self {
        Self {
            issued,
            hostname,
            allocator,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn allocator(&self) -> &str {
        &self.allocator
    }
}

impl Credential for VpnServiceCredential {
    fn id(&self) -> &str {
        &self.issued.id
    }

    fn kind(&self) -> CredentialKind {
        CredentialKind::VpnService
    }

    fn formats(&self) -> &'static [FormatDescriptor] {
        FORMATS
    }

    fn issued(&self) -> &Issued {
        &self.issued
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("hostname", self.hostname.clone()),
            ("allocator", self.allocator.clone()),
        ]
    }

    fn materialize(&self, session: &Session, format: &FormatDescriptor) -> Result<Vec<Payload>> {
        let id = self.id();
        let stem = self.issued.file_stem();
        match format.id {
            "pem" => material::pem_files(session, id, &stem),
            "ovpn" => {
                let header = [
                    format!("host: {}", self.hostname),
                    format!("allocator: {}", self.allocator),
                ];
                let config = material::inline_ovpn(session, id, &header)?;
                Ok(vec![Payload::store(
                    "OpenVPN server configuration",
                    format!("{}-server.ovpn", stem),
                    config.as_bytes().to_vec(),
                )])
            }
            other => Err(Error::UnsupportedFormat {
                id: id.to_string(),
                format: other.to_string(),
            }),
        }
    }
}
