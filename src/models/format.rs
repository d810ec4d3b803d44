use serde::Serialize;

/// One supported output encoding of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub id: &'static str,
    pub description: &'static str,
}

impl FormatDescriptor {
    pub const fn new(id: &'static str, description: &'static str) -> Self {
        Self { id, description }
    }
}

/// Raw material a store holds for an issued credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Certificate,
    PrivateKey,
    CaChain,
    Pkcs12,
    Pkcs12Password,
    VpnProfile,
}

impl Artifact {
    /// File name used when the artifact is kept on disk.
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Certificate => "cert.pem",
            Artifact::PrivateKey => "key.pem",
            Artifact::CaChain => "ca.pem",
            Artifact::Pkcs12 => "bundle.p12",
            Artifact::Pkcs12Password => "bundle.p12.password",
            Artifact::VpnProfile => "profile.ovpn",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Artifact::Certificate => "certificate",
            Artifact::PrivateKey => "private key",
            Artifact::CaChain => "CA chain",
            Artifact::Pkcs12 => "PKCS#12 bundle",
            Artifact::Pkcs12Password => "PKCS#12 password",
            Artifact::VpnProfile => "VPN profile",
        };
        f.write_str(name)
    }
}
