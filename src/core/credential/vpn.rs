use super::{material, Credential, Issued};
use crate::core::session::Session;
use crate::error::{Error, Result};
use crate::models::config::DeviceProfile;
use crate::models::format::{Artifact, FormatDescriptor};
use crate::models::kind::CredentialKind;
use crate::models::payload::Payload;
use base64::engine::general_purpose::STANDARD;
use crate::util::path;
use base64::Engine;
use uuid::Uuid;

/// Namespace for configuration profile PayloadUUIDs.
const PROFILE_NAMESPACE: Uuid = Uuid::from_u128(0x3f1c9a52_7d4e_5b8a_9c21_4e6f0d8b7a13);

const FORMATS: &[FormatDescriptor] = &[
    FormatDescriptor::new("ovpn", "OpenVPN profile with inline certificates"),
    FormatDescriptor::new("mobileconfig", "Apple configuration profile (IKEv2)"),
    FormatDescriptor::new("p12", "PKCS#12 bundle"),
];

/// Client VPN credential.
#[derive(Debug, Clone)]
pub struct VpnCredential {
    issued: Issued,
}

impl VpnCredential {
    pub fn new(issued: Issued) -> Self {
        Self { issued }
    }

    fn mobileconfig(&self, session: &Session, format: &str) -> Result<Vec<u8>> {
        let id = self.id();
        let profile = material::fetch_text(session, id, format, Artifact::VpnProfile)?;
        let remote = remote_host(&profile)
            .ok_or_else(|| Error::encoding(id, format, "VPN profile has no remote"))?;
        let bundle = material::fetch(session, id, Artifact::Pkcs12)?;
        let password = material::pkcs12_password(session, id, format)?;

        let names = ProfileNames::new(&session.config().device_profile, &self.issued);
        let doc = render_mobileconfig(
            &names,
            &self.issued.identity,
            remote,
            &STANDARD.encode(bundle.as_slice()),
            &password,
        );
        material::sign_if_configured(session, id, doc.into_bytes())
    }
}

impl Credential for VpnCredential {
    fn id(&self) -> &str {
        &self.issued.id
    }

    fn kind(&self) -> CredentialKind {
        CredentialKind::Vpn
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
        let stem = self.issued.file_stem();
        match format.id {
            "ovpn" => {
                let config = material::inline_ovpn(session, id, &[])?;
                Ok(vec![Payload::store(
                    "OpenVPN profile",
                    format!("{}.ovpn", stem),
                    config.as_bytes().to_vec(),
                )])
            }
            "mobileconfig" => {
                let data = self.mobileconfig(session, format.id)?;
                Ok(vec![Payload::store(
                    "Apple configuration profile",
                    format!("{}.mobileconfig", stem),
                    data,
                )])
            }
            "p12" => material::pkcs12_bundle(session, id, &stem),
            other => Err(Error::UnsupportedFormat {
                id: id.to_string(),
                format: other.to_string(),
            }),
        }
    }
}

/// Host of the first `remote` directive in an OpenVPN profile.
fn remote_host(profile: &str) -> Option<&str> {
    profile
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("remote "))
        .and_then(|rest| rest.split_whitespace().next())
}

struct ProfileNames {
    identifier: String,
    name: String,
    description: String,
    root_uuid: String,
    cert_uuid: String,
    vpn_uuid: String,
}

impl ProfileNames {
    fn new(device: &DeviceProfile, issued: &Issued) -> Self {
        let identifier = non_empty(&device.identifier).unwrap_or_else(|| {
            format!("credentials-cli.vpn.{}", path::file_stem(&issued.identity))
        });
        let name = non_empty(&device.name).unwrap_or_else(|| format!("VPN ({})", issued.identity));
        let description = non_empty(&device.description)
            .unwrap_or_else(|| format!("VPN configuration for {}", issued.identity));
        let uuid = |part: &str| payload_uuid(&issued.id, &identifier, part);
        let root_uuid = uuid("profile");
        let cert_uuid = uuid("pkcs12");
        let vpn_uuid = uuid("vpn");
        Self {
            root_uuid,
            cert_uuid,
            vpn_uuid,
            identifier,
            name,
            description,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Name-based UUID, so repeated downloads are byte-identical.
fn payload_uuid(id: &str, identifier: &str, part: &str) -> String {
    let name = format!("{}\0{}\0{}", id, identifier, part);
    Uuid::new_v5(&PROFILE_NAMESPACE, name.as_bytes())
        .hyphenated()
        .to_string()
        .to_uppercase()
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn render_mobileconfig(
    names: &ProfileNames,
    identity: &str,
    remote: &str,
    bundle_b64: &str,
    password: &str,
) -> String {
    let s = xml_escape;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>PayloadContent</key>
  <array>
    <dict>
      <key>PayloadType</key><string>com.apple.security.pkcs12</string>
      <key>PayloadIdentifier</key><string>{ident}.pkcs12</string>
      <key>PayloadUUID</key><string>{cert_uuid}</string>
      <key>PayloadVersion</key><integer>1</integer>
      <key>PayloadDisplayName</key><string>{identity}</string>
      <key>Password</key><string>{password}</string>
      <key>PayloadContent</key><data>{bundle}</data>
    </dict>
    <dict>
      <key>PayloadType</key><string>com.apple.vpn.managed</string>
      <key>PayloadIdentifier</key><string>{ident}.vpn</string>
      <key>PayloadUUID</key><string>{vpn_uuid}</string>
      <key>PayloadVersion</key><integer>1</integer>
      <key>UserDefinedName</key><string>{name}</string>
      <key>VPNType</key><string>IKEv2</string>
      <key>IKEv2</key>
      <dict>
        <key>RemoteAddress</key><string>{remote}</string>
        <key>RemoteIdentifier</key><string>{remote}</string>
        <key>LocalIdentifier</key><string>{identity}</string>
        <key>AuthenticationMethod</key><string>Certificate</string>
        <key>PayloadCertificateUUID</key><string>{cert_uuid}</string>
      </dict>
    </dict>
  </array>
  <key>PayloadDisplayName</key><string>{name}</string>
  <key>PayloadDescription</key><string>{description}</string>
  <key>PayloadIdentifier</key><string>{ident}</string>
  <key>PayloadType</key><string>Configuration</string>
  <key>PayloadUUID</key><string>{root_uuid}</string>
  <key>PayloadVersion</key><integer>1</integer>
</dict>
</plist>
"#,
        ident = s(&names.identifier),
        cert_uuid = names.cert_uuid,
        vpn_uuid = names.vpn_uuid,
        root_uuid = names.root_uuid,
        identity = s(identity),
        password = s(password),
        bundle = bundle_b64,
        name = s(&names.name),
        description = s(&names.description),
        remote = s(remote),
    )
}
