//! Fetching and shaping raw store material into payloads.

use crate::core::session::Session;
use crate::error::{Error, Result};
use crate::models::format::Artifact;
use crate::models::payload::Payload;
use tracing::debug;
use zeroize::Zeroizing;

pub(crate) fn fetch(session: &Session, id: &str, artifact: Artifact) -> Result<Zeroizing<Vec<u8>>> {
    debug!(id, %artifact, "fetch");
    session.store().fetch(id, artifact).map(Zeroizing::new)
}

/// Fetch an artifact that must be PEM text.
pub(crate) fn fetch_pem(
    session: &Session,
    id: &str,
    format: &str,
    artifact: Artifact,
) -> Result<Zeroizing<String>> {
    let text = fetch_text(session, id, format, artifact)?;
    if !text.contains("-----BEGIN ") {
        return Err(Error::encoding(id, format, format!("{} is not PEM", artifact)));
    }
    Ok(text)
}

pub(crate) fn fetch_text(
    session: &Session,
    id: &str,
    format: &str,
    artifact: Artifact,
) -> Result<Zeroizing<String>> {
    let raw = fetch(session, id, artifact)?;
    let text = std::str::from_utf8(&raw)
        .map_err(|_| Error::encoding(id, format, format!("{} is not UTF-8", artifact)))?;
    Ok(Zeroizing::new(text.to_string()))
}

/// Certificate, key and CA chain as three stored files.
pub(crate) fn pem_files(session: &Session, id: &str, stem: &str) -> Result<Vec<Payload>> {
    let cert = fetch_pem(session, id, "pem", Artifact::Certificate)?;
    let key = fetch_pem(session, id, "pem", Artifact::PrivateKey)?;
    let ca = fetch_pem(session, id, "pem", Artifact::CaChain)?;
    Ok(vec![
        Payload::store("Certificate", format!("{}-cert.pem", stem), cert.as_bytes().to_vec()),
        Payload::store("Private key", format!("{}-key.pem", stem), key.as_bytes().to_vec()),
        Payload::store("CA certificate", format!("{}-ca.pem", stem), ca.as_bytes().to_vec()),
    ])
}

/// PKCS#12 bundle stored to disk, with its import password shown.
pub(crate) fn pkcs12_bundle(session: &Session, id: &str, stem: &str) -> Result<Vec<Payload>> {
    let bundle = fetch(session, id, Artifact::Pkcs12)?;
    if bundle.is_empty() {
        return Err(Error::encoding(id, "p12", "PKCS#12 bundle is empty"));
    }
    let password = pkcs12_password(session, id, "p12")?;
    Ok(vec![
        Payload::store("PKCS#12 bundle", format!("{}.p12", stem), bundle.to_vec()),
        Payload::show("Password", password.as_bytes().to_vec()),
    ])
}

pub(crate) fn pkcs12_password(
    session: &Session,
    id: &str,
    format: &str,
) -> Result<Zeroizing<String>> {
    let password = fetch_text(session, id, format, Artifact::Pkcs12Password)?;
    Ok(Zeroizing::new(
        password.trim_end_matches(['\r', '\n']).to_string(),
    ))
}

/// An OpenVPN profile with CA, certificate and key inlined.
pub(crate) fn inline_ovpn(
    session: &Session,
    id: &str,
    header: &[String],
) -> Result<Zeroizing<String>> {
    let profile = fetch_text(session, id, "ovpn", Artifact::VpnProfile)?;
    let ca = fetch_pem(session, id, "ovpn", Artifact::CaChain)?;
    let cert = fetch_pem(session, id, "ovpn", Artifact::Certificate)?;
    let key = fetch_pem(session, id, "ovpn", Artifact::PrivateKey)?;

    let mut out = String::new();
    for line in header {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(profile.trim_end());
    out.push('\n');
    for (tag, body) in [("ca", &ca), ("cert", &cert), ("key", &key)] {
        out.push_str(&format!("<{}>\n{}\n</{}>\n", tag, body.trim_end(), tag));
    }
    Ok(Zeroizing::new(out))
}

/// Apply the session's signing step to `data` when signing is configured.
pub(crate) fn sign_if_configured(session: &Session, id: &str, data: Vec<u8>) -> Result<Vec<u8>> {
    let Some(material) = &session.config().signing else {
        return Ok(data);
    };
    if !material.is_complete() {
        return Err(Error::signing(
            id,
            "signing key and certificate must both be set",
        ));
    }
    let signer = session
        .signer()
        .ok_or_else(|| Error::signing(id, "no signer available"))?;
    debug!(id, "signing payload");
    signer
        .sign(material, &data)
        .map_err(|e| Error::signing(id, format!("{:#}", e)))
}
