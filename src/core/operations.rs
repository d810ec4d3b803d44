//! Read-side operations: list, formats and download.

use crate::core::credential::Credential;
use crate::core::delivery::{self, PayloadSink};
use crate::core::index::CredentialIndex;
use crate::core::session::Session;
use crate::error::{Error, Result};
use std::io::{self, Write};
use tracing::{debug, info};

/// Describe every active credential of the session's user.
///
/// Returns the number of credentials written.
pub fn list_credentials(session: &Session, out: &mut dyn Write, verbose: bool) -> Result<usize> {
    let identity = session.resolve_identity()?;
    let index = CredentialIndex::fetch(session, identity)?;
    for credential in index.iter() {
        credential
            .describe(out, verbose)
            .map_err(|source| Error::delivery(credential.id(), "description", source))?;
    }
    Ok(index.len())
}

/// Print the format catalog of each credential in `ids`.
pub fn list_formats(session: &Session, ids: &[String], out: &mut dyn Write) -> Result<()> {
    let identity = session.resolve_identity()?;
    let index = CredentialIndex::fetch(session, identity)?;
    for (n, id) in ids.iter().enumerate() {
        let credential = index.find_by_id(id)?;
        write_formats(credential, n, ids.len() > 1, out)
            .map_err(|source| Error::delivery(credential.id(), "formats", source))?;
    }
    Ok(())
}

fn write_formats(
    credential: &dyn Credential,
    n: usize,
    headed: bool,
    out: &mut dyn Write,
) -> io::Result<()> {
    if headed {
        if n > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}:", credential.id())?;
    }
    for format in credential.formats() {
        writeln!(out, "{:<20} - {}", format.id, format.description)?;
    }
    Ok(())
}

/// Materialize one credential and hand its payloads to `sink`.
///
/// `format` defaults to the first entry of the credential's catalog.
/// Returns the format id that was produced.
pub fn download_credential(
    session: &Session,
    index: &CredentialIndex,
    id: &str,
    format: Option<&str>,
    sink: &mut dyn PayloadSink,
) -> Result<&'static str> {
    let credential = index.find_by_id(id)?;
    let descriptor = match format {
        Some(format) => credential.format(format)?,
        None => credential
            .formats()
            .first()
            .ok_or_else(|| Error::UnsupportedFormat {
                id: id.to_string(),
                format: "<default>".into(),
            })?,
    };
    debug!(id, format = descriptor.id, "materializing credential");
    let payloads = credential.get(session, descriptor.id)?;
    delivery::deliver(id, &payloads, sink)?;
    info!(id, format = descriptor.id, payloads = payloads.len(), "credential delivered");
    Ok(descriptor.id)
}

/// Download `ids` in order, stopping at the first failure.
///
/// `on_result` sees every attempted id with the produced format or the
/// error that ended the batch.
pub fn download_credentials(
    session: &Session,
    ids: &[String],
    format: Option<&str>,
    sink: &mut dyn PayloadSink,
    mut on_result: impl FnMut(&str, std::result::Result<&str, &Error>),
) -> Result<()> {
    let identity = session.resolve_identity()?;
    let index = CredentialIndex::fetch(session, identity)?;
    for id in ids {
        match download_credential(session, &index, id, format, sink) {
            Ok(produced) => on_result(id, Ok(produced)),
            Err(err) => {
                on_result(id, Err(&err));
                return Err(err);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credential::testing::{issued_store, record, session, CERT};
    use crate::core::delivery::FsSink;
    use crate::models::config::SessionConfig;
    use crate::models::kind::CredentialKind;
    use tempfile::TempDir;

    fn alice() -> SessionConfig {
        SessionConfig {
            user: Some("alice".into()),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_list_credentials_one_line_each() {
        let store = issued_store(&record(CredentialKind::Web, "alice@example.com"));
        store.insert_record(record(CredentialKind::Vpn, "laptop"));
        let session = session(store, alice());

        let mut out = Vec::new();
        assert_eq!(list_credentials(&session, &mut out, false).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("vpn:laptop"));
        assert!(lines[1].starts_with("web:alice@example.com"));
    }

    #[test]
    fn test_list_formats_for_one_credential() {
        let store = issued_store(&record(CredentialKind::Web, "alice@example.com"));
        let session = session(store, alice());
        let mut out = Vec::new();
        list_formats(&session, &["web:alice@example.com".to_string()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("pem                  - "));
    }

    #[test]
    fn test_list_formats_unknown_id() {
        let store = issued_store(&record(CredentialKind::Web, "alice@example.com"));
        let session = session(store.clone(), alice());
        let mut out = Vec::new();
        let err = list_formats(&session, &["web:nobody".to_string()], &mut out).unwrap_err();
        assert!(matches!(err, Error::CredentialNotFound { .. }));
        assert_eq!(store.fetch_count(), 0);
    }

    #[test]
    fn test_download_default_format_shows_certificate() {
        let store = issued_store(&record(CredentialKind::Web, "alice@example.com"));
        let session = session(store, alice());
        let dir = TempDir::new().unwrap();
        let mut sink = FsSink::new(dir.path(), Vec::new());

        let mut done = Vec::new();
        download_credentials(
            &session,
            &["web:alice@example.com".to_string()],
            None,
            &mut sink,
            |id, result| done.push(format!("{}/{}", id, result.unwrap())),
        )
        .unwrap();

        assert_eq!(done, vec!["web:alice@example.com/pem"]);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, format!("Certificate: {}\n", CERT.trim_end()));
    }

    #[test]
    fn test_download_batch_stops_at_first_failure() {
        let store = issued_store(&record(CredentialKind::Web, "alice@example.com"));
        let session = session(store, alice());
        let dir = TempDir::new().unwrap();
        let mut sink = FsSink::new(dir.path(), Vec::new());
        let ids = vec![
            "web:missing".to_string(),
            "web:alice@example.com".to_string(),
        ];
        let mut seen = Vec::new();
        let err = download_credentials(&session, &ids, Some("p12"), &mut sink, |id, result| {
            seen.push((id.to_string(), result.is_ok()))
        })
        .unwrap_err();
        assert!(matches!(err, Error::CredentialNotFound { .. }));
        assert_eq!(seen, vec![("web:missing".to_string(), false)]);
        assert!(!dir.path().join("web-alice@example.com.p12").exists());
    }

    #[test]
    fn test_download_unsupported_format() {
        let store = issued_store(&record(CredentialKind::Probe, "probe-1"));
        let session = session(store.clone(), alice());
        let dir = TempDir::new().unwrap();
        let mut sink = FsSink::new(dir.path(), Vec::new());
        let err = download_credentials(
            &session,
            &["probe:probe-1".to_string()],
            Some("ovpn"),
            &mut sink,
            |_, _| {},
        )
        .unwrap_err();
        assert!(err.to_string().contains("probe:probe-1"));
        assert_eq!(store.fetch_count(), 0);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_failures_name_the_credential() {
        let store = issued_store(&record(CredentialKind::Web, "alice@example.com"));
        let session = session(store, alice());
        let ids = ["web:alice@example.com".to_string()];

        let err = list_credentials(&session, &mut ClosedPipe, false).unwrap_err();
        assert!(matches!(err, Error::Delivery { .. }));
        assert!(err.to_string().contains("web:alice@example.com"));

        let err = list_formats(&session, &ids, &mut ClosedPipe).unwrap_err();
        assert!(err.to_string().contains("web:alice@example.com"));

        let dir = TempDir::new().unwrap();
        let mut sink = FsSink::new(dir.path(), ClosedPipe);
        let err = download_credentials(&session, &ids, None, &mut sink, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::Delivery { .. }));
        assert!(err.to_string().contains("web:alice@example.com"));
    }
}
