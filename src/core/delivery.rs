//! Payload delivery: persist Store payloads, print Show payloads.

use crate::constants;
use crate::error::{Error, Result};
use crate::models::payload::{Disposition, Payload};
use crate::util::{fs as cred_fs, path};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for payload fragments.
pub trait PayloadSink {
    /// Persist `data` as `filename`. Returns the path written.
    fn store(&mut self, description: &str, filename: &str, data: &[u8]) -> io::Result<PathBuf>;

    /// Emit `description` and the text of `data`.
    fn show(&mut self, description: &str, data: &[u8]) -> io::Result<()>;
}

/// Writes files into `dir` and text to `out`.
pub struct FsSink<W: Write> {
    dir: PathBuf,
    out: W,
}

impl<W: Write> FsSink<W> {
    pub fn new(dir: impl Into<PathBuf>, out: W) -> Self {
        Self {
            dir: dir.into(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PayloadSink for FsSink<W> {
    fn store(&mut self, description: &str, filename: &str, data: &[u8]) -> io::Result<PathBuf> {
        let target = self.dir.join(filename);
        if !path::is_plain_file_name(filename) || !path::is_within(&target, &self.dir) {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "unsafe file name"));
        }
        cred_fs::write_atomic(&target, data, constants::CRED_FILE_MODE)?;
        info!(file = %target.display(), "stored payload");
        writeln!(self.out, "{} written to {}", description, display(&target, &self.dir))?;
        Ok(target)
    }

    fn show(&mut self, description: &str, data: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(data);
        writeln!(self.out, "{}: {}", description, text.trim_end_matches('\n'))
    }
}

fn display(target: &Path, dir: &Path) -> String {
    if dir == Path::new(".") || dir.as_os_str().is_empty() {
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        target.display().to_string()
    }
}

/// Deliver the payloads of credential `id` in order, stopping at the first
/// failure.
pub fn deliver(id: &str, payloads: &[Payload], sink: &mut dyn PayloadSink) -> Result<()> {
    for payload in payloads {
        match &payload.disposition {
            Disposition::Store { filename } => {
                if filename.is_empty() {
                    return Err(Error::delivery(
                        id,
                        &payload.description,
                        io::Error::new(io::ErrorKind::InvalidInput, "no file name"),
                    ));
                }
                sink.store(&payload.description, filename, &payload.data)
                    .map_err(|source| Error::delivery(id, filename, source))?;
            }
            Disposition::Show => sink
                .show(&payload.description, &payload.data)
                .map_err(|source| Error::delivery(id, &payload.description, source))?,
        }
    }
    Ok(())
}
