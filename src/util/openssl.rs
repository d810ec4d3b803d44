use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// Produce a DER-encoded, attached S/MIME signature over `data`.
pub fn smime_sign(key: &Path, cert: &Path, data: &[u8]) -> Result<Vec<u8>> {
    let mut input = tempfile::Builder::new()
        .prefix(".unsigned-")
        .tempfile()
        .context("create temp input")?;
    input.write_all(data).context("write temp input")?;
    input.flush().context("flush temp input")?;

    let mut cmd = Command::new("openssl");
    cmd.arg("smime")
        .arg("-sign")
        .arg("-binary")
        .arg("-nodetach")
        .arg("-outform")
        .arg("der")
        .arg("-signer")
        .arg(cert)
        .arg("-inkey")
        .arg(key)
        .arg("-in")
        .arg(input.path());
    output(cmd).context("openssl smime -sign")
}

pub fn available() -> bool {
    Command::new("openssl")
        .arg("version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn output(mut cmd: Command) -> Result<Vec<u8>> {
    let output = cmd.output().context("run command")?;
    if output.status.success() {
        return Ok(output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!("command failed: {}", stderr.trim());
}
