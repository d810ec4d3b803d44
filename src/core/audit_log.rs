//! Append-only, hash-chained audit trail of lifecycle and download actions.
//!
//! Entries carry metadata only, never credential material.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::paths::StatePaths;
use crate::util::fs as cred_fs;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub credential: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AuditResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_hash: Option<String>,
}

/// What is being recorded.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub action: String,
    pub actor: String,
    pub credential: String,
    pub format: Option<String>,
}

impl AuditContext {
    pub fn new(action: &str, actor: &str, credential: &str) -> Self {
        Self {
            action: action.to_string(),
            actor: actor.to_string(),
            credential: credential.to_string(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }
}

/// Append an entry chained to the previous one.
pub fn log_with_result(
    paths: &StatePaths,
    ctx: AuditContext,
    success: bool,
    error: Option<String>,
) -> Result<()> {
    cred_fs::ensure_dir(&paths.root, constants::STATE_DIR_MODE)?;
    let _lock = FileLock::exclusive(&paths.audit_lock)?;
    let prev_hash = last_entry_hash(&paths.audit_log)?;

    let mut entry = AuditEntry {
        timestamp: Utc::now(),
        action: ctx.action,
        actor: ctx.actor,
        credential: ctx.credential,
        format: ctx.format,
        result: Some(AuditResult { success, error }),
        prev_hash,
        entry_hash: None,
    };
    entry.entry_hash = Some(compute_entry_hash(&entry)?);

    let line = serde_json::to_string(&entry).context("serialize audit entry")?;
    append_line(&paths.audit_log, &line)
}

/// SHA-256 over the chained fields in a fixed order. `entry_hash` itself
/// is not covered.
fn compute_entry_hash(entry: &AuditEntry) -> Result<String> {
    let chained = (
        &entry.timestamp,
        &entry.action,
        &entry.actor,
        &entry.credential,
        &entry.format,
        &entry.result,
        &entry.prev_hash,
    );
    let bytes = serde_json::to_vec(&chained).context("serialize audit entry for hash")?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

fn append_line(audit_path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_path)
        .with_context(|| format!("open audit log {}", audit_path.display()))?;
    writeln!(file, "{}", line).context("write audit entry")?;
    cred_fs::set_permissions(audit_path, constants::AUDIT_LOG_MODE)
}

fn last_entry_hash(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut last = None;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        last = match serde_json::from_str::<AuditEntry>(&line) {
            Ok(entry) => entry.entry_hash,
            Err(_) => Some(format!("{:x}", Sha256::digest(line.as_bytes()))),
        };
    }
    Ok(last)
}

/// Read entries, keeping the newest `limit` when given.
pub fn read_log(paths: &StatePaths, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
    if !paths.audit_log.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    let mut entries = Vec::new();
    let mut malformed = 0usize;
    for line in BufReader::new(file).lines() {
        let line = line.context("read audit log line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(_) => malformed += 1,
        }
    }
    if malformed > 0 {
        warn!(malformed, "malformed audit entries skipped");
    }
    if let Some(limit) = limit {
        if entries.len() > limit {
            entries = entries.split_off(entries.len() - limit);
        }
    }
    Ok(entries)
}

/// Verify the chain. Returns (total, errors).
pub fn verify_chain(paths: &StatePaths) -> Result<(usize, Vec<String>)> {
    let entries = read_log(paths, None)?;
    let mut errors = Vec::new();
    let mut prev_entry_hash: Option<String> = None;

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 && entry.prev_hash != prev_entry_hash {
            errors.push(format!(
                "entry {}: prev_hash mismatch (expected {:?}, got {:?})",
                i + 1,
                prev_entry_hash,
                entry.prev_hash
            ));
        }
        match &entry.entry_hash {
            Some(stored) => match compute_entry_hash(entry) {
                Ok(computed) if &computed == stored => {}
                Ok(_) => errors.push(format!("entry {}: entry_hash mismatch (tampered?)", i + 1)),
                Err(e) => errors.push(format!("entry {}: cannot compute hash: {}", i + 1, e)),
            },
            None => errors.push(format!("entry {}: missing entry_hash", i + 1)),
        }
        prev_entry_hash = entry.entry_hash.clone();
    }

    Ok((entries.len(), errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, StatePaths) {
        let dir = TempDir::new().unwrap();
        let paths = StatePaths::from_root(dir.path().join("state"));
        (dir, paths)
    }

    fn log(paths: &StatePaths, action: &str, credential: &str) {
        log_with_result(paths, AuditContext::new(action, "alice", credential), true, None).unwrap();
    }

    #[test]
    fn test_log_and_read_roundtrip() {
        let (_dir, paths) = test_paths();
        log_with_result(
            &paths,
            AuditContext::new("download", "alice", "web:alice@example.com").with_format("p12"),
            true,
            None,
        )
        .unwrap();
        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "download");
        assert_eq!(entries[0].format.as_deref(), Some("p12"));
        assert!(entries[0].prev_hash.is_none());
        assert!(entries[0].entry_hash.is_some());
    }

    #[test]
    fn test_failure_is_recorded() {
        let (_dir, paths) = test_paths();
        log_with_result(
            &paths,
            AuditContext::new("revoke", "alice", "vpn:laptop"),
            false,
            Some("store rejected revocation".into()),
        )
        .unwrap();
        let entries = read_log(&paths, None).unwrap();
        let result = entries[0].result.as_ref().unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("store rejected revocation"));
    }

    #[test]
    fn test_read_log_with_limit() {
        let (_dir, paths) = test_paths();
        for i in 0..5 {
            log(&paths, &format!("action_{}", i), "web:a");
        }
        let entries = read_log(&paths, Some(2)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action, "action_4");
    }

    #[test]
    fn test_read_log_nonexistent() {
        let (_dir, paths) = test_paths();
        assert!(read_log(&paths, None).unwrap().is_empty());
    }

    #[test]
    fn test_entry_hash_covers_fields_not_itself() {
        let (_dir, paths) = test_paths();
        log(&paths, "download", "web:a");
        let mut entry = read_log(&paths, None).unwrap().remove(0);
        let stored = entry.entry_hash.clone().unwrap();
        assert_eq!(compute_entry_hash(&entry).unwrap(), stored);

        entry.entry_hash = None;
        assert_eq!(compute_entry_hash(&entry).unwrap(), stored);
        entry.format = Some("p12".into());
        assert_ne!(compute_entry_hash(&entry).unwrap(), stored);
    }

    #[test]
    fn test_verify_chain_ok() {
        let (_dir, paths) = test_paths();
        log(&paths, "create", "web:a");
        log(&paths, "download", "web:a");
        log(&paths, "revoke", "web:a");
        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 3);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_verify_chain_detects_tamper() {
        let (_dir, paths) = test_paths();
        log(&paths, "create", "web:a");
        log(&paths, "download", "web:a");

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        fs::write(&paths.audit_log, content.replace("download", "revoke")).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_verify_chain_detects_removed_entry() {
        let (_dir, paths) = test_paths();
        log(&paths, "create", "web:a");
        log(&paths, "download", "web:a");
        log(&paths, "revoke", "web:a");

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        let kept: Vec<&str> = content.lines().enumerate().filter(|(i, _)| *i != 1).map(|(_, l)| l).collect();
        fs::write(&paths.audit_log, kept.join("\n") + "\n").unwrap();

        let (_, errors) = verify_chain(&paths).unwrap();
        assert!(errors.iter().any(|e| e.contains("prev_hash mismatch")));
    }
}
