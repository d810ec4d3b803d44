use crate::cli::CliContext;
use crate::core::audit_log::AuditContext;
use crate::core::delivery::FsSink;
use crate::core::index::CredentialIndex;
use crate::core::operations;
use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format: text|json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Show identity, attributes and formats of each credential
    #[arg(short = 'l', long)]
    pub long: bool,
}

#[derive(Args, Debug)]
pub struct FormatsArgs {
    /// Credential id(s), e.g. web:alice@example.com
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Credential id(s), downloaded in order
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Output format (default: the credential's first format)
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Directory to write files into
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Serialize)]
struct ListItem {
    id: String,
    kind: String,
    identity: String,
    owner: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<&'static str, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    soc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    formats: Vec<&'static str>,
}

pub fn run_list(ctx: &CliContext, args: ListArgs) -> Result<()> {
    if args.format != "text" && args.format != "json" {
        bail!("invalid format: {} (use text|json)", args.format);
    }
    let session = ctx.session()?;

    if args.format == "json" {
        let identity = session.resolve_identity()?;
        let index = CredentialIndex::fetch(&session, identity)?;
        let items: Vec<ListItem> = index
            .iter()
            .map(|c| {
                let issued = c.issued();
                ListItem {
                    id: c.id().to_string(),
                    kind: c.kind().to_string(),
                    identity: issued.identity.clone(),
                    owner: issued.owner.clone(),
                    attributes: c.attributes().into_iter().collect(),
                    soc: issued.soc.clone(),
                    created_at: issued.created_at.map(|t| t.to_rfc3339()),
                    formats: c.formats().iter().map(|f| f.id).collect(),
                }
            })
            .collect();
        let json = serde_json::to_string_pretty(&items).context("serialize list")?;
        println!("{}", json);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let count = operations::list_credentials(&session, &mut out, args.long)?;
    if count == 0 {
        writeln!(out, "No credentials found")?;
    }
    Ok(())
}

pub fn run_formats(ctx: &CliContext, args: FormatsArgs) -> Result<()> {
    let session = ctx.session()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    operations::list_formats(&session, &args.ids, &mut out)?;
    Ok(())
}

pub fn run_download(ctx: &CliContext, args: DownloadArgs) -> Result<()> {
    let session = ctx.session()?;
    let actor = session.resolve_identity()?.to_string();
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("create output directory {}", args.output_dir.display()))?;

    let mut sink = FsSink::new(&args.output_dir, io::stdout());
    operations::download_credentials(
        &session,
        &args.ids,
        args.format.as_deref(),
        &mut sink,
        |id, result| {
            let audit = AuditContext::new("download", &actor, id);
            match result {
                Ok(format) => ctx.audit(audit.with_format(format), Ok(())),
                Err(err) => ctx.audit(audit, Err(err.to_string())),
            }
        },
    )?;
    Ok(())
}
