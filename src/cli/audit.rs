use crate::cli::CliContext;
use crate::core::audit_log::{self, AuditEntry};
use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Show recorded create, revoke and download actions
    Log(AuditLogArgs),
    /// Check that no entry was altered or removed
    Verify,
}

#[derive(Args, Debug)]
pub struct AuditLogArgs {
    /// Maximum number of entries to display
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Only entries for this credential id
    #[arg(long)]
    pub credential: Option<String>,

    /// Only entries with this action (create|revoke|revoke-all|download)
    #[arg(long)]
    pub action: Option<String>,
}

pub fn run(ctx: &CliContext, cmd: AuditCommand) -> Result<()> {
    match cmd {
        AuditCommand::Log(args) => run_log(ctx, args),
        AuditCommand::Verify => run_verify(ctx),
    }
}

fn matches(entry: &AuditEntry, args: &AuditLogArgs) -> bool {
    args.credential.as_deref().map_or(true, |c| entry.credential == c)
        && args.action.as_deref().map_or(true, |a| entry.action == a)
}

fn run_log(ctx: &CliContext, args: AuditLogArgs) -> Result<()> {
    let mut entries: Vec<AuditEntry> = audit_log::read_log(&ctx.paths, None)?
        .into_iter()
        .filter(|e| matches(e, &args))
        .collect();
    if entries.len() > args.limit {
        entries = entries.split_off(entries.len() - args.limit);
    }

    if entries.is_empty() {
        println!("No audit entries found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(
        ["Timestamp", "Actor", "Action", "Credential", "Format", "Result"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for entry in &entries {
        let local: DateTime<Local> = entry.timestamp.into();
        let result = match &entry.result {
            Some(r) if r.success => "OK".to_string(),
            Some(r) => format!("FAIL: {}", r.error.as_deref().unwrap_or("?")),
            None => "-".to_string(),
        };
        table.add_row(vec![
            local.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.actor.clone(),
            entry.action.clone(),
            entry.credential.clone(),
            entry.format.clone().unwrap_or_else(|| "-".into()),
            result,
        ]);
    }

    println!("{}", table);
    println!("\n{} entries shown.", entries.len());
    Ok(())
}

fn run_verify(ctx: &CliContext) -> Result<()> {
    let (total, errors) = audit_log::verify_chain(&ctx.paths)?;
    if total == 0 {
        println!("No audit entries to verify.");
        return Ok(());
    }
    for err in &errors {
        println!("  [FAIL] {}", err);
    }
    if !errors.is_empty() {
        bail!("audit chain: {} entries, {} errors", total, errors.len());
    }
    println!("Audit chain: {} entries verified", total);
    Ok(())
}
