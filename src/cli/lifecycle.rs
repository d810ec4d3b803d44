use crate::cli::CliContext;
use crate::core::audit_log::AuditContext;
use crate::core::lifecycle::{self, CreationAttributes, RevokeAllReport};
use crate::models::kind::CredentialKind;
use anyhow::{bail, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use dialoguer::Confirm;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Credential kind: web|vpn|vpn-service|probe
    pub kind: CredentialKind,

    /// Identity the credential is issued for
    #[arg(short = 'i', long)]
    pub identity: String,

    /// Host name of the VPN endpoint (vpn-service)
    #[arg(long)]
    pub hostname: Option<String>,

    /// Address allocator of the VPN endpoint (vpn-service)
    #[arg(long)]
    pub allocator: Option<String>,

    /// Collection endpoint of the probe (probe)
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Credential kind: web|vpn|vpn-service|probe
    pub kind: CredentialKind,

    /// Identity the credential was issued for
    #[arg(short = 'i', long)]
    pub identity: String,
}

#[derive(Args, Debug)]
pub struct RevokeAllArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub fn run_create(ctx: &CliContext, args: CreateArgs) -> Result<()> {
    let session = ctx.session()?;
    let attrs = CreationAttributes {
        identity: args.identity,
        hostname: args.hostname,
        allocator: args.allocator,
        endpoint: args.endpoint,
    };
    let target = args.kind.credential_id(&attrs.identity);

    match lifecycle::create(&session, args.kind, &attrs) {
        Ok(id) => {
            let actor = session.resolve_identity()?;
            ctx.audit(AuditContext::new("create", actor, &id), Ok(()));
            println!("Created {}", id);
            Ok(())
        }
        Err(err) => {
            // Local precondition failures never reached the store.
            if !err.is_local_precondition() {
                if let Ok(actor) = session.resolve_identity() {
                    ctx.audit(AuditContext::new("create", actor, &target), Err(err.to_string()));
                }
            }
            Err(err.into())
        }
    }
}

pub fn run_revoke(ctx: &CliContext, args: RevokeArgs) -> Result<()> {
    let session = ctx.session()?;
    let target = args.kind.credential_id(&args.identity);
    let result = lifecycle::revoke(&session, args.kind, &args.identity);
    if let Ok(actor) = session.resolve_identity() {
        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
        ctx.audit(AuditContext::new("revoke", actor, &target), outcome);
    }
    result?;
    println!("Revoked {}", target);
    Ok(())
}

pub fn run_revoke_all(ctx: &CliContext, args: RevokeAllArgs) -> Result<()> {
    let session = ctx.session()?;
    let owner = session.resolve_identity()?.to_string();

    if !args.yes {
        if ctx.non_interactive {
            bail!("revoke-all requires --yes in non-interactive mode");
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Revoke every credential owned by {}?", owner))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let report = lifecycle::revoke_all(&session)?;
    for outcome in &report.outcomes {
        for identity in &outcome.revoked {
            ctx.audit(
                AuditContext::new("revoke-all", &owner, &outcome.kind.credential_id(identity)),
                Ok(()),
            );
        }
        for (identity, err) in &outcome.failed {
            ctx.audit(
                AuditContext::new("revoke-all", &owner, &outcome.kind.credential_id(identity)),
                Err(err.to_string()),
            );
        }
    }

    if report.outcomes.is_empty() {
        println!("No credentials found");
        return Ok(());
    }
    println!("{}", report_table(&report));

    if !report.is_success() {
        let failed: Vec<String> = report.failed_kinds().iter().map(|k| k.to_string()).collect();
        bail!("revocation failed for: {}", failed.join(", "));
    }
    Ok(())
}

fn report_table(report: &RevokeAllReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Kind").add_attribute(Attribute::Bold),
        Cell::new("Revoked").add_attribute(Attribute::Bold),
        Cell::new("Failed").add_attribute(Attribute::Bold),
        Cell::new("Result").add_attribute(Attribute::Bold),
    ]);
    for outcome in &report.outcomes {
        let failed: Vec<String> = outcome
            .failed
            .iter()
            .map(|(identity, err)| format!("{} ({})", identity, err))
            .collect();
        let result = if outcome.is_success() {
            Cell::new("OK").fg(Color::Green)
        } else {
            Cell::new("FAIL").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(outcome.kind),
            Cell::new(outcome.revoked.join("\n")),
            Cell::new(failed.join("\n")),
            result,
        ]);
    }
    table
}
