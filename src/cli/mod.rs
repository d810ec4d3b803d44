//! CLI routing and command dispatch.

use crate::constants;
use crate::core::audit_log::{self, AuditContext};
use crate::core::config::{self, SessionOverrides};
use crate::core::dir_store::DirStore;
use crate::core::identity::{IdentityProvider, ServiceAccountIdentity, TokenFileIdentity};
use crate::core::paths::StatePaths;
use crate::core::session::Session;
use crate::core::signer::OpensslSigner;
use crate::models::config::ConfigFile;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

pub mod audit;
pub mod credential;
pub mod lifecycle;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: StatePaths,
    pub non_interactive: bool,
    pub config: ConfigFile,
    overrides: SessionOverrides,
    token: PathBuf,
    svc_key: Option<PathBuf>,
}

impl CliContext {
    /// Build the session: store under the state root, identity from the
    /// service-account key if given, else the token file.
    pub fn session(&self) -> Result<Session> {
        let session_config = config::resolve(&self.config, self.overrides.clone());
        let store = DirStore::open(&self.paths.store, &session_config.project, &session_config.bucket)
            .with_context(|| format!("open credential store under {}", self.paths.store.display()))?;
        let provider: Arc<dyn IdentityProvider> = match &self.svc_key {
            Some(key) => Arc::new(ServiceAccountIdentity::new(key)),
            None => Arc::new(TokenFileIdentity::new(&self.token)),
        };
        Session::builder(session_config)
            .store(Arc::new(store))
            .identity_provider(provider)
            .signer(Arc::new(OpensslSigner))
            .build()
            .context("build session")
    }

    /// Record an action in the audit log. Failures only warn.
    pub fn audit(&self, ctx: AuditContext, outcome: std::result::Result<(), String>) {
        if !self.config.audit.enabled {
            return;
        }
        let (success, error) = match outcome {
            Ok(()) => (true, None),
            Err(e) => (false, Some(e)),
        };
        // audit failures should be visible to the operator
        if let Err(e) = audit_log::log_with_result(&self.paths, ctx, success, error) {
            eprintln!("warning: audit log failed: {:#}", e);
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "credentials-cli",
    version,
    about = "List, download, create and revoke issued credentials"
)]
pub struct Cli {
    /// State directory (config.toml, audit log, store mirror)
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "CREDENTIALS_CLI_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// Act as this user instead of the authenticated identity
    #[arg(short = 'u', long, global = true, env = "CREDENTIALS_CLI_USER")]
    pub user: Option<String>,

    /// Project hosting the credential services
    #[arg(short = 'p', long, global = true, env = "CREDENTIALS_CLI_PROJECT")]
    pub project: Option<String>,

    /// Credentials bucket
    #[arg(short = 'b', long, global = true, env = "CREDENTIALS_CLI_BUCKET")]
    pub bucket: Option<String>,

    /// Stored offline token
    #[arg(
        short = 't',
        long,
        global = true,
        value_name = "FILE",
        default_value = constants::DEFAULT_TOKEN_FILE
    )]
    pub token: PathBuf,

    /// Service-account key, used instead of the token
    #[arg(short = 'k', long, global = true, value_name = "FILE")]
    pub svc_key: Option<PathBuf>,

    /// Sign output formats that support signing
    #[arg(short = 'S', long, global = true)]
    pub sign: bool,

    /// Signing key
    #[arg(short = 'K', long, global = true, value_name = "FILE")]
    pub signing_key: Option<String>,

    /// Signing certificate
    #[arg(short = 'C', long, global = true, value_name = "FILE")]
    pub signing_cert: Option<String>,

    /// PayloadIdentifier prefix for configuration profiles
    #[arg(long, global = true)]
    pub mc_identifier: Option<String>,

    /// Display name for configuration profiles
    #[arg(long, global = true)]
    pub mc_name: Option<String>,

    /// Description for configuration profiles
    #[arg(long, global = true)]
    pub mc_description: Option<String>,

    /// Security operations center tag recorded on new credentials
    #[arg(long, global = true)]
    pub soc: Option<String>,

    /// Debug logging to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let paths = StatePaths::resolve(self.root);
        let config = config::load(&paths.config_toml)?;

        let ctx = CliContext {
            paths,
            non_interactive: self.non_interactive,
            config,
            overrides: SessionOverrides {
                project: self.project,
                bucket: self.bucket,
                user: self.user,
                soc: self.soc,
                sign: self.sign,
                signing_key: self.signing_key,
                signing_cert: self.signing_cert,
                mc_identifier: self.mc_identifier,
                mc_name: self.mc_name,
                mc_description: self.mc_description,
            },
            token: self.token,
            svc_key: self.svc_key,
        };

        match self.command {
            Commands::List(args) => credential::run_list(&ctx, args),
            Commands::Formats(args) => credential::run_formats(&ctx, args),
            Commands::Download(args) => credential::run_download(&ctx, args),
            Commands::Create(args) => lifecycle::run_create(&ctx, args),
            Commands::Revoke(args) => lifecycle::run_revoke(&ctx, args),
            Commands::RevokeAll(args) => lifecycle::run_revoke_all(&ctx, args),
            Commands::Audit { command } => audit::run(&ctx, command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List your credentials
    List(credential::ListArgs),
    /// Show the output formats a credential supports
    Formats(credential::FormatsArgs),
    /// Download credentials
    Download(credential::DownloadArgs),
    /// Create a credential
    Create(lifecycle::CreateArgs),
    /// Revoke a credential
    Revoke(lifecycle::RevokeArgs),
    /// Revoke every credential you own
    RevokeAll(lifecycle::RevokeAllArgs),
    /// View the audit trail
    Audit {
        #[command(subcommand)]
        command: audit::AuditCommand,
    },
}
