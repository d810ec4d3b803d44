//! Centralized defaults, file names and permissions.

/// Default project hosting the credential services.
pub const DEFAULT_PROJECT: &str = "example";

/// Default credentials bucket.
pub const DEFAULT_BUCKET: &str = "example-credentials";

/// Default offline token file, relative to the working directory.
pub const DEFAULT_TOKEN_FILE: &str = ".credentials-cli-auth";

/// State root used when no config directory can be determined.
pub const FALLBACK_ROOT: &str = ".credentials-cli";

/// Environment variable overriding the state root.
pub const ROOT_ENV: &str = "CREDENTIALS_CLI_ROOT";

/// Permission mode for state directories.
pub const STATE_DIR_MODE: u32 = 0o700;

/// Permission mode for delivered credential files and store artifacts.
pub const CRED_FILE_MODE: u32 = 0o600;

/// Permission mode for the audit log.
pub const AUDIT_LOG_MODE: u32 = 0o600;

/// Name of the store index inside a bucket directory.
pub const STORE_INDEX_FILE: &str = "index.toml";

/// Lock guarding store index updates.
pub const STORE_LOCK_FILE: &str = "index.lock";

/// Name of the state directory under the user's config directory.
pub const APP_DIR_NAME: &str = "credentials-cli";

/// Configuration file inside the state root.
pub const CONFIG_FILE: &str = "config.toml";

/// Audit log inside the state root.
pub const AUDIT_LOG_FILE: &str = "audit.log";
