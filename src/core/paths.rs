//! State root resolution and directory structure.

use crate::constants;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StatePaths {
    pub root: PathBuf,
    pub config_toml: PathBuf,
    pub audit_log: PathBuf,
    pub audit_lock: PathBuf,
    pub store: PathBuf,
}

impl StatePaths {
    /// Resolve the state root from CLI arg, env var, or the user's config dir.
    pub fn resolve(root_arg: Option<PathBuf>) -> Self {
        if let Some(root) = root_arg {
            return Self::from_root(root);
        }
        if let Some(root) = env::var_os(constants::ROOT_ENV).filter(|r| !r.is_empty()) {
            return Self::from_root(PathBuf::from(root));
        }
        if let Some(config) = dirs::config_dir() {
            return Self::from_root(config.join(constants::APP_DIR_NAME));
        }
        Self::from_root(PathBuf::from(constants::FALLBACK_ROOT))
    }

    pub fn from_root(root: PathBuf) -> Self {
        let config_toml = root.join(constants::CONFIG_FILE);
        let audit_log = root.join(constants::AUDIT_LOG_FILE);
        let audit_lock = root.join("audit.lock");
        let store = root.join("store");
        Self {
            root,
            config_toml,
            audit_log,
            audit_lock,
            store,
        }
    }
}

impl std::fmt::Display for StatePaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "credentials@{}", self.root.display())
    }
}
