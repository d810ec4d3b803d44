//! Authenticated session: immutable configuration plus the collaborators
//! every operation talks to.

use crate::core::identity::IdentityProvider;
use crate::core::signer::Signer;
use crate::core::store::CredentialStore;
use crate::error::{Error, Result};
use crate::models::config::SessionConfig;
use std::sync::{Arc, OnceLock};
use tracing::debug;

pub struct Session {
    config: SessionConfig,
    store: Arc<dyn CredentialStore>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    signer: Option<Arc<dyn Signer>>,
    identity: OnceLock<String>,
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            store: None,
            identity_provider: None,
            signer: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn signer(&self) -> Option<&dyn Signer> {
        self.signer.as_deref()
    }

    /// Resolve the operator identity.
    ///
    /// Precedence: the configured `user` wins; otherwise the identity
    /// provider is asked once and its answer is cached for the lifetime of
    /// the session.
    pub fn resolve_identity(&self) -> Result<&str> {
        if let Some(identity) = self.identity.get() {
            return Ok(identity.as_str());
        }
        let resolved = resolve(
            self.config.user.as_deref(),
            self.identity_provider.as_deref(),
        )?;
        debug!(identity = %resolved, "resolved session identity");
        // A concurrent resolver may have won; either value is equivalent.
        let _ = self.identity.set(resolved);
        self.identity
            .get()
            .map(String::as_str)
            .ok_or_else(|| Error::IdentityResolution("identity cache unavailable".into()))
    }
}

fn resolve(user: Option<&str>, provider: Option<&dyn IdentityProvider>) -> Result<String> {
    if let Some(user) = user.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(user.to_string());
    }
    match provider {
        Some(provider) => {
            let email = provider.email()?;
            if email.trim().is_empty() {
                return Err(Error::IdentityResolution(
                    "identity provider returned an empty identity".into(),
                ));
            }
            Ok(email)
        }
        None => Err(Error::IdentityResolution(
            "no user specified and no identity provider configured".into(),
        )),
    }
}

pub struct SessionBuilder {
    config: SessionConfig,
    store: Option<Arc<dyn CredentialStore>>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    signer: Option<Arc<dyn Signer>>,
}

impl SessionBuilder {
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn build(self) -> Result<Session> {
        let store = self
            .store
            .ok_or_else(|| Error::Config("session has no credential store".into()))?;
        if self.config.project.trim().is_empty() {
            return Err(Error::Config("project must not be empty".into()));
        }
        if self.config.bucket.trim().is_empty() {
            return Err(Error::Config("bucket must not be empty".into()));
        }
        Ok(Session {
            config: self.config,
            store,
            identity_provider: self.identity_provider,
            signer: self.signer,
            identity: OnceLock::new(),
        })
    }
}
