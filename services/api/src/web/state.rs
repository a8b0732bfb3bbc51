//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every request handler.

use crate::config::Config;
use lehrjournal_core::ports::{DocumentStore, IdentityProvider};
use lehrjournal_core::provisioning::Provisioner;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the state around a single adapter that serves both ports.
    pub fn new<S>(adapter: Arc<S>, config: Arc<Config>) -> Self
    where
        S: IdentityProvider + DocumentStore + 'static,
    {
        Self {
            identity: adapter.clone(),
            store: adapter,
            config,
        }
    }

    pub fn provisioner(&self) -> Provisioner<'_> {
        Provisioner::new(
            self.identity.as_ref(),
            self.store.as_ref(),
            &self.config.apprentice_email_domain,
        )
    }
}
