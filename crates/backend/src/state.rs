//! Shared application state passed to every handler via `State`.

use std::sync::Arc;

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::google::{GoogleTokenVerifier, IdentityVerifier};
use crate::config::GateConfig;
use crate::flipbook::FlipbookResolver;

/// Everything in here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub clock: Arc<dyn Clock>,
    pub flipbook: FlipbookResolver,
}

impl AppState {
    /// Production state: wall clock and Google tokeninfo verification.
    pub fn new(config: GateConfig) -> Result<Self, reqwest::Error> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let verifier = GoogleTokenVerifier::new(
            config.tokeninfo_url.clone(),
            config.google_client_id.clone(),
            config.verify_timeout,
            clock.clone(),
        )?;
        Ok(Self::with_parts(config, Arc::new(verifier), clock))
    }

    pub fn with_parts(
        config: GateConfig,
        verifier: Arc<dyn IdentityVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let flipbook = FlipbookResolver::new(config.flipbook_url.clone());
        Self {
            config: Arc::new(config),
            verifier,
            clock,
            flipbook,
        }
    }
}
