//! Shared Application State
//!
//! `AppState` holds the resources every handler needs: the page sessions,
//! the model client and the access credential it reads on each call.

use crate::{config::Config, session::SessionRegistry};
use shield_advisor_core::llm_client::{Credential, LLMClient};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub llm_client: Arc<dyn LLMClient>,
    pub credential: Arc<Credential>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, llm_client: Arc<dyn LLMClient>, credential: Arc<Credential>) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::default()),
            llm_client,
            credential,
            config: Arc::new(config),
        }
    }
}
