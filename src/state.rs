use crate::assembler::AgreementAssembler;
use crate::config::AppConfig;
use crate::session::SessionStore;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub assembler: AgreementAssembler,
}

impl AppState {
    pub fn new(sessions: SessionStore, assembler: AgreementAssembler) -> Self {
        Self {
            sessions,
            assembler,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            SessionStore::new(config.session_max_capacity, config.session_idle),
            AgreementAssembler::new(config.output_dir.clone()),
        )
    }
}
