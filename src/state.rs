use std::sync::Arc;

use crate::services::analysis_service::AnalysisService;
use crate::services::llm_service::{LlmConfig, LlmService};
use crate::services::report_tracker::ReportTracker;
use crate::services::session_service::SessionConfig;
use crate::store::{FileSessionStore, SessionStore};

/// Shared handles a presentation layer needs.
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub report_tracker: ReportTracker,
    pub session_store: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(llm_config: LlmConfig, session_config: &SessionConfig) -> Self {
        let llm = Arc::new(LlmService::new(llm_config));
        Self {
            analysis: Arc::new(AnalysisService::new(llm)),
            report_tracker: ReportTracker::new(),
            session_store: Arc::new(FileSessionStore::new(&session_config.session_dir)),
        }
    }
}
