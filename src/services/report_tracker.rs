use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::{AnalysisReport, Instrument};
use crate::services::analysis_service::AnalysisService;

/// What a deep-dive view shows for its current selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportState {
    Idle,
    Loading { symbol: String },
    Ready { report: AnalysisReport },
    Failed { symbol: String, message: String },
}

/// Handle for one in-flight deep dive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTicket {
    generation: u64,
    symbol: String,
}

#[derive(Debug)]
struct TrackerInner {
    generation: u64,
    state: ReportState,
}

/// Tracks the deep dive for the currently selected instrument.
///
/// Every `begin` supersedes the previous request; a result that arrives for a
/// superseded ticket is dropped instead of overwriting the current state.
#[derive(Clone)]
pub struct ReportTracker {
    inner: Arc<Mutex<TrackerInner>>,
}

impl Default for ReportTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerInner {
                generation: 0,
                state: ReportState::Idle,
            })),
        }
    }

    pub fn state(&self) -> ReportState {
        self.inner.lock().state.clone()
    }

    pub fn begin(&self, symbol: &str) -> ReportTicket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = ReportState::Loading {
            symbol: symbol.to_string(),
        };
        debug!("Deep dive for {} started (generation {})", symbol, inner.generation);
        ReportTicket {
            generation: inner.generation,
            symbol: symbol.to_string(),
        }
    }

    /// Applies `result` if `ticket` is still current. Returns whether it was applied.
    pub fn complete(&self, ticket: &ReportTicket, result: Result<AnalysisReport, AppError>) -> bool {
        let mut inner = self.inner.lock();
        if ticket.generation != inner.generation {
            info!("Discarding stale deep dive for {} (generation {} < {})",
                  ticket.symbol, ticket.generation, inner.generation);
            return false;
        }

        inner.state = match result {
            Ok(report) => ReportState::Ready { report },
            Err(e) => ReportState::Failed {
                symbol: ticket.symbol.clone(),
                message: e.to_string(),
            },
        };
        true
    }

    /// Drops interest in whatever is in flight and returns to `Idle`.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = ReportState::Idle;
    }

    /// Runs one deep dive for `instrument` and records its outcome unless a
    /// newer selection has been made meanwhile.
    pub async fn load(&self, analysis: &AnalysisService, instrument: &Instrument) -> ReportState {
        let ticket = self.begin(&instrument.symbol);
        let result = analysis.deep_dive(instrument).await;
        self.complete(&ticket, result);
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LlmError;
    use crate::models::{Rating, RiskLevel};

    fn report(symbol: &str) -> AnalysisReport {
        AnalysisReport {
            symbol: symbol.to_string(),
            summary: "Fine.".to_string(),
            rating: Rating::Hold,
            risk_level: RiskLevel::Low,
            key_points: vec!["Steady".to_string()],
        }
    }

    #[test]
    fn test_starts_idle() {
        assert_eq!(ReportTracker::new().state(), ReportState::Idle);
    }

    #[test]
    fn test_begin_then_complete() {
        let tracker = ReportTracker::new();
        let ticket = tracker.begin("AAPL");
        assert_eq!(tracker.state(), ReportState::Loading { symbol: "AAPL".to_string() });

        assert!(tracker.complete(&ticket, Ok(report("AAPL"))));
        assert_eq!(tracker.state(), ReportState::Ready { report: report("AAPL") });
    }

    #[test]
    fn test_failure_is_recorded() {
        let tracker = ReportTracker::new();
        let ticket = tracker.begin("AAPL");
        assert!(tracker.complete(&ticket, Err(AppError::Llm(LlmError::Timeout))));
        assert!(matches!(tracker.state(), ReportState::Failed { symbol, .. } if symbol == "AAPL"));
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let tracker = ReportTracker::new();
        let first = tracker.begin("AAPL");
        let second = tracker.begin("TSLA");

        assert!(tracker.complete(&second, Ok(report("TSLA"))));
        assert!(!tracker.complete(&first, Ok(report("AAPL"))));
        assert_eq!(tracker.state(), ReportState::Ready { report: report("TSLA") });
    }

    #[test]
    fn test_reset_supersedes_in_flight() {
        let tracker = ReportTracker::new();
        let ticket = tracker.begin("MSFT");
        tracker.reset();
        assert!(!tracker.complete(&ticket, Ok(report("MSFT"))));
        assert_eq!(tracker.state(), ReportState::Idle);
    }

    #[test]
    fn test_same_symbol_reselected_only_latest_applies() {
        let tracker = ReportTracker::new();
        let first = tracker.begin("NVDA");
        let second = tracker.begin("NVDA");
        assert!(!tracker.complete(&first, Err(AppError::Llm(LlmError::RateLimited))));
        assert_eq!(tracker.state(), ReportState::Loading { symbol: "NVDA".to_string() });
        assert!(tracker.complete(&second, Ok(report("NVDA"))));
    }
}
