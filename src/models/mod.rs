mod instrument;
mod news;
mod price_point;
mod report;
mod user;
mod watchlist;

pub use instrument::Instrument;
pub use news::{NewsItem, Sentiment};
pub use price_point::{PricePoint, TimeSeries};
pub use report::{AnalysisReport, AnalysisRequest, AnalysisResponse, Rating, ReportDraft, RiskLevel};
pub use user::{AuthProvider, User};
pub use watchlist::{ThresholdAlert, WatchlistItem};
