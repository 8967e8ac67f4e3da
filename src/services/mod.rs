pub mod analysis_service;
pub mod llm_service;
pub mod market_data_service;
pub mod report_tracker;
pub mod session_service;
pub mod watchlist_service;
