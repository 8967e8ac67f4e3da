use anyhow::Context;
use tracing::{error, info, warn};

use roshnet_core::logging::{init_logging, LoggingConfig};
use roshnet_core::models::AuthProvider;
use roshnet_core::services::llm_service::LlmConfig;
use roshnet_core::services::market_data_service;
use roshnet_core::services::report_tracker::ReportState;
use roshnet_core::services::session_service::{Session, SessionConfig};
use roshnet_core::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let session_config = SessionConfig::from_env();
    let state = AppState::new(LlmConfig::from_env(), &session_config);

    let mut session = Session::new(state.session_store.clone(), &session_config);
    if session.load().context("failed to read session")?.is_none() {
        session
            .login(AuthProvider::Email, std::env::var("ROSHNET_EMAIL").ok().as_deref())
            .await
            .context("failed to sign in")?;
    }
    if let Some(user) = session.user() {
        info!("👤 Signed in as {} <{}>", user.name, user.email);
    }

    let instruments = market_data_service::list_instruments();
    for instrument in instruments {
        info!("📈 {:<5} ${:>8.2} {:+.2} ({:+.2}%)",
              instrument.symbol, instrument.price, instrument.change, instrument.change_percent);
    }

    if let Some(first) = instruments.first() {
        let series = market_data_service::generate_time_series(&first.symbol);
        println!("{}", serde_json::to_string_pretty(&series.points)?);
    }

    for news in market_data_service::latest_news() {
        info!("📰 [{:?}] {} ({}, {})", news.sentiment, news.title, news.source, news.time);
    }

    let summary = state.analysis.aggregate_summary(instruments).await;
    info!("🧠 Market summary: {}", summary);

    if !state.analysis.is_enabled() {
        warn!("Set GEMINI_API_KEY to enable deep-dive reports");
        return Ok(());
    }

    if let Some(first) = instruments.first() {
        match state.report_tracker.load(&state.analysis, first).await {
            ReportState::Ready { report } => println!("{}", serde_json::to_string_pretty(&report)?),
            ReportState::Failed { symbol, message } => error!("Could not analyze {}: {}", symbol, message),
            other => warn!("Deep dive ended in unexpected state: {:?}", other),
        }
    }

    Ok(())
}
