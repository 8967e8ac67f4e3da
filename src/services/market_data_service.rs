use std::sync::LazyLock;

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use rand::Rng;
use tracing::{debug, info};

use crate::models::{Instrument, NewsItem, PricePoint, Sentiment, TimeSeries};

/// Base price used for symbols that are not in the catalog.
pub const DEFAULT_BASE_PRICE: f64 = 150.0;
/// Days of history before today; the series holds `HISTORY_DAYS + 1` points.
pub const HISTORY_DAYS: i64 = 30;
/// Daily perturbation bound as a fraction of the running price.
pub const DAILY_VOLATILITY: f64 = 0.02;

const VOLUME_PROXY_MIN: u32 = 1000;
const VOLUME_PROXY_MAX: u32 = 3000;

static CATALOG: LazyLock<Vec<Instrument>> = LazyLock::new(|| {
    vec![
        instrument(
            "AAPL", "Apple Inc.", 173.50, 2.35, 1.37, "54.2M", "2.7T", 28.5,
            "Technology", "Consumer Electronics",
            "Apple Inc. designs, manufactures, and markets smartphones, personal computers, tablets, wearables, and accessories worldwide.",
        ),
        instrument(
            "MSFT", "Microsoft Corp.", 415.20, 5.10, 1.24, "22.1M", "3.1T", 36.2,
            "Technology", "Software - Infrastructure",
            "Microsoft Corporation develops, licenses, and supports software, services, devices, and solutions worldwide.",
        ),
        instrument(
            "TSLA", "Tesla Inc.", 175.34, -3.45, -1.93, "98.5M", "550B", 42.1,
            "Consumer Cyclical", "Auto Manufacturers",
            "Tesla, Inc. designs, develops, manufactures, leases, and sells electric vehicles, and energy generation and storage systems.",
        ),
        instrument(
            "NVDA", "NVIDIA Corp.", 875.28, 15.20, 1.76, "45.3M", "2.2T", 72.8,
            "Technology", "Semiconductors",
            "NVIDIA Corporation focuses on personal computer (PC) graphics, graphics processing unit (GPU), and artificial intelligence (AI).",
        ),
        instrument(
            "AMZN", "Amazon.com Inc.", 178.15, 1.10, 0.62, "32.4M", "1.8T", 61.2,
            "Consumer Cyclical", "Internet Retail",
            "Amazon.com, Inc. engages in the retail sale of consumer products and subscriptions in North America and internationally.",
        ),
    ]
});

static NEWS: LazyLock<Vec<NewsItem>> = LazyLock::new(|| {
    vec![
        NewsItem {
            id: 1,
            title: "Tech Sector Rallies as Inflation Data Beats Expectations".to_string(),
            source: "Bloomberg".to_string(),
            time: "2h ago".to_string(),
            summary: "Major tech indices saw a significant boost this morning following the release of the latest CPI data.".to_string(),
            sentiment: Sentiment::Positive,
        },
        NewsItem {
            id: 2,
            title: "Tesla Announces New Battery Manufacturing Breakthrough".to_string(),
            source: "Reuters".to_string(),
            time: "4h ago".to_string(),
            summary: "Tesla engineers have reportedly achieved a 20% density increase in the new 4680 cells.".to_string(),
            sentiment: Sentiment::Positive,
        },
        NewsItem {
            id: 3,
            title: "Federal Reserve Signals Potential Rate Cuts in Q3".to_string(),
            source: "CNBC".to_string(),
            time: "5h ago".to_string(),
            summary: "Chairman Powell hinted that the central bank is closely monitoring cooling labor metrics.".to_string(),
            sentiment: Sentiment::Neutral,
        },
    ]
});

#[allow(clippy::too_many_arguments)]
fn instrument(
    symbol: &str,
    name: &str,
    price: f64,
    change: f64,
    change_percent: f64,
    volume: &str,
    market_cap: &str,
    pe_ratio: f64,
    sector: &str,
    industry: &str,
    description: &str,
) -> Instrument {
    Instrument {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        change,
        change_percent,
        volume: volume.to_string(),
        market_cap: market_cap.to_string(),
        pe_ratio: Some(pe_ratio),
        sector: sector.to_string(),
        industry: industry.to_string(),
        description: Some(description.to_string()),
    }
}

/// The fixed instrument catalog, same set and order on every call.
pub fn list_instruments() -> &'static [Instrument] {
    &CATALOG
}

pub fn find_instrument(symbol: &str) -> Option<&'static Instrument> {
    CATALOG.iter().find(|i| i.symbol == symbol)
}

pub fn latest_news() -> &'static [NewsItem] {
    &NEWS
}

/// Synthesizes 31 daily points ending today for `symbol`.
///
/// Unknown symbols start from [`DEFAULT_BASE_PRICE`] instead of failing.
pub fn generate_time_series(symbol: &str) -> TimeSeries {
    let today = Local::now().date_naive();
    generate_time_series_with(&mut rand::rng(), symbol, today)
}

/// Random walk behind [`generate_time_series`], with the randomness and the
/// calendar supplied by the caller.
///
/// Each step moves the running price by a uniform draw from
/// `[-v, +v)` where `v` is 2% of the running price, so the bound drifts with
/// the walk. Nothing clamps the price.
pub fn generate_time_series_with<R: Rng>(
    rng: &mut R,
    symbol: &str,
    today: NaiveDate,
) -> TimeSeries {
    let mut running = match find_instrument(symbol) {
        Some(instrument) => instrument.price,
        None => {
            debug!("Symbol {} not in catalog, using default base price {}", symbol, DEFAULT_BASE_PRICE);
            DEFAULT_BASE_PRICE
        }
    };

    let mut points = Vec::with_capacity(HISTORY_DAYS as usize + 1);
    for days_back in (0..=HISTORY_DAYS).rev() {
        let volatility = running * DAILY_VOLATILITY;
        let change = (rng.random::<f64>() * 2.0 - 1.0) * volatility;
        running += change;

        let volume_proxy = rng.random_range(VOLUME_PROXY_MIN..VOLUME_PROXY_MAX);
        points.push(PricePoint::new(
            today - ChronoDuration::days(days_back),
            round_cents(running),
            volume_proxy,
        ));
    }

    info!("Generated {} synthetic price points for {}", points.len(), symbol);

    TimeSeries {
        symbol: symbol.to_string(),
        points,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
