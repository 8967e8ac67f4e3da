//! Catalog and synthetic price series as seen by a chart consumer.

use roshnet_core::services::market_data_service::{
    find_instrument, generate_time_series, list_instruments, DAILY_VOLATILITY, DEFAULT_BASE_PRICE,
};
use roshnet_core::services::watchlist_service::Watchlist;

#[test]
fn catalog_is_idempotent() {
    let first = list_instruments().to_vec();
    let second = list_instruments().to_vec();
    assert_eq!(first, second);
    assert!(first.iter().all(|i| i.validate().is_ok()));
}

#[test]
fn unknown_symbol_series_starts_near_default() {
    for symbol in ["ZZZZ", "", "aapl"] {
        let series = generate_time_series(symbol);
        assert_eq!(series.len(), 31);
        let first = series.first().unwrap().price;
        assert!((first - DEFAULT_BASE_PRICE).abs() <= DEFAULT_BASE_PRICE * DAILY_VOLATILITY + 0.01);
    }
}

#[test]
fn known_symbol_series_tracks_catalog_price() {
    for instrument in list_instruments() {
        let series = generate_time_series(&instrument.symbol);
        assert_eq!(series.len(), 31);

        let first = series.first().unwrap().price;
        assert!((first - instrument.price).abs() <= instrument.price * DAILY_VOLATILITY + 0.01);

        for pair in series.points.windows(2) {
            let (prev, next) = (pair[0].price, pair[1].price);
            assert!(
                (next - prev).abs() <= prev * DAILY_VOLATILITY + 0.011,
                "{}: step {} -> {} exceeds band",
                instrument.symbol, prev, next
            );
            assert!(pair[0].date < pair[1].date);
        }
    }
}

#[test]
fn repeated_series_have_same_shape() {
    let a = generate_time_series("TSLA");
    let b = generate_time_series("TSLA");
    assert_eq!(a.len(), 31);
    assert_eq!(b.len(), 31);
    assert_eq!(a.symbol, b.symbol);
    assert_eq!(a.last().unwrap().date, b.last().unwrap().date);
}

#[test]
fn series_serializes_for_charts() {
    let series = generate_time_series("MSFT");
    let json = serde_json::to_value(&series.points).unwrap();
    let first = &json[0];
    assert!(first["date"].is_string());
    assert!(first["price"].is_number());
    assert!(first["uv"].as_u64().unwrap() >= 1000);
}

#[test]
fn watchlist_alerts_against_catalog() {
    let mut watchlist = Watchlist::new();
    watchlist.add("NVDA", Some(800.0)).unwrap();
    watchlist.add("TSLA", Some(200.0)).unwrap();

    let alerts = watchlist.triggered(list_instruments());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].symbol, "NVDA");
    assert_eq!(alerts[0].price, find_instrument("NVDA").unwrap().price);
}
