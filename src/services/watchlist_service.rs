use tracing::info;

use crate::errors::AppError;
use crate::models::{Instrument, ThresholdAlert, WatchlistItem};
use crate::services::market_data_service;

/// The user's watchlist, ordered by insertion.
#[derive(Debug, Clone, Default)]
pub struct Watchlist {
    items: Vec<WatchlistItem>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[WatchlistItem] {
        &self.items
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let symbol = normalize_symbol(symbol);
        self.items.iter().any(|item| item.symbol == symbol)
    }

    pub fn add(&mut self, symbol: &str, threshold: Option<f64>) -> Result<&WatchlistItem, AppError> {
        let symbol = normalize_symbol(symbol);
        if market_data_service::find_instrument(&symbol).is_none() {
            return Err(AppError::NotFound(format!("Unknown symbol {}", symbol)));
        }
        if self.contains(&symbol) {
            return Err(AppError::Validation(format!("{} is already on the watchlist", symbol)));
        }
        validate_threshold(threshold)?;

        info!("Watching {} (threshold: {:?})", symbol, threshold);
        self.items.push(WatchlistItem { symbol, threshold });
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, symbol: &str) -> Result<WatchlistItem, AppError> {
        let symbol = normalize_symbol(symbol);
        let position = self
            .items
            .iter()
            .position(|item| item.symbol == symbol)
            .ok_or_else(|| AppError::NotFound(format!("{} is not on the watchlist", symbol)))?;
        Ok(self.items.remove(position))
    }

    pub fn set_threshold(&mut self, symbol: &str, threshold: Option<f64>) -> Result<(), AppError> {
        validate_threshold(threshold)?;
        let symbol = normalize_symbol(symbol);
        let item = self
            .items
            .iter_mut()
            .find(|item| item.symbol == symbol)
            .ok_or_else(|| AppError::NotFound(format!("{} is not on the watchlist", symbol)))?;
        item.threshold = threshold;
        Ok(())
    }

    /// Items whose instrument in `quotes` trades at or above their threshold.
    pub fn triggered(&self, quotes: &[Instrument]) -> Vec<ThresholdAlert> {
        self.items
            .iter()
            .filter_map(|item| {
                let threshold = item.threshold?;
                let quote = quotes.iter().find(|q| q.symbol == item.symbol)?;
                (quote.price >= threshold).then(|| ThresholdAlert {
                    symbol: item.symbol.clone(),
                    threshold,
                    price: quote.price,
                })
            })
            .collect()
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn validate_threshold(threshold: Option<f64>) -> Result<(), AppError> {
    match threshold {
        Some(value) if !(value.is_finite() && value > 0.0) => Err(AppError::Validation(format!(
            "Threshold must be a positive price, got {}",
            value
        ))),
        _ => Ok(()),
    }
}
