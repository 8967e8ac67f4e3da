use serde::{Deserialize, Serialize};

/// A tradable instrument with its descriptive fields and current quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: String,
    pub market_cap: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    pub sector: String,
    pub industry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Instrument {
    /// Checks the quote invariants: positive price, matching change signs
    /// and a positive P/E when one is present.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("Instrument symbol cannot be empty".to_string());
        }
        if self.price <= 0.0 {
            return Err(format!("{}: price must be positive, got {}", self.symbol, self.price));
        }
        if (self.change >= 0.0) != (self.change_percent >= 0.0) {
            return Err(format!(
                "{}: change {} and change percent {} disagree in sign",
                self.symbol, self.change, self.change_percent
            ));
        }
        if let Some(pe) = self.pe_ratio {
            if pe <= 0.0 {
                return Err(format!("{}: P/E ratio must be positive, got {}", self.symbol, pe));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Instrument {
        Instrument {
            symbol: "TEST".to_string(),
            name: "Test Corp.".to_string(),
            price: 10.0,
            change: 0.0,
            change_percent: 0.0,
            volume: "1.0M".to_string(),
            market_cap: "1B".to_string(),
            pe_ratio: None,
            sector: "Technology".to_string(),
            industry: "Software".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_flat_quote_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_mismatched_signs_rejected() {
        let instrument = Instrument {
            change: -1.0,
            change_percent: 0.5,
            ..sample()
        };
        assert!(instrument.validate().is_err());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let instrument = Instrument { price: 0.0, ..sample() };
        assert!(instrument.validate().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(Instrument {
            pe_ratio: Some(20.0),
            ..sample()
        })
        .unwrap();
        assert_eq!(json["changePercent"], 0.0);
        assert_eq!(json["marketCap"], "1B");
        assert_eq!(json["peRatio"], 20.0);
        assert!(json.get("description").is_none());
    }
}
