use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Buy,
    Hold,
    Sell,
}

impl Rating {
    pub const ALL: [Rating; 3] = [Rating::Buy, Rating::Hold, Rating::Sell];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Buy => "Buy",
            Rating::Hold => "Hold",
            Rating::Sell => "Sell",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Rating::Buy),
            "hold" => Ok(Rating::Hold),
            "sell" => Ok(Rating::Sell),
            other => Err(format!("Unknown rating: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("Unknown risk level: {}", other)),
        }
    }
}

/// Structured model assessment of a single instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub symbol: String,
    pub summary: String,
    pub rating: Rating,
    pub risk_level: RiskLevel,
    pub key_points: Vec<String>,
}

/// Whatever could be recovered from a deep-dive response body.
///
/// Every field is optional so that parsing itself never fails; an empty or
/// partial draft means "no analysis available".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub summary: Option<String>,
    pub rating: Option<Rating>,
    pub risk_level: Option<RiskLevel>,
    pub key_points: Vec<String>,
}

impl ReportDraft {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.rating.is_none()
            && self.risk_level.is_none()
            && self.key_points.is_empty()
    }

    /// Builds a report for `symbol`. Any symbol the model emitted is ignored.
    pub fn into_report(self, symbol: &str) -> Option<AnalysisReport> {
        let summary = self.summary.filter(|s| !s.trim().is_empty())?;
        if self.key_points.is_empty() {
            return None;
        }
        Some(AnalysisReport {
            symbol: symbol.to_string(),
            summary,
            rating: self.rating?,
            risk_level: self.risk_level?,
            key_points: self.key_points,
        })
    }
}

#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    Aggregate(Vec<Instrument>),
    DeepDive(Instrument),
}

#[derive(Debug, Clone)]
pub enum AnalysisResponse {
    Summary(String),
    Report(AnalysisReport),
}
