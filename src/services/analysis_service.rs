use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::{AppError, LlmError};
use crate::models::{
    AnalysisReport, AnalysisRequest, AnalysisResponse, Instrument, Rating, ReportDraft, RiskLevel,
};
use crate::services::llm_service::{GenerationRequest, LlmService, ResponseSchema};

/// Returned by the aggregate summary when no credential is configured.
pub const MISSING_KEY_PLACEHOLDER: &str = "AI services unavailable (Missing API Key).";
/// Returned by the aggregate summary when the service call fails.
pub const SUMMARY_UNAVAILABLE: &str = "Market analysis temporarily unavailable.";
/// Returned by the aggregate summary for an empty instrument list.
pub const NO_MARKET_DATA: &str = "No market data available to summarize.";

/// Formats analysis prompts, calls the model and shapes its answers.
///
/// The two operations degrade differently on purpose: the aggregate summary
/// always resolves to displayable text, the deep dive surfaces every failure.
pub struct AnalysisService {
    llm: Arc<LlmService>,
}

impl AnalysisService {
    pub fn new(llm: Arc<LlmService>) -> Self {
        Self { llm }
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_enabled()
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AppError> {
        match request {
            AnalysisRequest::Aggregate(instruments) => {
                Ok(AnalysisResponse::Summary(self.aggregate_summary(&instruments).await))
            }
            AnalysisRequest::DeepDive(instrument) => {
                Ok(AnalysisResponse::Report(self.deep_dive(&instrument).await?))
            }
        }
    }

    /// Two-sentence market sentiment summary across `instruments`. Never fails.
    pub async fn aggregate_summary(&self, instruments: &[Instrument]) -> String {
        if !self.llm.is_enabled() {
            warn!("Aggregate summary requested without an API key");
            return MISSING_KEY_PLACEHOLDER.to_string();
        }

        if instruments.is_empty() {
            return NO_MARKET_DATA.to_string();
        }

        info!("Generating market summary for {} instruments", instruments.len());
        let prompt = build_summary_prompt(instruments);

        match self.llm.generate(GenerationRequest::text(prompt)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Market summary came back empty");
                SUMMARY_UNAVAILABLE.to_string()
            }
            Err(e) => {
                error!("Market summary failed: {}", e);
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    /// Structured report for one instrument.
    ///
    /// The returned symbol is always `instrument.symbol`.
    pub async fn deep_dive(&self, instrument: &Instrument) -> Result<AnalysisReport, AppError> {
        if !self.llm.is_enabled() {
            warn!("Deep dive for {} requested without an API key", instrument.symbol);
            return Err(AppError::Llm(LlmError::Disabled));
        }

        info!("Generating deep dive for {}", instrument.symbol);
        let request = GenerationRequest::structured(build_deep_dive_prompt(instrument), report_schema());

        let body = self.llm.generate(request).await.map_err(|e| {
            error!("Deep dive for {} failed: {}", instrument.symbol, e);
            AppError::Llm(e)
        })?;

        parse_report_body(&body)
            .into_report(&instrument.symbol)
            .ok_or_else(|| {
                warn!("Deep dive for {} returned an incomplete report", instrument.symbol);
                AppError::NoAnalysis {
                    symbol: instrument.symbol.clone(),
                }
            })
    }
}

fn build_summary_prompt(instruments: &[Instrument]) -> String {
    let snapshot = instruments
        .iter()
        .map(|i| format!("{}: ${} ({}%)", i.symbol, i.price, i.change_percent))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a senior financial analyst. Based on this market snapshot: [{}], provide a 2-sentence market sentiment summary. Be professional and concise.",
        snapshot
    )
}

fn build_deep_dive_prompt(instrument: &Instrument) -> String {
    let pe_ratio = instrument
        .pe_ratio
        .map(|pe| pe.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        r#"Analyze {} ({}).
Current Price: ${}, Change: {}%, PE Ratio: {}, Sector: {}.

Provide a JSON response with the following structure:
{{
  "summary": "A 2-sentence executive summary of the stock's current standing.",
  "rating": "Buy" | "Hold" | "Sell",
  "riskLevel": "Low" | "Medium" | "High",
  "keyPoints": ["Point 1", "Point 2", "Point 3"]
}}"#,
        instrument.name,
        instrument.symbol,
        instrument.price,
        instrument.change_percent,
        pe_ratio,
        instrument.sector
    )
}

/// Shape the model is asked to emit for a deep dive.
pub fn report_schema() -> ResponseSchema {
    ResponseSchema::object([
        ("summary", ResponseSchema::string()),
        ("rating", ResponseSchema::string_enum(Rating::ALL.iter().map(Rating::as_str))),
        ("riskLevel", ResponseSchema::string_enum(RiskLevel::ALL.iter().map(RiskLevel::as_str))),
        ("keyPoints", ResponseSchema::array(ResponseSchema::string())),
    ])
}

/// Recovers a draft from a deep-dive body. Never fails: an empty body reads
/// as `{}` and unparseable JSON yields an empty draft.
pub fn parse_report_body(body: &str) -> ReportDraft {
    let body = strip_code_fence(body);
    let body = if body.is_empty() { "{}" } else { body };

    let parsed = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Deep dive body is not valid JSON ({}), treating as empty", e);
            return ReportDraft::default();
        }
    };

    let summary = parsed["summary"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let rating = parsed["rating"].as_str().and_then(|s| s.parse().ok());
    let risk_level = parsed["riskLevel"].as_str().and_then(|s| s.parse().ok());

    let key_points = parsed["keyPoints"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    ReportDraft {
        summary,
        rating,
        risk_level,
        key_points,
    }
}

fn strip_code_fence(body: &str) -> &str {
    let trimmed = body.trim();
    let fence = match Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$") {
        Ok(re) => re,
        Err(_) => return trimmed,
    };
    fence
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}
