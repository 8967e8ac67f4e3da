use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: u32,
    pub title: String,
    pub source: String,
    /// Relative publication time as displayed, e.g. "2h ago".
    pub time: String,
    pub summary: String,
    pub sentiment: Sentiment,
}
