use chrono::NaiveDate;
use serde::Serialize;

// One day of a synthetic price series. Serialized in the shape chart widgets
// expect; the calendar date is not part of that shape, so there is no
// Deserialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    #[serde(skip)]
    pub date: NaiveDate,
    #[serde(rename = "date")]
    pub label: String,
    pub price: f64,
    #[serde(rename = "uv")]
    pub volume_proxy: u32,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64, volume_proxy: u32) -> Self {
        Self {
            date,
            label: date.format("%b %-d").to_string(),
            price,
            volume_proxy,
        }
    }
}

/// Chronological series of daily points for one symbol, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_short_month_and_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 8).unwrap();
        let point = PricePoint::new(date, 101.25, 1500);
        assert_eq!(point.label, "Oct 8");
    }

    #[test]
    fn test_serializes_chart_shape() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let json = serde_json::to_value(PricePoint::new(date, 99.5, 2000)).unwrap();
        assert_eq!(json["date"], "Mar 14");
        assert_eq!(json["price"], 99.5);
        assert_eq!(json["uv"], 2000);
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_series_serializes_points_in_order() {
        let start = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        let series = TimeSeries {
            symbol: "AAPL".to_string(),
            points: vec![
                PricePoint::new(start, 170.0, 1200),
                PricePoint::new(start.succ_opt().unwrap(), 171.5, 1800),
            ],
        };

        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["symbol"], "AAPL");
        let labels: Vec<&str> = json["points"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["date"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Sep 30", "Oct 1"]);
    }
}
