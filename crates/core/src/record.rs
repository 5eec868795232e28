//! Scraped record types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flat attribute map built from a link node and its first image descendant.
pub type AttributeRecord = BTreeMap<String, String>;

/// One of the three equipment regions of a character summary page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Left,
    Right,
    Bottom,
}

impl Zone {
    /// All zones in output order.
    pub const ALL: [Zone; 3] = [Zone::Left, Zone::Right, Zone::Bottom];

    /// Selector matching the item links of this zone on the armory page.
    pub fn default_selector(self) -> &'static str {
        match self {
            Zone::Left => ".item-left div div a",
            Zone::Right => ".item-right div div a",
            Zone::Bottom => ".item-bottom div div a",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Left => "left",
            Zone::Right => "right",
            Zone::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Structured data extracted from one character page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub left: Vec<AttributeRecord>,
    pub right: Vec<AttributeRecord>,
    pub bottom: Vec<AttributeRecord>,
    /// When extraction completed.
    pub scraped_at: DateTime<Utc>,
}

impl ScrapeResult {
    /// Total number of records across all zones.
    pub fn record_count(&self) -> usize {
        self.left.len() + self.right.len() + self.bottom.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> AttributeRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_serialize_uses_scraped_at_camel_case() {
        let result = ScrapeResult {
            left: vec![record(&[("href", "/item/1"), ("icon", "ring.png")])],
            right: vec![],
            bottom: vec![],
            scraped_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z").unwrap().with_timezone(&Utc),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["left"][0]["href"], "/item/1");
        assert_eq!(json["left"][0]["icon"], "ring.png");
        assert_eq!(json["right"], serde_json::json!([]));
        assert_eq!(json["scrapedAt"], "2026-01-02T03:04:05Z");
        assert!(json.get("scraped_at").is_none());
    }

    #[test]
    fn test_record_count() {
        let result = ScrapeResult {
            left: vec![record(&[("a", "1")])],
            right: vec![record(&[("b", "2")]), record(&[("c", "3")])],
            bottom: vec![],
            scraped_at: Utc::now(),
        };
        assert_eq!(result.record_count(), 3);
    }

    #[test]
    fn test_zone_selectors() {
        assert_eq!(Zone::Left.default_selector(), ".item-left div div a");
        assert_eq!(Zone::Bottom.to_string(), "bottom");
    }
}
