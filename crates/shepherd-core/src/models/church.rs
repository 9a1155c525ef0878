//! Organization-level records: churches, worship services and events.

use serde::{Deserialize, Serialize};

use crate::utils::format_date;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Church {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Church {
    pub fn location_display(&self) -> String {
        match (self.address.as_deref(), self.city.as_deref()) {
            (Some(a), Some(c)) if !a.is_empty() && !c.is_empty() => format!("{}, {}", a, c),
            (Some(a), _) if !a.is_empty() => a.to_string(),
            (_, Some(c)) if !c.is_empty() => c.to_string(),
            _ => "-".to_string(),
        }
    }
}

/// A scheduled worship service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Worship {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub church_id: Option<i64>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Worship {
    pub fn starts_display(&self) -> String {
        self.starts_at
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "TBD".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ChurchEvent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ChurchEvent {
    pub fn date_range_display(&self) -> String {
        let start = self.start_date.as_deref().map(format_date);
        let end = self.end_date.as_deref().map(format_date);
        match (start, end) {
            (Some(s), Some(e)) if s != e => format!("{} - {}", s, e),
            (Some(s), _) => s,
            (None, Some(e)) => format!("until {}", e),
            (None, None) => "TBD".to_string(),
        }
    }
}
