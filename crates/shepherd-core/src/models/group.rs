use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Person, Strategy};

/// A small fellowship unit with a leader, location, and role structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct HomeGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub leader: Option<Person>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

impl HomeGroup {
    pub fn leader_name(&self) -> String {
        self.leader
            .as_ref()
            .map(|l| l.full_name())
            .unwrap_or_else(|| "No leader".to_string())
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn strategy_id(&self) -> Option<i64> {
        self.strategy.as_ref().map(|s| s.id)
    }
}

/// A scheduled home-group meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: i64,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    /// ISO-8601 date or date-time
    #[serde(default)]
    pub date: Option<String>,
}

impl Meeting {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    }

    pub fn display_title(&self) -> String {
        match (&self.title, self.parsed_date()) {
            (Some(title), Some(date)) => format!("{} ({})", title, date.format("%b %d, %Y")),
            (Some(title), None) => title.clone(),
            (None, Some(date)) => format!("Meeting on {}", date.format("%b %d, %Y")),
            (None, None) => format!("Meeting #{}", self.id),
        }
    }
}
