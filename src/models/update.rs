//! Daily system update (changelog) model.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Changelog shown at most once per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemUpdate {
    pub version: String,
    pub date: String,
    pub features: Vec<String>,
    /// Whether the overlay should be displayed
    pub show: bool,
}

impl SystemUpdate {
    /// Badge-only update: version and date, no features, no overlay.
    pub fn badge(day: NaiveDate) -> Self {
        Self {
            version: version_for(day),
            date: display_date(day),
            features: Vec::new(),
            show: false,
        }
    }

    pub fn announcement(day: NaiveDate, features: Vec<String>) -> Self {
        Self {
            version: version_for(day),
            date: display_date(day),
            features,
            show: true,
        }
    }
}

/// `v{year}.{month}.{day}` without zero padding.
pub fn version_for(day: NaiveDate) -> String {
    format!("v{}.{}.{}", day.year(), day.month(), day.day())
}

fn display_date(day: NaiveDate) -> String {
    day.format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_padded() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(version_for(day), "v2024.5.1");
        assert_eq!(SystemUpdate::badge(day).date, "01.05.2024");
    }
}
