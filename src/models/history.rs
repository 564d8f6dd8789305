//! Search history item.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryItem {
    pub term: String,
    /// Human-readable local time; not suitable for sorting
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
}
