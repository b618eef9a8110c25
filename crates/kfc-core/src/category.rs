use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ProviderId;

/// Records whose category label mapped, plus the labels that did not.
///
/// A row with an unknown label is dropped from `records` and its label is
/// appended to `unmapped` (once per dropped row), so
/// `records.len() + unmapped.len()` equals the raw row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorized<T> {
    pub records: Vec<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmapped: Vec<String>,
}

impl<T> Default for Categorized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            unmapped: Vec::new(),
        }
    }
}

impl<T> Categorized<T> {
    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn drop_unmapped(&mut self, provider: ProviderId, endpoint: &str, label: impl Into<String>) {
        let label = label.into();
        warn!(provider = %provider, endpoint, label = %label, "dropping record with unmapped category");
        self.unmapped.push(label);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
