//! Bounded nearby-date search for single-date queries.
//!
//! There is no trading calendar here. An empty result is taken to mean "not a
//! trading day" and the next candidate date is tried, at most
//! [`MAX_FALLBACK_OFFSET`] days away from the anchor.

use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use crate::{KfcError, ValidationError};

pub const MAX_FALLBACK_OFFSET: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    /// Earlier dates first: anchor - 1, anchor - 2, ...
    Backward,
    /// Later dates: anchor + 1, anchor + 2, ...
    Forward,
}

impl FromStr for SearchDirection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "backward" | "prev" | "earlier" => Ok(Self::Backward),
            "forward" | "next" | "later" => Ok(Self::Forward),
            _ => Err(ValidationError::InvalidValue {
                field: "search direction",
                value: value.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFallbackQuery {
    pub anchor: Date,
    pub direction: SearchDirection,
    pub max_offset: u8,
}

/// Records of the date that answered the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved<T> {
    pub requested: Date,
    pub date: Date,
    pub records: Vec<T>,
}

impl<T> Resolved<T> {
    pub fn is_substituted(&self) -> bool {
        self.requested != self.date
    }
}

impl DateFallbackQuery {
    pub const fn new(anchor: Date, direction: SearchDirection) -> Self {
        Self {
            anchor,
            direction,
            max_offset: MAX_FALLBACK_OFFSET,
        }
    }

    /// Candidate dates after the anchor, nearest first. Stops early at the
    /// edge of the representable calendar.
    pub fn candidates(&self) -> Vec<Date> {
        let mut dates = Vec::with_capacity(usize::from(self.max_offset));
        let mut current = self.anchor;
        for _ in 0..self.max_offset {
            let next = match self.direction {
                SearchDirection::Backward => current.previous_day(),
                SearchDirection::Forward => current.next_day(),
            };
            let Some(next) = next else {
                break;
            };
            dates.push(next);
            current = next;
        }
        dates
    }

    /// Queries the anchor, then each candidate, until one returns records.
    /// When every attempt is empty the anchor's empty result is returned.
    pub async fn resolve<T, F, Fut>(&self, mut fetch: F) -> Result<Resolved<T>, KfcError>
    where
        F: FnMut(Date) -> Fut,
        Fut: Future<Output = Result<Vec<T>, KfcError>>,
    {
        let anchor_records = fetch(self.anchor).await?;
        if !anchor_records.is_empty() {
            return Ok(Resolved {
                requested: self.anchor,
                date: self.anchor,
                records: anchor_records,
            });
        }

        for date in self.candidates() {
            let records = fetch(date).await?;
            if !records.is_empty() {
                debug!(requested = %self.anchor, resolved = %date, "substituted nearby date");
                return Ok(Resolved {
                    requested: self.anchor,
                    date,
                    records,
                });
            }
        }

        debug!(requested = %self.anchor, max_offset = self.max_offset, "no data near requested date");
        Ok(Resolved {
            requested: self.anchor,
            date: self.anchor,
            records: anchor_records,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::macros::date;

    use super::*;

    #[tokio::test]
    async fn backward_search_returns_first_non_empty_offset() {
        let anchor = date!(2024 - 01 - 07);
        let with_data = date!(2024 - 01 - 04);
        let queried = Mutex::new(Vec::new());

        let resolved = DateFallbackQuery::new(anchor, SearchDirection::Backward)
            .resolve(|date| {
                queried.lock().expect("lock").push(date);
                async move { Ok(if date == with_data { vec![date] } else { Vec::new() }) }
            })
            .await
            .expect("resolves");

        assert_eq!(resolved.date, with_data);
        assert_eq!(resolved.records, vec![with_data]);
        assert!(resolved.is_substituted());
        assert_eq!(queried.lock().expect("lock").len(), 4);
    }

    #[tokio::test]
    async fn exhausted_search_returns_anchor_empty_result() {
        let anchor = date!(2024 - 01 - 01);
        let mut calls = 0;

        let resolved = DateFallbackQuery::new(anchor, SearchDirection::Forward)
            .resolve(|_| {
                calls += 1;
                async { Ok(Vec::<u8>::new()) }
            })
            .await
            .expect("resolves");

        assert_eq!(resolved.date, anchor);
        assert!(resolved.records.is_empty());
        assert_eq!(calls, 1 + usize::from(MAX_FALLBACK_OFFSET));
    }

    #[tokio::test]
    async fn non_empty_anchor_issues_a_single_query() {
        let mut calls = 0;

        let resolved = DateFallbackQuery::new(date!(2024 - 01 - 02), SearchDirection::Backward)
            .resolve(|date| {
                calls += 1;
                async move { Ok(vec![date]) }
            })
            .await
            .expect("resolves");

        assert_eq!(calls, 1);
        assert!(!resolved.is_substituted());
    }

    #[test]
    fn candidates_stop_at_calendar_edge() {
        let query = DateFallbackQuery::new(Date::MIN, SearchDirection::Backward);
        assert!(query.candidates().is_empty());

        let query = DateFallbackQuery::new(date!(2024 - 03 - 01), SearchDirection::Backward);
        assert_eq!(query.candidates()[0], date!(2024 - 02 - 29));
        assert_eq!(query.candidates().len(), 7);
    }
}
