use std::fmt::Debug;
use std::future::Future;

use time::{Date, Duration};
use tracing::debug;

use crate::KfcError;

/// Ordered concrete partitions that make up an "all" query.
///
/// [`PartitionSet::collect`] runs the single-partition operation once per
/// partition, in order, and concatenates the results without dedup or
/// re-sorting. The first error aborts the remaining partitions.
#[derive(Debug, Clone, Copy)]
pub struct PartitionSet<P: 'static> {
    partitions: &'static [P],
}

impl<P> PartitionSet<P>
where
    P: Copy + Debug + 'static,
{
    pub const fn new(partitions: &'static [P]) -> Self {
        Self { partitions }
    }

    pub const fn partitions(&self) -> &'static [P] {
        self.partitions
    }

    pub async fn collect<T, F, Fut>(&self, mut fetch: F) -> Result<Vec<T>, KfcError>
    where
        F: FnMut(P) -> Fut,
        Fut: Future<Output = Result<Vec<T>, KfcError>>,
    {
        let mut merged = Vec::new();
        for partition in self.partitions.iter().copied() {
            let records = fetch(partition).await?;
            debug!(?partition, count = records.len(), "partition fetched");
            merged.extend(records);
        }
        Ok(merged)
    }
}

/// Splits a date range into consecutive spans no longer than a provider's
/// maximum query window.
///
/// Each span starts the day after the previous one ends. The last span is
/// cut at `to`. [`RangeSplitter::collect`] fetches the spans one after the
/// other and concatenates their results; callers re-sort if they need to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSplitter {
    max_span_days: i64,
}

impl RangeSplitter {
    /// `max_span_days` is the largest `end - start` a single request accepts.
    pub const fn new(max_span_days: i64) -> Self {
        Self { max_span_days }
    }

    /// Inclusive `(start, end)` spans covering `from..=to`. Empty if `from > to`.
    pub fn spans(&self, from: Date, to: Date) -> Vec<(Date, Date)> {
        let step = Duration::days(self.max_span_days.max(0));
        let mut spans = Vec::new();
        let mut start = from;
        while start <= to {
            let end = start.checked_add(step).map_or(to, |end| end.min(to));
            spans.push((start, end));
            match end.next_day() {
                Some(next) => start = next,
                None => break,
            }
        }
        spans
    }

    pub async fn collect<T, F, Fut>(
        &self,
        from: Date,
        to: Date,
        mut fetch: F,
    ) -> Result<Vec<T>, KfcError>
    where
        F: FnMut(Date, Date) -> Fut,
        Fut: Future<Output = Result<Vec<T>, KfcError>>,
    {
        let spans = self.spans(from, to);
        let mut merged = Vec::new();
        for (start, end) in spans.iter().copied() {
            let records = fetch(start, end).await?;
            if spans.len() > 1 {
                debug!(%start, %end, count = records.len(), "span fetched");
            }
            merged.extend(records);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::macros::date;

    use super::*;
    use crate::ProviderId;

    const LETTERS: PartitionSet<char> = PartitionSet::new(&['a', 'b', 'c']);

    #[tokio::test]
    async fn concatenates_in_partition_order_without_dedup() {
        let merged = LETTERS
            .collect(|partition| async move {
                Ok(match partition {
                    'a' => vec!["a1", "shared"],
                    'b' => vec!["shared"],
                    _ => vec!["c1", "c2"],
                })
            })
            .await
            .expect("all partitions succeed");

        assert_eq!(merged, vec!["a1", "shared", "shared", "c1", "c2"]);
    }

    #[tokio::test]
    async fn first_failure_aborts_remaining_partitions() {
        let visited = Mutex::new(Vec::new());

        let result = LETTERS
            .collect(|partition| {
                visited.lock().expect("lock").push(partition);
                async move {
                    if partition == 'b' {
                        Err(KfcError::HttpErrorResponse {
                            provider: ProviderId::Krx,
                            status: 500,
                        })
                    } else {
                        Ok(vec![partition])
                    }
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*visited.lock().expect("lock"), vec!['a', 'b']);
    }

    #[test]
    fn short_range_is_a_single_span() {
        let splitter = RangeSplitter::new(730);

        assert_eq!(
            splitter.spans(date!(2023 - 01 - 01), date!(2024 - 12 - 31)),
            vec![(date!(2023 - 01 - 01), date!(2024 - 12 - 31))]
        );
        assert!(splitter.spans(date!(2024 - 01 - 02), date!(2024 - 01 - 01)).is_empty());
    }

    #[test]
    fn long_range_is_cut_into_contiguous_spans() {
        let splitter = RangeSplitter::new(730);

        let spans = splitter.spans(date!(2020 - 01 - 01), date!(2024 - 06 - 30));

        assert_eq!(
            spans,
            vec![
                (date!(2020 - 01 - 01), date!(2021 - 12 - 31)),
                (date!(2022 - 01 - 01), date!(2024 - 01 - 01)),
                (date!(2024 - 01 - 02), date!(2024 - 06 - 30)),
            ]
        );
    }

    #[tokio::test]
    async fn span_failure_stops_the_remaining_requests() {
        let visited = Mutex::new(Vec::new());

        let result: Result<Vec<Date>, KfcError> = RangeSplitter::new(1)
            .collect(date!(2024 - 01 - 01), date!(2024 - 01 - 06), |start, _end| {
                visited.lock().expect("lock").push(start);
                async move {
                    if start == date!(2024 - 01 - 03) {
                        Err(KfcError::decode(ProviderId::Krx, "broken span"))
                    } else {
                        Ok(vec![start])
                    }
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(
            *visited.lock().expect("lock"),
            vec![date!(2024 - 01 - 01), date!(2024 - 01 - 03)]
        );
    }
}
