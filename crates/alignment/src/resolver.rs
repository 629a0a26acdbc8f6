//! Nearest-sample lookup on a sorted series.

use dashsub_common::clock::MonoTimeNs;

use crate::series::{Sample, Series};

/// Index of the sample closest in time to `query_ns`.
///
/// Queries before the first sample resolve to the first, queries after the
/// last resolve to the last. On an exact tie the earlier sample wins.
/// Returns `None` only for an empty series. O(log n).
pub fn nearest_index<T>(series: &Series<T>, query_ns: MonoTimeNs) -> Option<usize> {
    let samples = series.samples();
    if samples.is_empty() {
        return None;
    }

    // Insertion point: first sample not earlier than the query.
    let j = samples.partition_point(|s| s.mono_time_ns < query_ns);
    if j == 0 {
        return Some(0);
    }
    if j >= samples.len() {
        return Some(samples.len() - 1);
    }

    let after = samples[j].mono_time_ns.abs_diff(query_ns);
    let before = samples[j - 1].mono_time_ns.abs_diff(query_ns);
    if after < before {
        Some(j)
    } else {
        Some(j - 1)
    }
}

/// The sample closest in time to `query_ns`. See [`nearest_index`].
pub fn nearest<T>(series: &Series<T>, query_ns: MonoTimeNs) -> Option<&Sample<T>> {
    nearest_index(series, query_ns).map(|i| &series.samples()[i])
}
