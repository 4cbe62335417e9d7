//! Per-group baseline normalization.
//!
//! Rows are grouped by (package_name, task_name) and ordered by date inside
//! the group. For each metric the baseline is the earliest present, strictly
//! positive value; every qualifying value in the group is divided by it.
//! Anything else normalizes to absent.

use crate::ingest::Dataset;
use crate::model::{Metric, MetricValues, NormalizedRecord, RunRecord};
use std::collections::HashMap;

/// A value that can take part in ratio arithmetic.
pub(crate) fn qualifies(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Normalize every row of `dataset`. Output order matches input order.
pub fn normalize(dataset: Dataset) -> Vec<NormalizedRecord> {
    let records = dataset.into_records();

    let values = baseline_ratios(&records);
    records
        .into_iter()
        .zip(values)
        .map(|(record, values)| NormalizedRecord {
            identity: record.identity,
            package_name: record.package_name,
            task_name: record.task_name,
            values,
        })
        .collect()
}

fn baseline_ratios(records: &[RunRecord]) -> Vec<MetricValues> {
    let mut groups: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        groups
            .entry((record.package_name.as_str(), record.task_name.as_str()))
            .or_default()
            .push(idx);
    }

    let mut values = vec![MetricValues::default(); records.len()];
    for members in groups.values_mut() {
        // Stable: same-date rows keep discovery order.
        members.sort_by_key(|&idx| records[idx].identity.date);
        for metric in Metric::ALL {
            let baseline = members
                .iter()
                .find_map(|&idx| qualifies(records[idx].metric(metric)));
            let Some(baseline) = baseline else {
                continue;
            };
            for &idx in members.iter() {
                let ratio = qualifies(records[idx].metric(metric)).map(|v| v / baseline);
                values[idx].set(metric, ratio);
            }
        }
    }
    values
}
