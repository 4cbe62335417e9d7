use crate::model::{Metric, MetricValues, NormalizedRecord, SummaryRow};
use crate::normalize::qualifies;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Exponential of the mean of natural logs. `None` for an empty input.
pub fn geometric_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    Some((log_sum / values.len() as f64).exp())
}

/// One summary row per (julia_version, date) group with at least one
/// qualifying value, ordered by date then version.
pub fn summarize(rows: &[NormalizedRecord]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(NaiveDate, &str), Vec<&NormalizedRecord>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.identity.date, row.identity.julia_version.as_str()))
            .or_default()
            .push(row);
    }

    let mut summary = Vec::with_capacity(groups.len());
    for ((date, julia_version), members) in groups {
        let mut values = MetricValues::default();
        for metric in Metric::ALL {
            let samples: Vec<f64> = members
                .iter()
                .filter_map(|row| qualifies(row.metric(metric)))
                .collect();
            values.set(metric, geometric_mean(&samples));
        }
        if values.is_empty() {
            continue;
        }
        summary.push(SummaryRow {
            julia_version: julia_version.to_string(),
            date,
            runs: members.len(),
            values,
        });
    }
    summary
}
