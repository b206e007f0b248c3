mod config;
pub mod builder;
pub mod goals;
pub mod latex;
pub mod manual;
pub mod render;

use log::{debug, info, warn};

use std::collections::{BTreeMap, BTreeSet};

pub use crate::config::*;

// **** Private structures ****

// A statistic whose column has been found in the header.
#[derive(Debug, Clone)]
struct ResolvedStat<'s> {
    spec: &'s StatSpec,
    column: usize,
}

/// Splits the records of a dataset into groups.
///
/// With `Grouping::None`, there is exactly one group (possibly empty). With
/// `Grouping::ByColumn`, there is one group per distinct non-missing key, in
/// key order. The records whose key is missing are left out.
pub fn group_records<'a>(
    dataset: &'a Dataset,
    grouping: &Grouping,
) -> Result<Vec<Group<'a>>, SummaryError> {
    match grouping {
        Grouping::None => Ok(vec![Group {
            key: None,
            records: dataset.records().iter().collect(),
        }]),
        Grouping::ByColumn(pattern) => {
            let col = dataset.require_column(pattern)?;
            debug!(
                "group_records: grouping on column {}: {:?}",
                col,
                dataset.columns()[col]
            );
            let mut groups: BTreeMap<String, Vec<&'a Record>> = BTreeMap::new();
            for (idx, record) in dataset.records().iter().enumerate() {
                match record.get(col).as_text() {
                    Some(key) => groups.entry(key).or_default().push(record),
                    None => {
                        warn!("group_records: skipping record {}: missing group key", idx + 1);
                    }
                }
            }
            Ok(groups
                .into_iter()
                .map(|(key, records)| Group {
                    key: Some(key),
                    records,
                })
                .collect())
        }
    }
}

/// Runs the aggregation for the given grouping.
///
/// Arguments:
/// * `dataset` the records to process
/// * `grouping` how to split the records
/// * `stats` the statistics to compute for every group
pub fn summarize(
    dataset: &Dataset,
    grouping: &Grouping,
    stats: &[StatSpec],
) -> Result<Vec<Summary>, SummaryError> {
    let groups = group_records(dataset, grouping)?;
    summarize_groups(dataset, &groups, stats)
}

/// Computes one summary per group, in the same order.
pub fn summarize_groups(
    dataset: &Dataset,
    groups: &[Group],
    stats: &[StatSpec],
) -> Result<Vec<Summary>, SummaryError> {
    info!(
        "Processing {:?} records in {:?} groups, {:?} statistics",
        dataset.len(),
        groups.len(),
        stats.len()
    );
    let resolved = resolve_stats(dataset, stats)?;
    Ok(groups
        .iter()
        .map(|g| summarize_group(g, &resolved))
        .collect())
}

fn resolve_stats<'s>(
    dataset: &Dataset,
    stats: &'s [StatSpec],
) -> Result<Vec<ResolvedStat<'s>>, SummaryError> {
    let mut res = Vec::new();
    for spec in stats.iter() {
        match dataset.find_column(&spec.column) {
            Some(column) => res.push(ResolvedStat { spec, column }),
            None if spec.optional => {
                warn!(
                    "Statistic {:?}: no {} in the input, skipping it",
                    spec.label, spec.column
                );
            }
            None => return Err(SummaryError::MissingColumn(spec.column.to_string())),
        }
    }
    Ok(res)
}

fn summarize_group(group: &Group, stats: &[ResolvedStat]) -> Summary {
    let mut numeric: Vec<NumericSummary> = Vec::new();
    let mut distributions: Vec<Distribution> = Vec::new();
    for rs in stats.iter() {
        match rs.spec.kind {
            StatKind::Mean => numeric.push(numeric_summary(group, rs)),
            StatKind::Distribution => distributions.push(distribution(group, rs)),
        }
    }
    let summary = Summary {
        group: group.key.clone(),
        record_count: group.records.len() as u64,
        numeric,
        distributions,
    };
    debug!("summarize_group: {:?}", summary);
    summary
}

fn numeric_summary(group: &Group, rs: &ResolvedStat) -> NumericSummary {
    let mut values: Vec<f64> = Vec::new();
    let mut missing: u64 = 0;
    let mut non_numeric: u64 = 0;
    for record in group.records.iter() {
        let cell = record.get(rs.column);
        if cell.is_missing() {
            missing += 1;
        } else if let Some(x) = cell.as_number() {
            values.push(x);
        } else {
            non_numeric += 1;
        }
    }
    // Sorting first makes the floating point sum independent of the row order.
    values.sort_by(|a, b| a.total_cmp(b));
    let sum: f64 = values.iter().sum();
    let count = values.len() as u64;
    NumericSummary {
        label: rs.spec.label.clone(),
        unit: rs.spec.unit.clone(),
        count,
        missing,
        non_numeric,
        sum,
        mean: if count > 0 {
            Some(sum / count as f64)
        } else {
            None
        },
        min: values.first().cloned(),
        max: values.last().cloned(),
    }
}

fn distribution(group: &Group, rs: &ResolvedStat) -> Distribution {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut missing: u64 = 0;
    for record in group.records.iter() {
        match record.get(rs.column).as_text() {
            Some(v) => *counts.entry(v).or_insert(0) += 1,
            None => missing += 1,
        }
    }
    Distribution {
        label: rs.spec.label.clone(),
        counts: counts.into_iter().collect(),
        missing,
    }
}

/// The distinct non-missing values of a column, sorted.
pub fn distinct_values(dataset: &Dataset, column: usize) -> Vec<String> {
    let values: BTreeSet<String> = dataset
        .records()
        .iter()
        .filter_map(|r| r.get(column).as_text())
        .collect();
    values.into_iter().collect()
}

/// The first non-missing value of a column, in record order.
pub fn first_value(dataset: &Dataset, column: usize) -> Option<String> {
    dataset
        .records()
        .iter()
        .find_map(|r| r.get(column).as_text())
}
