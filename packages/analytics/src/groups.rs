//! Grouped compliance views: by neighborhood, month, and collection point.
//!
//! Neighborhoods and collection points keep first-occurrence order. Samples
//! without a key form their own `None` group, so group counts always sum to
//! the input size. Months are emitted in calendar order and only when they
//! have at least one sample.

use std::collections::BTreeMap;

use sisagua_analytics_models::{
    CollectionPointSummary, MonthSummary, NeighborhoodSummary, ParameterBreakdown, month_name,
};
use sisagua_compliance::ReferenceTable;
use sisagua_sample_models::SampleRecord;

use crate::{Evaluated, compliance_pct, evaluate_all, parameter_pct};

/// Sample count, overall compliance, and per-parameter breakdown of a group.
struct GroupStats {
    total_samples: u64,
    compliance_pct: f64,
    parameters: ParameterBreakdown,
}

impl GroupStats {
    fn compute(entries: &[&Evaluated<'_>]) -> Self {
        Self {
            total_samples: entries.len() as u64,
            compliance_pct: compliance_pct(entries.iter().copied()).unwrap_or(0.0),
            parameters: ParameterBreakdown::from_fn(|parameter| parameter_pct(entries, parameter)),
        }
    }
}

/// Groups entries by key, preserving the order in which keys first appear.
fn group_by_first_occurrence<'e, 'r, K: Ord + Clone>(
    entries: &'e [Evaluated<'r>],
    key: impl Fn(&SampleRecord) -> K,
) -> Vec<(K, Vec<&'e Evaluated<'r>>)> {
    let mut index: BTreeMap<K, usize> = BTreeMap::new();
    let mut groups: Vec<(K, Vec<&'e Evaluated<'r>>)> = Vec::new();

    for entry in entries {
        let k = key(entry.record);
        if let Some(&i) = index.get(&k) {
            groups[i].1.push(entry);
        } else {
            index.insert(k.clone(), groups.len());
            groups.push((k, vec![entry]));
        }
    }

    groups
}

/// Summarizes compliance per neighborhood.
#[must_use]
pub fn by_neighborhood(
    records: &[SampleRecord],
    table: &ReferenceTable,
) -> Vec<NeighborhoodSummary> {
    let evaluated = evaluate_all(records, table);

    group_by_first_occurrence(&evaluated, |record| record.neighborhood.clone())
        .into_iter()
        .map(|(neighborhood, entries)| {
            let stats = GroupStats::compute(&entries);
            NeighborhoodSummary {
                neighborhood,
                total_samples: stats.total_samples,
                compliance_pct: stats.compliance_pct,
                parameters: stats.parameters,
            }
        })
        .collect()
}

/// Summarizes compliance per calendar month, January through December.
///
/// Samples without a month in `1..=12` are left out.
#[must_use]
pub fn by_month(records: &[SampleRecord], table: &ReferenceTable) -> Vec<MonthSummary> {
    let evaluated = evaluate_all(records, table);

    let mut months: BTreeMap<u32, Vec<&Evaluated<'_>>> = BTreeMap::new();
    for entry in &evaluated {
        if let Some(month) = entry.record.month.filter(|m| (1..=12).contains(m)) {
            months.entry(month).or_default().push(entry);
        }
    }

    months
        .into_iter()
        .filter_map(|(month, entries)| {
            let name = month_name(month)?;
            let stats = GroupStats::compute(&entries);
            Some(MonthSummary {
                month,
                month_name: name.to_string(),
                total_samples: stats.total_samples,
                compliance_pct: stats.compliance_pct,
                parameters: stats.parameters,
            })
        })
        .collect()
}

/// Summarizes compliance per collection point.
#[must_use]
pub fn by_collection_point(
    records: &[SampleRecord],
    table: &ReferenceTable,
) -> Vec<CollectionPointSummary> {
    let evaluated = evaluate_all(records, table);

    group_by_first_occurrence(&evaluated, |record| record.collection_point.clone())
        .into_iter()
        .map(|(collection_point, entries)| {
            let stats = GroupStats::compute(&entries);
            CollectionPointSummary {
                collection_point,
                total_samples: stats.total_samples,
                compliance_pct: stats.compliance_pct,
                parameters: stats.parameters,
            }
        })
        .collect()
}
