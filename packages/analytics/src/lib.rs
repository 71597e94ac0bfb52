#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Compliance aggregation over filtered sample sets.
//!
//! Each public function evaluates every record once against the
//! [`ReferenceTable`] and reduces the results into one of the dashboard
//! views. All functions are pure and total: a record that cannot be
//! evaluated counts as non-compliant, and an empty input yields zeroed or
//! empty output.

mod groups;

pub use groups::{by_collection_point, by_month, by_neighborhood};

use std::collections::BTreeSet;

use sisagua_analytics_models::{OverallStats, ParameterCompliance};
use sisagua_compliance::ReferenceTable;
use sisagua_sample_models::{Parameter, SampleRecord};

/// A record paired with its compliance verdict.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Evaluated<'a> {
    pub record: &'a SampleRecord,
    pub compliant: bool,
}

/// Evaluates every record once.
pub(crate) fn evaluate_all<'a>(
    records: &'a [SampleRecord],
    table: &ReferenceTable,
) -> Vec<Evaluated<'a>> {
    records
        .iter()
        .map(|record| Evaluated {
            record,
            compliant: table.evaluate(record),
        })
        .collect()
}

/// Percentage of compliant entries, or `None` when there are none.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn compliance_pct<'a, 'r: 'a>(
    entries: impl IntoIterator<Item = &'a Evaluated<'r>>,
) -> Option<f64> {
    let (total, compliant) = entries
        .into_iter()
        .fold((0_u64, 0_u64), |(total, compliant), entry| {
            (total + 1, compliant + u64::from(entry.compliant))
        });
    (total > 0).then(|| 100.0 * compliant as f64 / total as f64)
}

/// Compliance percentage restricted to records measuring `parameter`.
pub(crate) fn parameter_pct(entries: &[&Evaluated<'_>], parameter: Parameter) -> Option<f64> {
    compliance_pct(
        entries
            .iter()
            .copied()
            .filter(|entry| entry.record.measures(parameter)),
    )
}

/// Computes the dashboard-wide statistics.
///
/// With no records the compliance is `0` and the non-compliance `100`;
/// a parameter without samples reports `0`.
#[must_use]
pub fn summarize(records: &[SampleRecord], table: &ReferenceTable) -> OverallStats {
    let evaluated = evaluate_all(records, table);
    let entries: Vec<&Evaluated<'_>> = evaluated.iter().collect();

    let unique_neighborhoods = records
        .iter()
        .filter_map(|record| record.neighborhood.as_deref())
        .collect::<BTreeSet<_>>()
        .len() as u64;

    let compliance_pct = compliance_pct(entries.iter().copied()).unwrap_or(0.0);

    let stats = OverallStats {
        total_samples: records.len() as u64,
        unique_neighborhoods,
        compliance_pct,
        non_compliance_pct: 100.0 - compliance_pct,
        parameters: ParameterCompliance::from_fn(|parameter| {
            parameter_pct(&entries, parameter).unwrap_or(0.0)
        }),
    };

    log::debug!(
        "Summarized {} samples: {:.1}% compliant",
        stats.total_samples,
        stats.compliance_pct
    );

    stats
}

#[cfg(test)]
pub(crate) mod test_support {
    use sisagua_sample_models::SampleRecord;

    pub fn sample(parameter: &str, result: Option<&str>, numeric: Option<f64>) -> SampleRecord {
        SampleRecord {
            parameter: Some(parameter.to_string()),
            result: result.map(str::to_string),
            numeric_result: numeric,
            ..SampleRecord::default()
        }
    }

    pub fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{assert_close, sample};
    use super::*;

    #[test]
    fn empty_set_reports_zero_compliance_and_full_non_compliance() {
        let stats = summarize(&[], &ReferenceTable::portaria_888());
        assert_eq!(stats.total_samples, 0);
        assert_eq!(stats.unique_neighborhoods, 0);
        assert_close(stats.compliance_pct, 0.0);
        assert_close(stats.non_compliance_pct, 100.0);
        for parameter in Parameter::all() {
            assert_close(stats.parameters.get(*parameter), 0.0);
        }
    }

    #[test]
    fn mixed_parameters_scenario() {
        let records = vec![
            sample("Escherichia coli", Some("AUSENTE"), None),
            sample("Turbidez (uT)", None, Some(6.0)),
        ];
        let stats = summarize(&records, &ReferenceTable::portaria_888());
        assert_eq!(stats.total_samples, 2);
        assert_close(stats.compliance_pct, 50.0);
        assert_close(stats.non_compliance_pct, 50.0);
        assert_close(stats.parameters.ecoli, 100.0);
        assert_close(stats.parameters.turbidez, 0.0);
        assert_close(stats.parameters.cloro, 0.0);
    }

    #[test]
    fn unknown_parameters_count_against_compliance() {
        let records = vec![
            sample("Escherichia coli", Some("AUSENTE"), None),
            sample("pH", Some("7,0"), None),
            SampleRecord::default(),
        ];
        let stats = summarize(&records, &ReferenceTable::portaria_888());
        assert_eq!(stats.total_samples, 3);
        assert_close(stats.compliance_pct, 100.0 / 3.0);
    }

    #[test]
    fn counts_distinct_non_null_neighborhoods() {
        let mut records = vec![
            sample("Turbidez (uT)", None, Some(1.0)),
            sample("Turbidez (uT)", None, Some(1.0)),
            sample("Turbidez (uT)", None, Some(1.0)),
            sample("Turbidez (uT)", None, Some(1.0)),
        ];
        records[0].neighborhood = Some("BARRA".to_string());
        records[1].neighborhood = Some("BARRA".to_string());
        records[2].neighborhood = Some("ONDINA".to_string());

        let stats = summarize(&records, &ReferenceTable::portaria_888());
        assert_eq!(stats.unique_neighborhoods, 2);
    }
}
