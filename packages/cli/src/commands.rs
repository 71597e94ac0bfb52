//! Offline subcommands.
//!
//! Unlike the HTTP handlers these propagate errors: a missing CSV or a bad
//! reference file should fail the command, not print zeroes.

use std::fmt::Write as _;
use std::path::PathBuf;

use sisagua_analytics::{by_collection_point, by_month, by_neighborhood, summarize};
use sisagua_compliance::{ComplianceError, ReferenceTable};
use sisagua_loader::apply_filters;
use sisagua_sample_models::{FilterCriteria, RecordSet};
use sisagua_server::ServerConfig;

use crate::GroupBy;

fn load(
    config: &ServerConfig,
    criteria: &FilterCriteria,
) -> Result<RecordSet, Box<dyn std::error::Error>> {
    let records = config.csv_source().read()?;
    let total = records.len();
    let records = apply_filters(records, criteria);
    log::info!("{} of {total} samples match the filters", records.len());
    Ok(records)
}

/// Renders the requested aggregate as pretty JSON.
pub fn summary(
    config: &ServerConfig,
    criteria: &FilterCriteria,
    by: Option<GroupBy>,
) -> Result<String, Box<dyn std::error::Error>> {
    let table = ReferenceTable::load(config.references_path.as_deref())?;
    let records = load(config, criteria)?;

    let json = match by {
        None => serde_json::to_string_pretty(&summarize(&records, &table))?,
        Some(GroupBy::Bairro) => serde_json::to_string_pretty(&by_neighborhood(&records, &table))?,
        Some(GroupBy::Mes) => serde_json::to_string_pretty(&by_month(&records, &table))?,
        Some(GroupBy::Ponto) => {
            serde_json::to_string_pretty(&by_collection_point(&records, &table))?
        }
    };
    Ok(json)
}

/// Writes the collection map and returns its path.
pub fn map(
    config: &ServerConfig,
    criteria: &FilterCriteria,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let table = ReferenceTable::load(config.references_path.as_deref())?;
    let records = load(config, criteria)?;
    let path = sisagua_map::write_map(
        &config.static_dir,
        &records,
        &table,
        Some(config.geojson_path.as_path()),
    )?;
    Ok(path)
}

/// Lists the active reference rules, one per line.
pub fn references(config: &ServerConfig) -> Result<String, ComplianceError> {
    let table = ReferenceTable::load(config.references_path.as_deref())?;

    let mut out = format!("{}\n", table.name);
    for (parameter, rule) in &table.parameters {
        let _ = writeln!(out, "  {parameter}: {}", rule.describe());
    }
    Ok(out)
}
