#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Regulatory reference table and compliance evaluation.
//!
//! The [`ReferenceTable`] maps a parameter name to the [`ReferenceRule`]
//! its result must satisfy. The default table (Portaria GM/MS 888/2021) is
//! embedded at compile time from `references/portaria_888.toml`; an
//! alternative table can be loaded from a TOML file at startup.
//!
//! Evaluation is fail-closed: a sample whose parameter is unknown, or
//! whose result is missing or unparsable, is non-compliant.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sisagua_sample_models::SampleRecord;

/// Embedded default reference table.
const PORTARIA_888_TOML: &str = include_str!("../references/portaria_888.toml");

/// Errors that can occur while loading a reference table.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    /// I/O error reading a table file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table is not valid TOML or does not match the schema.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A rule is structurally valid but semantically impossible.
    #[error("Invalid rule for '{parameter}': {message}")]
    InvalidRule {
        /// Parameter the rule belongs to.
        parameter: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// The test a parameter's result must pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReferenceRule {
    /// The raw result must equal `sentinel`, ignoring case and surrounding
    /// whitespace.
    Absence {
        /// Expected result, e.g. `"AUSENTE"`.
        sentinel: String,
    },
    /// The numeric result must be at most `max`.
    Maximum {
        /// Inclusive upper bound.
        max: f64,
        /// Unit shown in legends.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    /// The numeric result must lie within `[min, max]`.
    Range {
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
        /// Unit shown in legends.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

impl ReferenceRule {
    /// Whether `record` satisfies this rule.
    #[must_use]
    pub fn is_satisfied_by(&self, record: &SampleRecord) -> bool {
        match self {
            Self::Absence { sentinel } => record
                .result
                .as_deref()
                .is_some_and(|result| result.trim().to_uppercase() == *sentinel),
            Self::Maximum { max, .. } => resolve_numeric(record).is_some_and(|v| v <= *max),
            Self::Range { min, max, .. } => {
                resolve_numeric(record).is_some_and(|v| *min <= v && v <= *max)
            }
        }
    }

    /// Human-readable criterion, e.g. `"≤ 5 uT"` or `"0.2 - 5 mg/L"`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Absence { sentinel } => sentinel.clone(),
            Self::Maximum { max, unit } => with_unit(format!("≤ {max}"), unit.as_deref()),
            Self::Range { min, max, unit } => with_unit(format!("{min} - {max}"), unit.as_deref()),
        }
    }

    fn normalize(&mut self, parameter: &str) -> Result<(), ComplianceError> {
        let invalid = |message: &str| ComplianceError::InvalidRule {
            parameter: parameter.to_string(),
            message: message.to_string(),
        };

        match self {
            Self::Absence { sentinel } => {
                let normalized = sentinel.trim().to_uppercase();
                if normalized.is_empty() {
                    return Err(invalid("sentinel must not be empty"));
                }
                *sentinel = normalized;
            }
            Self::Maximum { max, .. } => {
                if !max.is_finite() {
                    return Err(invalid("max must be finite"));
                }
            }
            Self::Range { min, max, .. } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(invalid("bounds must be finite"));
                }
                if min > max {
                    return Err(invalid("min must not exceed max"));
                }
            }
        }
        Ok(())
    }
}

fn with_unit(criterion: String, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{criterion} {unit}"),
        None => criterion,
    }
}

/// Immutable mapping from parameter name to its compliance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable {
    /// Name of the regulation the table encodes.
    pub name: String,
    /// Rules keyed by exact parameter name.
    pub parameters: BTreeMap<String, ReferenceRule>,
}

impl ReferenceTable {
    /// Returns the embedded Portaria GM/MS 888/2021 table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML fails to parse. Since it is a
    /// compile-time constant, a failure is a development error caught by
    /// the test suite.
    #[must_use]
    pub fn portaria_888() -> Self {
        Self::from_toml_str(PORTARIA_888_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded reference table: {e}"))
    }

    /// Parses and validates a table from TOML.
    ///
    /// Absence sentinels are normalized to trimmed uppercase.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError`] if the TOML is malformed or a rule is
    /// invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ComplianceError> {
        let mut table: Self = toml::from_str(toml_str)?;
        for (parameter, rule) in &mut table.parameters {
            rule.normalize(parameter)?;
        }
        Ok(table)
    }

    /// Loads and validates a table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ComplianceError> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded reference table '{}' with {} rules from {}",
            table.name,
            table.parameters.len(),
            path.display()
        );
        Ok(table)
    }

    /// Loads the table at `path`, or the embedded default when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError`] if a file was given and is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ComplianceError> {
        path.map_or_else(|| Ok(Self::portaria_888()), Self::from_path)
    }

    /// Returns the rule for `parameter`, if one is defined.
    #[must_use]
    pub fn rule(&self, parameter: &str) -> Option<&ReferenceRule> {
        self.parameters.get(parameter)
    }

    /// Decides whether `record` complies with its parameter's rule.
    ///
    /// Unknown or missing parameters are never compliant.
    #[must_use]
    pub fn evaluate(&self, record: &SampleRecord) -> bool {
        let Some(parameter) = record.parameter.as_deref().filter(|p| !p.is_empty()) else {
            return false;
        };
        self.rule(parameter)
            .is_some_and(|rule| rule.is_satisfied_by(record))
    }
}

/// Resolves the numeric value of a sample's result.
///
/// Prefers the pre-parsed `numeric_result`; otherwise parses the raw
/// result, accepting a decimal comma.
#[must_use]
pub fn resolve_numeric(record: &SampleRecord) -> Option<f64> {
    if let Some(value) = record.numeric_result.filter(|v| !v.is_nan()) {
        return Some(value);
    }
    parse_decimal(record.result.as_deref()?)
}

/// Parses a number that may use `,` as its decimal separator.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}
