#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Compliance aggregate types returned by the dashboard API.
//!
//! Field names follow the dashboard's JSON contract (Portuguese keys such
//! as `total_amostras` and `percentual_conforme`), so the Rust names are
//! mapped with `serde(rename)`.
//!
//! The top-level [`OverallStats`] reports a parameter with no samples as
//! `0`, while the per-group summaries report it as `null`
//! ([`ParameterBreakdown`]). Both conventions are part of the contract.

use serde::{Deserialize, Serialize};
use sisagua_sample_models::Parameter;

/// Portuguese month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Returns the Portuguese name of a 1-indexed month.
#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_NAMES.get(index).copied()
}

/// Per-parameter compliance percentages where an empty subset is `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterCompliance {
    /// Escherichia coli.
    #[serde(rename = "conformidade_ecoli")]
    pub ecoli: f64,
    /// Total coliforms.
    #[serde(rename = "conformidade_coliformes")]
    pub coliformes: f64,
    /// Turbidity.
    #[serde(rename = "conformidade_turbidez")]
    pub turbidez: f64,
    /// Free residual chlorine.
    #[serde(rename = "conformidade_cloro")]
    pub cloro: f64,
    /// Fluoride.
    #[serde(rename = "conformidade_fluoreto")]
    pub fluoreto: f64,
}

impl ParameterCompliance {
    /// Builds the percentages by calling `pct` once per parameter.
    #[must_use]
    pub fn from_fn(mut pct: impl FnMut(Parameter) -> f64) -> Self {
        Self {
            ecoli: pct(Parameter::EscherichiaColi),
            coliformes: pct(Parameter::ColiformesTotais),
            turbidez: pct(Parameter::Turbidez),
            cloro: pct(Parameter::CloroResidualLivre),
            fluoreto: pct(Parameter::Fluoreto),
        }
    }

    /// Returns the percentage for `parameter`.
    #[must_use]
    pub const fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::EscherichiaColi => self.ecoli,
            Parameter::ColiformesTotais => self.coliformes,
            Parameter::Turbidez => self.turbidez,
            Parameter::CloroResidualLivre => self.cloro,
            Parameter::Fluoreto => self.fluoreto,
        }
    }
}

/// Per-parameter compliance percentages where an empty subset is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterBreakdown {
    /// Escherichia coli.
    #[serde(rename = "percentual_ecoli")]
    pub ecoli: Option<f64>,
    /// Total coliforms.
    #[serde(rename = "percentual_coliformes")]
    pub coliformes: Option<f64>,
    /// Turbidity.
    #[serde(rename = "percentual_turbidez")]
    pub turbidez: Option<f64>,
    /// Free residual chlorine.
    #[serde(rename = "percentual_cloro")]
    pub cloro: Option<f64>,
    /// Fluoride.
    #[serde(rename = "percentual_fluoreto")]
    pub fluoreto: Option<f64>,
}

impl ParameterBreakdown {
    /// Builds the percentages by calling `pct` once per parameter.
    #[must_use]
    pub fn from_fn(mut pct: impl FnMut(Parameter) -> Option<f64>) -> Self {
        Self {
            ecoli: pct(Parameter::EscherichiaColi),
            coliformes: pct(Parameter::ColiformesTotais),
            turbidez: pct(Parameter::Turbidez),
            cloro: pct(Parameter::CloroResidualLivre),
            fluoreto: pct(Parameter::Fluoreto),
        }
    }
}

/// Dashboard-wide statistics over a filtered record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    /// Number of samples.
    #[serde(rename = "total_amostras")]
    pub total_samples: u64,
    /// Number of distinct non-null neighborhoods.
    #[serde(rename = "bairros_unicos")]
    pub unique_neighborhoods: u64,
    /// Percentage of compliant samples, `0` when there are none.
    #[serde(rename = "conformidade_geral")]
    pub compliance_pct: f64,
    /// `100 - compliance_pct`, so `100` when there are no samples.
    #[serde(rename = "nao_conformidade_geral")]
    pub non_compliance_pct: f64,
    /// Per-parameter compliance.
    #[serde(flatten)]
    pub parameters: ParameterCompliance,
}

/// Compliance summary for one neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodSummary {
    /// Neighborhood name; `None` groups samples without one.
    #[serde(rename = "bairro")]
    pub neighborhood: Option<String>,
    /// Number of samples.
    #[serde(rename = "total_analises")]
    pub total_samples: u64,
    /// Percentage of compliant samples.
    #[serde(rename = "percentual_conforme")]
    pub compliance_pct: f64,
    /// Per-parameter compliance.
    #[serde(flatten)]
    pub parameters: ParameterBreakdown,
}

/// Compliance summary for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// Month number (1-12).
    #[serde(rename = "mes")]
    pub month: u32,
    /// Portuguese month name.
    #[serde(rename = "nome_mes")]
    pub month_name: String,
    /// Number of samples.
    #[serde(rename = "total_amostras")]
    pub total_samples: u64,
    /// Percentage of compliant samples.
    #[serde(rename = "percentual_conforme")]
    pub compliance_pct: f64,
    /// Per-parameter compliance.
    #[serde(flatten)]
    pub parameters: ParameterBreakdown,
}

/// Compliance summary for one collection point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPointSummary {
    /// Collection point name; `None` groups samples without one.
    #[serde(rename = "ponto_de_coleta")]
    pub collection_point: Option<String>,
    /// Number of samples.
    #[serde(rename = "total_analises")]
    pub total_samples: u64,
    /// Percentage of compliant samples.
    #[serde(rename = "percentual_conforme")]
    pub compliance_pct: f64,
    /// Per-parameter compliance.
    #[serde(flatten)]
    pub parameters: ParameterBreakdown,
}
