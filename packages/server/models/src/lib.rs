#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the SISAGUA dashboard server.
//!
//! Field names follow the dashboard's Portuguese wire contract (`ano`,
//! `mes`, `ultima_atualizacao`, ...). The aggregate payloads themselves
//! live in `sisagua_analytics_models`.

use serde::{Deserialize, Serialize};
use sisagua_analytics_models::OverallStats;
use sisagua_sample_models::{FilterCriteria, FilterError};

/// Path under which the generated map is served.
pub const MAP_PATH: &str = "/static/mapa_coletas.html";

/// A filter value sent in a JSON body: the dashboard posts years and
/// months either as numbers or as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// An integral JSON number.
    Integer(i64),
    /// A fractional JSON number.
    Float(f64),
    /// A JSON string, including `"todos"`.
    Text(String),
}

impl FilterValue {
    /// The value as the text the filter parser expects.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

/// Filter query string of the `GET` aggregate endpoints.
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    /// Year, or `"todos"`.
    pub ano: Option<String>,
    /// Month number, or `"todos"`.
    pub mes: Option<String>,
    /// Neighborhood name, or `"todos"`.
    pub bairro: Option<String>,
    /// Parameter name, or `"todos"`.
    pub parametro: Option<String>,
}

impl FilterQuery {
    /// Builds the query from decoded key/value pairs. A repeated key keeps
    /// its first value; unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "ano" => &mut query.ano,
                "mes" => &mut query.mes,
                "bairro" => &mut query.bairro,
                "parametro" => &mut query.parametro,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// Converts the query into filter criteria.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if `ano` or `mes` is not an integer.
    pub fn to_criteria(&self) -> Result<FilterCriteria, FilterError> {
        FilterCriteria::parse(
            self.ano.as_deref(),
            self.mes.as_deref(),
            self.bairro.as_deref(),
            self.parametro.as_deref(),
        )
    }
}

/// JSON body of `POST /api/filtrar_dados`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    /// Year, or `"todos"`.
    pub ano: Option<FilterValue>,
    /// Month number, or `"todos"`.
    pub mes: Option<FilterValue>,
    /// Neighborhood name, or `"todos"`.
    pub bairro: Option<FilterValue>,
    /// Parameter name, or `"todos"`.
    pub parametro: Option<FilterValue>,
}

impl FilterParams {
    /// Converts the body into filter criteria.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if `ano` or `mes` is not an integer.
    pub fn to_criteria(&self) -> Result<FilterCriteria, FilterError> {
        let text = |value: &Option<FilterValue>| value.as_ref().map(FilterValue::as_text);
        FilterCriteria::parse(
            text(&self.ano).as_deref(),
            text(&self.mes).as_deref(),
            text(&self.bairro).as_deref(),
            text(&self.parametro).as_deref(),
        )
    }
}

/// Outcome of the map regeneration that accompanies a filter request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStatus {
    /// The map reflects the filtered samples.
    Success,
    /// Generation failed; the map may show an error page.
    Error,
}

impl From<bool> for MapStatus {
    fn from(generated: bool) -> Self {
        if generated { Self::Success } else { Self::Error }
    }
}

/// Response of `POST /api/filtrar_dados`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResponse {
    /// Statistics over the filtered samples.
    #[serde(flatten)]
    pub stats: OverallStats,
    /// Map regeneration outcome.
    pub map_status: MapStatus,
    /// Where the dashboard should load the map from.
    pub map_path: String,
    /// Set when the request could not be processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FilterResponse {
    /// Successful response carrying `stats`.
    #[must_use]
    pub fn new(stats: OverallStats, map_status: MapStatus) -> Self {
        Self {
            stats,
            map_status,
            map_path: MAP_PATH.to_string(),
            error: None,
        }
    }

    /// Degraded response: zeroed statistics and an error message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stats: OverallStats::default(),
            map_status: MapStatus::Error,
            map_path: MAP_PATH.to_string(),
            error: Some(message.into()),
        }
    }
}

/// Response of `POST /atualizar_dados`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Always `"success"`.
    pub status: String,
    /// Human-readable acknowledgement.
    pub message: String,
    /// Acknowledgement time, `%d/%m/%Y %H:%M`.
    pub ultima_atualizacao: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_accepts_numbers_and_strings() {
        let params: FilterParams =
            serde_json::from_str(r#"{ "ano": 2023, "mes": "3", "bairro": "todos" }"#).unwrap();
        let criteria = params.to_criteria().unwrap();
        assert_eq!(criteria.year, Some(2023));
        assert_eq!(criteria.month, Some(3));
        assert_eq!(criteria.neighborhood, None);
        assert_eq!(criteria.parameter, None);
    }

    #[test]
    fn integral_floats_are_accepted() {
        let params: FilterParams = serde_json::from_str(r#"{ "ano": 2023.0 }"#).unwrap();
        assert_eq!(params.to_criteria().unwrap().year, Some(2023));
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        let params: FilterParams = serde_json::from_str(r#"{ "ano": "abc" }"#).unwrap();
        assert!(matches!(
            params.to_criteria(),
            Err(FilterError::InvalidYear { .. })
        ));
    }

    #[test]
    fn empty_body_is_unfiltered() {
        let params: FilterParams = serde_json::from_str("{}").unwrap();
        assert!(params.to_criteria().unwrap().is_unfiltered());
    }

    #[test]
    fn repeated_query_keys_keep_first_value() {
        let pairs = [("ano", "2023"), ("ano", "2022"), ("cor", "azul"), ("bairro", "BARRA")]
            .map(|(key, value)| (key.to_string(), value.to_string()));
        let query = FilterQuery::from_pairs(pairs);
        assert_eq!(query.ano.as_deref(), Some("2023"));
        assert_eq!(query.bairro.as_deref(), Some("BARRA"));
        assert_eq!(query.mes, None);
        assert_eq!(query.to_criteria().unwrap().year, Some(2023));
    }

    #[test]
    fn failed_response_flattens_zeroed_stats() {
        let json = serde_json::to_value(FilterResponse::failed("boom")).unwrap();
        assert_eq!(json["total_amostras"], 0);
        assert_eq!(json["conformidade_geral"], 0.0);
        assert_eq!(json["map_status"], "error");
        assert_eq!(json["map_path"], MAP_PATH);
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn successful_response_omits_error() {
        let response = FilterResponse::new(OverallStats::default(), MapStatus::from(true));
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["map_status"], "success");
        assert!(json.get("error").is_none());
    }
}
