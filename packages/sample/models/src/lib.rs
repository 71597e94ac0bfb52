#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Water-quality sample types shared across the SISAGUA dashboard.
//!
//! A [`SampleRecord`] is one laboratory measurement as read from the
//! cleaned SISAGUA CSV export. Every field is optional: the export is
//! frequently incomplete and downstream consumers must treat missing
//! data as non-compliant rather than skipping it.

use strum_macros::{AsRefStr, Display, EnumString};

/// Filter value meaning "do not filter on this field".
pub const ALL_FILTER: &str = "todos";

/// The monitored parameters with a named compliance statistic.
///
/// The string form is the exact spelling used in the `parametro` column of
/// the CSV export, so `"Turbidez (uT)".parse::<Parameter>()` round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr)]
pub enum Parameter {
    /// Escherichia coli presence test
    #[strum(serialize = "Escherichia coli")]
    EscherichiaColi,
    /// Total coliforms presence test
    #[strum(serialize = "Coliformes totais")]
    ColiformesTotais,
    /// Turbidity in nephelometric turbidity units
    #[strum(serialize = "Turbidez (uT)")]
    Turbidez,
    /// Free residual chlorine in mg/L
    #[strum(serialize = "Cloro residual livre (mg/L)")]
    CloroResidualLivre,
    /// Fluoride in mg/L
    #[strum(serialize = "Fluoreto (mg/L)")]
    Fluoreto,
}

impl Parameter {
    /// Returns all variants of this enum, in dashboard display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::EscherichiaColi,
            Self::ColiformesTotais,
            Self::Turbidez,
            Self::CloroResidualLivre,
            Self::Fluoreto,
        ]
    }

    /// Short key used in JSON field names (`conformidade_<key>`,
    /// `percentual_<key>`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::EscherichiaColi => "ecoli",
            Self::ColiformesTotais => "coliformes",
            Self::Turbidez => "turbidez",
            Self::CloroResidualLivre => "cloro",
            Self::Fluoreto => "fluoreto",
        }
    }

    /// Abbreviated label for legends and stat cards.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::EscherichiaColi => "E. coli",
            Self::ColiformesTotais => "Coliformes T.",
            Self::Turbidez => "Turbidez",
            Self::CloroResidualLivre => "Cloro",
            Self::Fluoreto => "Fluoreto",
        }
    }
}

/// One water-quality measurement row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleRecord {
    /// Sample identifier.
    pub id: Option<String>,
    /// Neighborhood (`bairro`).
    pub neighborhood: Option<String>,
    /// Collection point name.
    pub collection_point: Option<String>,
    /// Collection date as exported (not normalized).
    pub collection_date: Option<String>,
    /// Parameter name, e.g. `"Turbidez (uT)"`.
    pub parameter: Option<String>,
    /// Raw laboratory result (`"AUSENTE"`, `"0,8"`, ...).
    pub result: Option<String>,
    /// Numeric form of the result, when the export provides one.
    pub numeric_result: Option<f64>,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
    /// Calendar year of collection.
    pub year: Option<i32>,
    /// Calendar month of collection (1-12).
    pub month: Option<u32>,
}

impl SampleRecord {
    /// Whether this sample's parameter column is exactly `parameter`.
    #[must_use]
    pub fn measures(&self, parameter: Parameter) -> bool {
        self.parameter.as_deref() == Some(parameter.as_ref())
    }

    /// Returns `(latitude, longitude)` when both are present and finite.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.filter(|v| v.is_finite())?;
        let lng = self.longitude.filter(|v| v.is_finite())?;
        Some((lat, lng))
    }
}

/// A loaded, filtered set of samples.
pub type RecordSet = Vec<SampleRecord>;

/// Error returned when a filter value cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// The year filter is neither `"todos"` nor an integer.
    #[error("invalid year filter: {value:?}")]
    InvalidYear {
        /// The rejected input.
        value: String,
    },

    /// The month filter is neither `"todos"` nor an integer.
    #[error("invalid month filter: {value:?}")]
    InvalidMonth {
        /// The rejected input.
        value: String,
    },
}

/// Exact-match filter predicates, combined with AND.
///
/// A `None` field means that field is not filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Keep only samples from this year.
    pub year: Option<i32>,
    /// Keep only samples from this month.
    pub month: Option<u32>,
    /// Keep only samples from this neighborhood.
    pub neighborhood: Option<String>,
    /// Keep only samples of this parameter.
    pub parameter: Option<String>,
}

impl FilterCriteria {
    /// Builds criteria from raw request values.
    ///
    /// Values are trimmed. Absent, empty, and `"todos"` values leave the
    /// field unfiltered.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if `year` or `month` is set to something
    /// other than an integer.
    pub fn parse(
        year: Option<&str>,
        month: Option<&str>,
        neighborhood: Option<&str>,
        parameter: Option<&str>,
    ) -> Result<Self, FilterError> {
        let year = active(year)
            .map(|v| {
                v.parse::<i32>().map_err(|_| FilterError::InvalidYear {
                    value: v.to_string(),
                })
            })
            .transpose()?;

        let month = active(month)
            .map(|v| {
                v.parse::<u32>().map_err(|_| FilterError::InvalidMonth {
                    value: v.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            year,
            month,
            neighborhood: active(neighborhood).map(str::to_string),
            parameter: active(parameter).map(str::to_string),
        })
    }

    /// Whether no field is filtered.
    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.year.is_none()
            && self.month.is_none()
            && self.neighborhood.is_none()
            && self.parameter.is_none()
    }

    /// Whether `record` passes every active predicate.
    ///
    /// A record whose filtered field is missing never matches.
    #[must_use]
    pub fn matches(&self, record: &SampleRecord) -> bool {
        if let Some(year) = self.year
            && record.year != Some(year)
        {
            return false;
        }
        if let Some(month) = self.month
            && record.month != Some(month)
        {
            return false;
        }
        if let Some(neighborhood) = &self.neighborhood
            && record.neighborhood.as_deref() != Some(neighborhood.as_str())
        {
            return false;
        }
        if let Some(parameter) = &self.parameter
            && record.parameter.as_deref() != Some(parameter.as_str())
        {
            return false;
        }
        true
    }
}

fn active(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != ALL_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(year: Option<i32>, neighborhood: Option<&str>) -> SampleRecord {
        SampleRecord {
            year,
            neighborhood: neighborhood.map(str::to_string),
            ..SampleRecord::default()
        }
    }

    #[test]
    fn parameter_names_round_trip() {
        for parameter in Parameter::all() {
            let parsed: Parameter = parameter.to_string().parse().unwrap();
            assert_eq!(parsed, *parameter);
        }
        assert_eq!(
            "Cloro residual livre (mg/L)".parse::<Parameter>().unwrap(),
            Parameter::CloroResidualLivre
        );
        assert!("pH".parse::<Parameter>().is_err());
    }

    #[test]
    fn parameter_keys_are_unique() {
        let mut keys: Vec<&str> = Parameter::all().iter().map(|p| p.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Parameter::all().len());
    }

    #[test]
    fn todos_and_empty_mean_unfiltered() {
        let criteria =
            FilterCriteria::parse(Some("todos"), Some(""), None, Some(ALL_FILTER)).unwrap();
        assert!(criteria.is_unfiltered());
        assert!(criteria.matches(&SampleRecord::default()));
    }

    #[test]
    fn padded_values_are_trimmed() {
        let criteria =
            FilterCriteria::parse(Some(" todos"), Some("todos "), Some(" todos "), None).unwrap();
        assert!(criteria.is_unfiltered());

        let criteria = FilterCriteria::parse(Some(" 2023 "), None, Some("BARRA "), None).unwrap();
        assert_eq!(criteria.year, Some(2023));
        assert_eq!(criteria.neighborhood.as_deref(), Some("BARRA"));
    }

    #[test]
    fn rejects_non_numeric_year() {
        let err = FilterCriteria::parse(Some("2023a"), None, None, None).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidYear {
                value: "2023a".to_string()
            }
        );
        assert!(FilterCriteria::parse(None, Some("jan"), None, None).is_err());
    }

    #[test]
    fn year_filter_drops_missing_years() {
        let criteria = FilterCriteria::parse(Some("2023"), Some("todos"), None, None).unwrap();
        assert!(criteria.matches(&sample(Some(2023), None)));
        assert!(!criteria.matches(&sample(Some(2022), None)));
        assert!(!criteria.matches(&sample(None, None)));
    }

    #[test]
    fn predicates_combine_with_and() {
        let criteria = FilterCriteria::parse(Some("2023"), None, Some("BARRA"), None).unwrap();
        assert!(criteria.matches(&sample(Some(2023), Some("BARRA"))));
        assert!(!criteria.matches(&sample(Some(2023), Some("ONDINA"))));
        assert!(!criteria.matches(&sample(Some(2022), Some("BARRA"))));
    }

    #[test]
    fn coordinates_require_both_finite() {
        let mut record = SampleRecord {
            latitude: Some(-12.97),
            longitude: Some(-38.5),
            ..SampleRecord::default()
        };
        assert_eq!(record.coordinates(), Some((-12.97, -38.5)));
        record.longitude = Some(f64::NAN);
        assert!(record.coordinates().is_none());
        record.longitude = None;
        assert!(record.coordinates().is_none());
    }
}
