#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads water-quality samples from the cleaned SISAGUA CSV export.
//!
//! Reading is split into a fallible core ([`read_records`],
//! [`CsvSource::read`]) and the availability-first [`CsvSource::load`],
//! which logs any failure and returns an empty record set instead. Missing
//! columns and malformed cells become `None`; they never abort a load.

pub mod parsing;

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sisagua_sample_models::{FilterCriteria, RecordSet, SampleRecord};

/// Default CSV path, relative to the working directory.
pub const DEFAULT_CSV_PATH: &str = "dados_sisagua_limpos.csv";

/// Errors that can occur while reading a CSV source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The CSV file does not exist.
    #[error("CSV file '{path}' not found")]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// One CSV row before normalization. Every column is optional so that
/// exports lacking a column still deserialize.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSampleRow {
    id: Option<String>,
    bairro: Option<String>,
    ponto_de_coleta: Option<String>,
    data_da_coleta: Option<String>,
    parametro: Option<String>,
    resultado: Option<String>,
    resultado_numerico: Option<String>,
    unidade_de_medida: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    ano: Option<String>,
    mes: Option<String>,
}

impl From<RawSampleRow> for SampleRecord {
    fn from(row: RawSampleRow) -> Self {
        let collection_date = parsing::non_empty(row.data_da_coleta);
        let derived = parsing::calendar_from_date(collection_date.as_deref());

        // The date only fills blank cells; a present but unparsable cell
        // stays unknown.
        let year = match parsing::non_empty(row.ano) {
            Some(raw) => {
                parsing::parse_integral(Some(raw.as_str())).and_then(|v| i32::try_from(v).ok())
            }
            None => derived.map(|(year, _)| year),
        };
        let month = match parsing::non_empty(row.mes) {
            Some(raw) => {
                parsing::parse_integral(Some(raw.as_str())).and_then(|v| u32::try_from(v).ok())
            }
            None => derived.map(|(_, month)| month),
        };

        Self {
            id: parsing::non_empty(row.id),
            neighborhood: parsing::non_empty(row.bairro),
            collection_point: parsing::non_empty(row.ponto_de_coleta),
            collection_date,
            parameter: parsing::non_empty(row.parametro),
            result: parsing::non_empty(row.resultado),
            numeric_result: parsing::parse_float(row.resultado_numerico.as_deref()),
            unit: parsing::non_empty(row.unidade_de_medida),
            latitude: parsing::parse_float(row.latitude.as_deref()),
            longitude: parsing::parse_float(row.longitude.as_deref()),
            year,
            month,
        }
    }
}

/// Reads and normalizes every row of a CSV document.
///
/// Cells that are not valid UTF-8 are decoded lossily, so an oddly encoded
/// row still counts toward every total.
///
/// # Errors
///
/// Returns [`LoadError`] if the header row or the underlying reader fails.
pub fn read_records<R: Read>(reader: R, delimiter: u8) -> Result<RecordSet, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut headers = decode_lossy(reader.byte_headers()?);
    headers.trim();

    let mut records = Vec::new();
    let mut lossy: u64 = 0;
    let mut raw = csv::ByteRecord::new();

    while reader.read_byte_record(&mut raw)? {
        if std::str::from_utf8(raw.as_slice()).is_err() {
            lossy += 1;
            log::debug!(
                "CSV row at line {} is not valid UTF-8",
                raw.position().map_or(0, csv::Position::line)
            );
        }
        let row = match decode_lossy(&raw).deserialize::<RawSampleRow>(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                log::debug!("Undecodable CSV row kept as empty: {e}");
                RawSampleRow::default()
            }
        };
        records.push(SampleRecord::from(row));
    }

    if lossy > 0 {
        log::warn!("Decoded {lossy} CSV rows with invalid UTF-8 lossily");
    }

    Ok(records)
}

fn decode_lossy(record: &csv::ByteRecord) -> csv::StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Keeps the records that satisfy every active filter predicate.
#[must_use]
pub fn apply_filters(records: RecordSet, criteria: &FilterCriteria) -> RecordSet {
    if criteria.is_unfiltered() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

/// A CSV file of samples on disk.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    /// Creates a comma-delimited source for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    /// Sets the field delimiter (e.g. `b';'`).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Returns the CSV path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record in the file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be opened or its header
    /// cannot be parsed.
    pub fn read(&self) -> Result<RecordSet, LoadError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                LoadError::Io(e)
            }
        })?;
        let records = read_records(std::io::BufReader::new(file), self.delimiter)?;
        log::debug!(
            "Read {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    /// Loads the records matching `criteria`.
    ///
    /// Never fails: an unreadable source is logged and yields an empty set.
    #[must_use]
    pub fn load(&self, criteria: &FilterCriteria) -> RecordSet {
        match self.read() {
            Ok(records) => apply_filters(records, criteria),
            Err(e) => {
                log::error!("Error loading data: {e}");
                RecordSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,bairro,ponto_de_coleta,data_da_coleta,parametro,resultado,resultado_numerico,unidade_de_medida,latitude,longitude,ano,mes
1,BARRA,Ponto A,2023-01-10,Escherichia coli,AUSENTE,,,-13.0,-38.5,2023,1
2,ONDINA,Ponto B,2022-05-02,Turbidez (uT),\"0,8\",0.8,uT,-13.01,-38.51,2022,5
3,BARRA,Ponto A,2023-02-11,Fluoreto (mg/L),\"1,9\",,mg/L,,,2023.0,2
4,,Ponto C,,Turbidez (uT),2,2.0,uT,abc,-38.4,n/d,
";

    fn records() -> RecordSet {
        read_records(CSV.as_bytes(), b',').unwrap()
    }

    #[test]
    fn reads_and_normalizes_rows() {
        let records = records();
        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.id.as_deref(), Some("1"));
        assert_eq!(first.neighborhood.as_deref(), Some("BARRA"));
        assert_eq!(first.result.as_deref(), Some("AUSENTE"));
        assert_eq!(first.numeric_result, None);
        assert_eq!(first.year, Some(2023));
        assert_eq!(first.month, Some(1));

        assert_eq!(records[1].result.as_deref(), Some("0,8"));
        assert_eq!(records[1].numeric_result, Some(0.8));
        assert_eq!(records[2].year, Some(2023));
    }

    #[test]
    fn malformed_cells_become_missing() {
        let last = &records()[3];
        assert_eq!(last.neighborhood, None);
        assert_eq!(last.latitude, None);
        assert_eq!(last.longitude, Some(-38.4));
        assert_eq!(last.year, None);
        assert_eq!(last.month, None);
    }

    #[test]
    fn missing_columns_are_synthesized() {
        let csv = "parametro,resultado\nEscherichia coli,AUSENTE\n";
        let records = read_records(csv.as_bytes(), b',').unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parameter.as_deref(), Some("Escherichia coli"));
        assert_eq!(records[0].neighborhood, None);
        assert_eq!(records[0].latitude, None);
        assert_eq!(records[0].year, None);
    }

    #[test]
    fn derives_calendar_from_collection_date() {
        let csv = "parametro,data_da_coleta\nTurbidez (uT),18/04/2023\n";
        let records = read_records(csv.as_bytes(), b',').unwrap();
        assert_eq!(records[0].year, Some(2023));
        assert_eq!(records[0].month, Some(4));
    }

    #[test]
    fn unparsable_calendar_cells_are_not_derived_from_date() {
        let csv = "parametro,data_da_coleta,ano,mes\nTurbidez (uT),2023-01-10,n/d,xx\n";
        let records = read_records(csv.as_bytes(), b',').unwrap();
        assert_eq!(records[0].year, None);
        assert_eq!(records[0].month, None);

        let criteria = FilterCriteria::parse(Some("2023"), None, None, None).unwrap();
        assert!(apply_filters(records, &criteria).is_empty());
    }

    #[test]
    fn invalid_utf8_rows_still_count() {
        let csv: &[u8] = b"bairro,parametro,resultado\n\
            S\xc3O CAETANO,Escherichia coli,PRESENTE\n\
            BARRA,Escherichia coli,AUSENTE\n";
        let records = read_records(csv, b',').unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].neighborhood.as_deref(), Some("S\u{fffd}O CAETANO"));
        assert_eq!(records[0].result.as_deref(), Some("PRESENTE"));
        assert_eq!(records[1].neighborhood.as_deref(), Some("BARRA"));
    }

    #[test]
    fn supports_semicolon_delimiter() {
        let csv = "bairro;parametro\nBARRA;Turbidez (uT)\n";
        let records = read_records(csv.as_bytes(), b';').unwrap();
        assert_eq!(records[0].neighborhood.as_deref(), Some("BARRA"));
    }

    #[test]
    fn year_filter_keeps_only_matching_year() {
        let criteria = FilterCriteria::parse(Some("2023"), Some("todos"), None, None).unwrap();
        let filtered = apply_filters(records(), &criteria);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.year == Some(2023)));
    }

    #[test]
    fn todos_filter_is_a_no_op() {
        let criteria = FilterCriteria::parse(Some("todos"), None, Some("todos"), None).unwrap();
        assert_eq!(apply_filters(records(), &criteria), records());
    }

    #[test]
    fn combined_filters_are_conjunctive() {
        let criteria =
            FilterCriteria::parse(None, Some("2"), Some("BARRA"), Some("Fluoreto (mg/L)"))
                .unwrap();
        let filtered = apply_filters(records(), &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.as_deref(), Some("3"));
    }

    #[test]
    fn unreadable_source_loads_empty() {
        let source = CsvSource::new("does/not/exist.csv");
        assert!(matches!(source.read(), Err(LoadError::NotFound { .. })));
        assert!(source.load(&FilterCriteria::default()).is_empty());
    }
}
