#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collection map generation.
//!
//! Renders a self-contained Leaflet page with one circle marker per sample
//! (green when compliant, red otherwise), an optional neighborhood boundary
//! overlay, and a legend built from the active [`ReferenceTable`]. The page
//! is written to `<static dir>/mapa_coletas.html` and embedded by the
//! dashboard in an iframe.

pub mod boundary;
pub mod html;

use std::path::{Path, PathBuf};

use serde::Serialize;
use sisagua_compliance::ReferenceTable;
use sisagua_sample_models::SampleRecord;

pub use boundary::BoundaryLayer;

/// File name of the generated map inside the static directory.
pub const MAP_FILE_NAME: &str = "mapa_coletas.html";

/// Map center (Salvador, BA).
pub const DEFAULT_CENTER: (f64, f64) = (-12.9714, -38.5014);

/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 12;

/// Errors that can occur while generating the map.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// I/O error (boundary read, map write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The boundary file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One circle marker, serialized into the page script.
#[derive(Debug, Serialize)]
struct SampleMarker {
    lat: f64,
    lng: f64,
    color: &'static str,
    popup: String,
}

impl SampleMarker {
    fn new(index: usize, record: &SampleRecord, table: &ReferenceTable) -> Option<Self> {
        let (lat, lng) = record.coordinates()?;
        let compliant = table.evaluate(record);
        Some(Self {
            lat,
            lng,
            color: if compliant { "green" } else { "red" },
            popup: popup_html(index, record, compliant),
        })
    }
}

/// Builds the marker popup. Every interpolated value is HTML-escaped.
fn popup_html(index: usize, record: &SampleRecord, compliant: bool) -> String {
    let field = |value: Option<&String>| html::escape(value.map_or("N/A", String::as_str));
    let status = if compliant {
        "Dentro do padrão"
    } else {
        "Fora do padrão"
    };
    let id = record
        .id
        .as_deref()
        .map_or_else(|| index.to_string(), html::escape);

    format!(
        "<strong>Bairro:</strong> {}<br>\
         <strong>Ponto de Coleta:</strong> {}<br>\
         <strong>Data da coleta:</strong> {}<br>\
         <strong>Parâmetro:</strong> {}<br>\
         <strong>Resultado:</strong> {} {}<br>\
         <strong>Situação:</strong> {status}<br>\
         <small>ID Amostra: {id}</small>",
        field(record.neighborhood.as_ref()),
        field(record.collection_point.as_ref()),
        field(record.collection_date.as_ref()),
        field(record.parameter.as_ref()),
        field(record.result.as_ref()),
        html::escape(record.unit.as_deref().unwrap_or_default()),
    )
}

/// Renders the map page for `records`.
///
/// Records without valid coordinates are not drawn.
///
/// # Errors
///
/// Returns [`MapError::Json`] if the marker or boundary data cannot be
/// serialized.
pub fn render(
    records: &[SampleRecord],
    table: &ReferenceTable,
    boundaries: Option<&BoundaryLayer>,
) -> Result<String, MapError> {
    let markers: Vec<SampleMarker> = records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| SampleMarker::new(i, record, table))
        .collect();

    if markers.is_empty() {
        log::info!("No samples with valid coordinates to plot on the map");
    } else {
        log::debug!(
            "Plotting {} of {} samples on the map",
            markers.len(),
            records.len()
        );
    }

    let mut script = html::base_layer(DEFAULT_CENTER, DEFAULT_ZOOM);
    script.push_str(&html::marker_layer(&serde_json::to_string(&markers)?));
    if let Some(layer) = boundaries {
        script.push_str(&html::boundary_layer(
            &layer.to_json()?,
            layer.tooltip_field(),
        ));
    }

    let legend = html::legend(table, boundaries.is_some());
    Ok(html::page(&legend, &script))
}

/// Renders a placeholder map with a single marker describing `message`.
#[must_use]
pub fn render_error(message: &str) -> String {
    let (lat, lng) = DEFAULT_CENTER;
    let marker = serde_json::json!([{
        "lat": lat,
        "lng": lng,
        "color": "red",
        "popup": format!("Erro crítico ao gerar o mapa: {}", html::escape(message)),
    }]);
    let mut script = html::base_layer(DEFAULT_CENTER, DEFAULT_ZOOM);
    script.push_str(&html::marker_layer(&marker.to_string()));
    html::page("", &script)
}

/// Loads the boundary overlay, logging and skipping it on failure.
#[must_use]
pub fn load_boundaries(path: &Path) -> Option<BoundaryLayer> {
    if !path.exists() {
        log::warn!("GeoJSON file not found: {}", path.display());
        return None;
    }
    match BoundaryLayer::from_path(path) {
        Ok(layer) if layer.is_empty() => {
            log::warn!("GeoJSON '{}' has no features", path.display());
            None
        }
        Ok(layer) => Some(layer),
        Err(e) => {
            log::error!(
                "Error loading or processing GeoJSON '{}': {e}",
                path.display()
            );
            None
        }
    }
}

/// Renders and writes the map into `static_dir`.
///
/// # Errors
///
/// Returns [`MapError`] if rendering fails or the file cannot be written.
pub fn write_map(
    static_dir: &Path,
    records: &[SampleRecord],
    table: &ReferenceTable,
    boundary_path: Option<&Path>,
) -> Result<PathBuf, MapError> {
    let boundaries = boundary_path.and_then(load_boundaries);
    let page = render(records, table, boundaries.as_ref())?;

    std::fs::create_dir_all(static_dir)?;
    let path = static_dir.join(MAP_FILE_NAME);
    std::fs::write(&path, page)?;
    log::info!("Map written to {}", path.display());
    Ok(path)
}

/// Writes the map, falling back to an error page on failure.
///
/// Returns `true` when the written map reflects `records`.
#[must_use]
pub fn generate(
    static_dir: &Path,
    records: &[SampleRecord],
    table: &ReferenceTable,
    boundary_path: Option<&Path>,
) -> bool {
    match write_map(static_dir, records, table, boundary_path) {
        Ok(_) => true,
        Err(e) => {
            log::error!("Fatal error creating collection map: {e}");
            let fallback = static_dir.join(MAP_FILE_NAME);
            if let Err(e) = std::fs::write(&fallback, render_error(&e.to_string())) {
                log::error!("Failed to write fallback map: {e}");
            }
            false
        }
    }
}
