//! Neighborhood boundary overlay loaded from a `GeoJSON` file.
//!
//! The boundary file is published by the city with varying property names,
//! so the tooltip field is detected: `nome_bairr`, then `NM_BAIRRO` (both
//! normalized to trimmed uppercase into [`NORMALIZED_NAME_FIELD`]), then the
//! first property of the first feature.

use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson};

use crate::MapError;

/// Property added to each feature holding the normalized neighborhood name.
pub const NORMALIZED_NAME_FIELD: &str = "nome_bairr_norm";

/// Known neighborhood-name properties, in order of preference.
const NAME_FIELDS: &[&str] = &["nome_bairr", "NM_BAIRRO"];

/// A `FeatureCollection` of neighborhood polygons plus the property used
/// for tooltips.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    collection: FeatureCollection,
    tooltip_field: Option<String>,
}

impl BoundaryLayer {
    /// Reads and normalizes a boundary file.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the file cannot be read or is not valid
    /// `GeoJSON`.
    pub fn from_path(path: &Path) -> Result<Self, MapError> {
        let contents = std::fs::read_to_string(path)?;
        let layer = Self::from_geojson_str(&contents)?;
        log::info!(
            "Loaded {} neighborhood boundaries from {}",
            layer.len(),
            path.display()
        );
        Ok(layer)
    }

    /// Parses and normalizes `GeoJSON` text. A lone geometry or feature is
    /// wrapped in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::GeoJson`] if the text is not valid `GeoJSON`.
    pub fn from_geojson_str(contents: &str) -> Result<Self, MapError> {
        let mut collection = match contents.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection,
            GeoJson::Feature(feature) => FeatureCollection {
                bbox: None,
                features: vec![feature],
                foreign_members: None,
            },
            GeoJson::Geometry(geometry) => FeatureCollection {
                bbox: None,
                features: vec![Feature {
                    bbox: None,
                    geometry: Some(geometry),
                    id: None,
                    properties: None,
                    foreign_members: None,
                }],
                foreign_members: None,
            },
        };

        let tooltip_field = normalize_names(&mut collection);
        Ok(Self {
            collection,
            tooltip_field,
        })
    }

    /// Property shown in the hover tooltip, if any feature has properties.
    #[must_use]
    pub fn tooltip_field(&self) -> Option<&str> {
        self.tooltip_field.as_deref()
    }

    /// Number of boundary features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    /// Whether the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    /// Serializes the collection for embedding in the map page.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string(&self.collection)?)
    }
}

/// Adds [`NORMALIZED_NAME_FIELD`] to every feature and returns the tooltip
/// property to use.
fn normalize_names(collection: &mut FeatureCollection) -> Option<String> {
    let first_properties = collection
        .features
        .iter()
        .find_map(|feature| feature.properties.as_ref());

    let Some(source_field) = NAME_FIELDS.iter().copied().find(|field| {
        first_properties.is_some_and(|properties| properties.contains_key(*field))
    }) else {
        // Key order is file order (serde_json `preserve_order`).
        let fallback = first_properties.and_then(|properties| properties.keys().next().cloned());
        log::warn!(
            "Neighborhood name property not identified in GeoJSON, using {fallback:?} for tooltip"
        );
        return fallback;
    };

    for feature in &mut collection.features {
        let Some(name) = feature.property(source_field).map(|value| {
            value
                .as_str()
                .map_or_else(|| value.to_string(), str::to_string)
                .trim()
                .to_uppercase()
        }) else {
            continue;
        };
        feature.set_property(NORMALIZED_NAME_FIELD, name);
    }

    Some(NORMALIZED_NAME_FIELD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "nome_bairr": " Barra " },
                "geometry": { "type": "Point", "coordinates": [-38.53, -13.01] }
            },
            {
                "type": "Feature",
                "properties": { "nome_bairr": "Ondina" },
                "geometry": { "type": "Point", "coordinates": [-38.51, -13.0] }
            }
        ]
    }"#;

    #[test]
    fn normalizes_known_name_field() {
        let layer = BoundaryLayer::from_geojson_str(COLLECTION).unwrap();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.tooltip_field(), Some(NORMALIZED_NAME_FIELD));

        let json: serde_json::Value = serde_json::from_str(&layer.to_json().unwrap()).unwrap();
        assert_eq!(
            json["features"][0]["properties"][NORMALIZED_NAME_FIELD],
            "BARRA"
        );
        assert_eq!(
            json["features"][1]["properties"][NORMALIZED_NAME_FIELD],
            "ONDINA"
        );
    }

    #[test]
    fn falls_back_to_first_property() {
        let layer = BoundaryLayer::from_geojson_str(
            r#"{
                "type": "Feature",
                "properties": { "codigo": 42 },
                "geometry": { "type": "Point", "coordinates": [-38.5, -13.0] }
            }"#,
        )
        .unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.tooltip_field(), Some("codigo"));
    }

    #[test]
    fn fallback_property_follows_file_order() {
        let layer = BoundaryLayer::from_geojson_str(
            r#"{
                "type": "Feature",
                "properties": { "zeta": "Z1", "alpha": "A1" },
                "geometry": { "type": "Point", "coordinates": [-38.5, -13.0] }
            }"#,
        )
        .unwrap();
        assert_eq!(layer.tooltip_field(), Some("zeta"));
    }

    #[test]
    fn bare_geometry_has_no_tooltip() {
        let layer = BoundaryLayer::from_geojson_str(
            r#"{ "type": "Point", "coordinates": [-38.5, -13.0] }"#,
        )
        .unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.tooltip_field(), None);
    }

    #[test]
    fn rejects_invalid_geojson() {
        assert!(matches!(
            BoundaryLayer::from_geojson_str("{ \"type\": \"Nope\" }"),
            Err(MapError::GeoJson(_))
        ));
    }
}
