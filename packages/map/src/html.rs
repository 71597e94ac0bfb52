//! HTML fragments for the Leaflet map page.

use sisagua_compliance::ReferenceTable;
use sisagua_sample_models::Parameter;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors &copy; CARTO";

/// Escape HTML special characters
#[must_use]
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Makes serialized JSON safe to embed inside a `<script>` element.
#[must_use]
pub fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Wraps the map body script in a complete page.
pub(crate) fn page(legend: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Mapa de Coletas</title>
    <link rel="stylesheet" href="{LEAFLET_CSS}">
    <script src="{LEAFLET_JS}"></script>
    <style>
        html, body, #map {{ height: 100%; margin: 0; }}
    </style>
</head>
<body>
    <div id="map"></div>
    {legend}
    <script>
{script}
    </script>
</body>
</html>"#
    )
}

/// Script lines creating the map and its base tile layer.
pub(crate) fn base_layer(center: (f64, f64), zoom: u8) -> String {
    let (lat, lng) = center;
    format!(
        "const map = L.map('map').setView([{lat}, {lng}], {zoom});\n\
         L.tileLayer('{TILE_URL}', {{ attribution: '{TILE_ATTRIBUTION}', subdomains: 'abcd', maxZoom: 20 }}).addTo(map);\n"
    )
}

/// Script lines drawing one circle marker per entry of `markers_json`.
pub(crate) fn marker_layer(markers_json: &str) -> String {
    format!(
        "const samples = {markers};\n\
         for (const s of samples) {{\n\
         \x20   L.circleMarker([s.lat, s.lng], {{ radius: 5, color: s.color, fill: true, fillColor: s.color, fillOpacity: 0.7 }})\n\
         \x20       .bindPopup(s.popup, {{ maxWidth: 350 }})\n\
         \x20       .addTo(map);\n\
         }}\n",
        markers = script_safe(markers_json),
    )
}

/// Script lines for the boundary overlay and its layer control.
pub(crate) fn boundary_layer(geojson: &str, tooltip_field: Option<&str>) -> String {
    let field = serde_json::Value::from(tooltip_field.unwrap_or_default());
    format!(
        "const tooltipField = {field};\n\
         const boundaries = L.geoJSON({geojson}, {{\n\
         \x20   style: () => ({{ fillColor: 'transparent', color: 'black', weight: 0.7, fillOpacity: 0.1 }}),\n\
         \x20   onEachFeature: (feature, layer) => {{\n\
         \x20       const value = tooltipField && feature.properties ? feature.properties[tooltipField] : undefined;\n\
         \x20       if (value === undefined || value === null) return;\n\
         \x20       const label = document.createElement('span');\n\
         \x20       label.textContent = 'Bairro: ' + value;\n\
         \x20       layer.bindTooltip(label);\n\
         \x20   }}\n\
         }}).addTo(map);\n\
         L.control.layers(null, {{ 'Limites dos Bairros': boundaries }}).addTo(map);\n",
        geojson = script_safe(geojson),
    )
}

/// Fixed-position legend with marker colors and the active criteria.
pub(crate) fn legend(table: &ReferenceTable, boundaries_loaded: bool) -> String {
    let boundary_item = if boundaries_loaded {
        "<div style='margin-bottom: 5px;'><i style='background:transparent; border: 1px solid black; width:12px; height:12px; display:inline-block; margin-right:5px;'></i> Limite Bairros</div>"
    } else {
        ""
    };

    let criteria: String = table
        .parameters
        .iter()
        .map(|(name, rule)| {
            let label = name
                .parse::<Parameter>()
                .map_or(name.as_str(), |parameter| parameter.short_label());
            format!(
                "<li>{}: {}</li>",
                escape(label),
                escape(&rule.describe())
            )
        })
        .collect();

    format!(
        r#"<div style="position: fixed; bottom: 20px; left: 20px; z-index: 1000;
            background-color: white; border: 2px solid grey; border-radius: 8px;
            padding: 10px; font-size: 12px; line-height: 1.5; max-width: 280px;">
        <h4 style='margin-top:0; margin-bottom: 5px; text-align: center;'>Legenda</h4>
        <div style='margin-bottom: 5px;'><i style='background:green; width:12px; height:12px; border-radius:50%; display:inline-block; margin-right:5px;'></i> Amostra Dentro do Padrão</div>
        <div style='margin-bottom: 5px;'><i style='background:red; width:12px; height:12px; border-radius:50%; display:inline-block; margin-right:5px;'></i> Amostra Fora do Padrão</div>
        {boundary_item}
        <hr style='margin: 5px 0;'>
        <div style='font-size: 10px; text-align: center;'><strong>Critérios ({name}):</strong></div>
        <ul style='padding-left: 15px; margin-bottom: 0; font-size: 10px;'>{criteria}</ul>
    </div>"#,
        name = escape(&table.name),
    )
}
