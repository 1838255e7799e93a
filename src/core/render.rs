use crate::config::toml_config::{BaseLayerConfig, MapSettings};
use crate::domain::legend::legend_html;
use crate::domain::model::{MapLayers, StyledFeature};
use crate::domain::style::escape_html;
use crate::utils::error::Result;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

const LEAFLET_VERSION: &str = "1.9.4";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.legend { background: white; padding: 6px 8px; line-height: 18px; color: #555; border-radius: 4px; }
.legend i { width: 18px; height: 18px; float: left; margin-right: 8px; opacity: 0.7; }
</style>
</head>
<body>
<div id="map"></div>
<script>
const config = __CONFIG__;
const earthquakes = __EARTHQUAKES__;
const plates = __PLATES__;

const baseLayers = {};
for (const layer of config.baseLayers) {
  baseLayers[layer.name] = L.tileLayer(layer.urlTemplate, layer.options);
}

const map = L.map("map", {
  center: config.center,
  zoom: config.zoom,
  layers: [baseLayers[config.defaultBaseLayer]]
});

const plateLayer = L.geoJson(plates, config.plateStyle);
const quakeLayer = L.geoJson(earthquakes, {
  pointToLayer: (feature, latLng) => L.circleMarker(latLng),
  style: (feature) => Object.assign({}, config.markerStyle, {
    fillColor: feature.properties.style.fillColor,
    radius: feature.properties.style.radius
  }),
  onEachFeature: (feature, layer) => layer.bindPopup(feature.properties.popup)
});
plateLayer.addTo(map);
quakeLayer.addTo(map);

const overlays = {};
overlays[config.overlays.tectonicPlates] = plateLayer;
overlays[config.overlays.earthquakes] = quakeLayer;
L.control.layers(baseLayers, overlays).addTo(map);

const legend = L.control({ position: config.legendPosition });
legend.onAdd = () => {
  const div = L.DomUtil.create("div", "info legend");
  div.innerHTML = config.legendHtml;
  return div;
};
legend.addTo(map);
</script>
</body>
</html>
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions<'a> {
    attribution: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_zoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_zoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subdomains: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ext: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageBaseLayer<'a> {
    name: &'a str,
    url_template: &'a str,
    options: TileOptions<'a>,
}

impl<'a> From<&'a BaseLayerConfig> for PageBaseLayer<'a> {
    fn from(layer: &'a BaseLayerConfig) -> Self {
        Self {
            name: &layer.name,
            url_template: &layer.url_template,
            options: TileOptions {
                attribution: &layer.attribution,
                min_zoom: layer.min_zoom,
                max_zoom: layer.max_zoom,
                subdomains: layer.subdomains.as_deref(),
                ext: layer.ext.as_deref(),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageOverlays<'a> {
    tectonic_plates: &'a str,
    earthquakes: &'a str,
}

/// The single configuration object handed to the page script.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageConfig<'a> {
    base_layers: Vec<PageBaseLayer<'a>>,
    default_base_layer: &'a str,
    center: [f64; 2],
    zoom: u8,
    plate_style: Value,
    marker_style: Value,
    overlays: PageOverlays<'a>,
    legend_position: &'a str,
    legend_html: String,
}

impl<'a> PageConfig<'a> {
    fn new(settings: &'a MapSettings, layers: &MapLayers) -> Self {
        Self {
            base_layers: settings.base_layers.iter().map(PageBaseLayer::from).collect(),
            default_base_layer: &settings.view.default_base_layer,
            center: settings.view.center,
            zoom: settings.view.zoom,
            plate_style: json!({
                "color": settings.plates.color,
                "weight": settings.plates.weight,
            }),
            marker_style: json!({
                "opacity": settings.markers.opacity,
                "fillOpacity": settings.markers.fill_opacity,
                "color": settings.markers.outline_color,
                "weight": settings.markers.weight,
                "stroke": settings.markers.stroke,
            }),
            overlays: PageOverlays {
                tectonic_plates: &settings.overlays.tectonic_plates,
                earthquakes: &settings.overlays.earthquakes,
            },
            legend_position: &settings.legend.position,
            legend_html: legend_html(&layers.legend),
        }
    }
}

/// GeoJSON Feature for one styled quake; the page reads `style` and `popup`.
pub fn styled_feature_geojson(styled: &StyledFeature) -> Value {
    let quake = &styled.feature;
    json!({
        "type": "Feature",
        "id": quake.id,
        "geometry": {
            "type": "Point",
            "coordinates": [quake.longitude, quake.latitude, quake.depth_km],
        },
        "properties": {
            "mag": quake.magnitude,
            "depth": quake.depth_km,
            "place": quake.place,
            "time": quake.time.map(|t| t.to_rfc3339()),
            "url": quake.url,
            "popup": styled.popup,
            "style": {
                "fillColor": styled.color,
                "radius": styled.radius,
            },
        },
    })
}

pub fn earthquake_collection(layers: &MapLayers) -> Value {
    let features: Vec<Value> = layers.earthquakes.iter().map(styled_feature_geojson).collect();
    json!({ "type": "FeatureCollection", "features": features })
}

pub fn plates_collection(layers: &MapLayers) -> Value {
    layers
        .plates
        .clone()
        .unwrap_or_else(|| json!({ "type": "FeatureCollection", "features": [] }))
}

/// JSON for inlining in a `<script>` element; `</` would end the element early.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"__(TITLE|LEAFLET|CONFIG|EARTHQUAKES|PLATES)__")
            .expect("placeholder pattern is valid")
    })
}

/// Fills every placeholder in one pass; inserted text is never scanned again.
pub fn render_map_page(settings: &MapSettings, layers: &MapLayers) -> Result<String> {
    let title = escape_html(&settings.view.title);
    let config = script_json(&PageConfig::new(settings, layers))?;
    let earthquakes = script_json(&earthquake_collection(layers))?;
    let plates = script_json(&plates_collection(layers))?;

    let page = placeholder_pattern().replace_all(PAGE_TEMPLATE, |caps: &Captures| {
        match &caps[1] {
            "TITLE" => title.as_str(),
            "LEAFLET" => LEAFLET_VERSION,
            "CONFIG" => config.as_str(),
            "EARTHQUAKES" => earthquakes.as_str(),
            _ => plates.as_str(),
        }
        .to_string()
    });

    Ok(page.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::legend::{legend_labels, DEPTH_LEGEND};
    use crate::domain::model::{EarthquakeFeature, FeedReport, FeedStatus, RunSummary};
    use crate::domain::style::ColorToken;
    use chrono::Utc;

    fn report() -> FeedReport {
        FeedReport {
            url: "https://example.com".to_string(),
            status: FeedStatus::Ok,
            reason: None,
            accepted: 1,
            rejected: 0,
        }
    }

    fn layers_with(place: &str) -> MapLayers {
        MapLayers {
            earthquakes: vec![StyledFeature {
                feature: EarthquakeFeature {
                    id: Some("us1".to_string()),
                    magnitude: 4.6,
                    depth_km: 35.0,
                    place: place.to_string(),
                    longitude: 142.3,
                    latitude: 38.1,
                    time: None,
                    url: None,
                },
                color: ColorToken::Amber,
                radius: 23.0,
                popup: format!("Location: <b>{}</b>", place),
            }],
            rejected: vec![],
            plates: None,
            legend: legend_labels(&DEPTH_LEGEND),
            summary: RunSummary {
                generated_at: Utc::now(),
                earthquakes: report(),
                plates: report(),
            },
        }
    }

    #[test]
    fn test_styled_feature_geojson() {
        let layers = layers_with("Honshu, Japan");
        let feature = styled_feature_geojson(&layers.earthquakes[0]);

        assert_eq!(feature["geometry"]["coordinates"], json!([142.3, 38.1, 35.0]));
        assert_eq!(feature["properties"]["style"]["fillColor"], "#fcad03");
        assert_eq!(feature["properties"]["style"]["radius"], 23.0);
        assert_eq!(feature["properties"]["place"], "Honshu, Japan");
    }

    #[test]
    fn test_missing_plates_render_as_empty_collection() {
        let layers = layers_with("x");
        assert_eq!(plates_collection(&layers)["features"], json!([]));
    }

    #[test]
    fn test_page_carries_explicit_configuration() {
        let settings = MapSettings::default();
        let page = render_map_page(&settings, &layers_with("Honshu, Japan")).unwrap();

        assert!(page.contains("leaflet@1.9.4"));
        assert!(page.contains(r#""defaultBaseLayer":"Default""#));
        assert!(page.contains(r#""name":"GrayScale""#));
        assert!(page.contains(r#""subdomains":"abcd""#));
        assert!(page.contains(r#""center":[36.7783,-119.4179]"#));
        assert!(page.contains(r#""legendPosition":"bottomright""#));
        assert!(page.contains(r#""tectonicPlates":"Tectonic Plates""#));
        assert!(page.contains("90+"));
        assert!(page.contains("Honshu, Japan"));
        assert!(!page.contains("__CONFIG__"));
    }

    #[test]
    fn test_feed_text_cannot_close_script_element() {
        let page = render_map_page(&MapSettings::default(), &layers_with("</script><script>alert(1)"))
            .unwrap();

        assert_eq!(page.matches("</script>").count(), 2);
        assert!(page.contains(r"<\/script>"));
    }

    fn inlined_json(page: &str, name: &str) -> Value {
        let prefix = format!("const {} = ", name);
        let line = page
            .lines()
            .find(|line| line.starts_with(&prefix))
            .unwrap_or_else(|| panic!("no `{}` line in page", name));
        let literal = line.strip_prefix(&prefix).unwrap().trim_end_matches(';');
        serde_json::from_str(literal).unwrap_or_else(|e| panic!("`{}` is not JSON: {}", name, e))
    }

    #[test]
    fn test_placeholder_text_in_feed_values_stays_literal() {
        for marker in ["__PLATES__", "__EARTHQUAKES__", "__CONFIG__", "__TITLE__", "__LEAFLET__"] {
            let place = format!("10 km N of {}", marker);
            let mut layers = layers_with(&place);
            layers.plates = Some(json!({
                "type": "FeatureCollection",
                "features": [{ "type": "Feature", "properties": { "Name": marker }, "geometry": null }],
            }));
            let mut settings = MapSettings::default();
            settings.view.title = format!("Quakes {}", marker);
            settings.overlays.earthquakes = marker.to_string();
            settings.base_layers[0].attribution = marker.to_string();

            let page = render_map_page(&settings, &layers).unwrap();

            let earthquakes = inlined_json(&page, "earthquakes");
            assert_eq!(earthquakes["features"][0]["properties"]["place"], place.as_str());
            let plates = inlined_json(&page, "plates");
            assert_eq!(plates["features"][0]["properties"]["Name"], marker);
            let config = inlined_json(&page, "config");
            assert_eq!(config["overlays"]["earthquakes"], marker);
            assert_eq!(config["baseLayers"][0]["options"]["attribution"], marker);
            assert!(page.contains(&format!("<title>Quakes {}</title>", marker)));
        }
    }

    #[test]
    fn test_title_is_escaped() {
        let mut settings = MapSettings::default();
        settings.view.title = "Quakes <this week>".to_string();
        let page = render_map_page(&settings, &layers_with("x")).unwrap();
        assert!(page.contains("<title>Quakes &lt;this week&gt;</title>"));
    }
}
