use crate::core::ConfigProvider;
use crate::utils::error::{MapError, Result};
use crate::utils::validation::{self, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_EARTHQUAKE_FEED: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";
pub const DEFAULT_PLATES_FEED: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

const LEGEND_POSITIONS: [&str; 4] = ["topleft", "topright", "bottomleft", "bottomright"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub feeds: FeedsConfig,
    pub output: OutputConfig,
    pub monitoring: MonitoringConfig,
    #[serde(flatten)]
    pub map: MapSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub earthquakes: String,
    pub tectonic_plates: String,
    pub timeout_seconds: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            earthquakes: DEFAULT_EARTHQUAKE_FEED.to_string(),
            tectonic_plates: DEFAULT_PLATES_FEED.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub bundle: bool,
    pub bundle_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            bundle: false,
            bundle_filename: "quake_map.zip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

/// Everything the generated page needs to wire up Leaflet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    #[serde(rename = "map")]
    pub view: ViewConfig,
    pub base_layers: Vec<BaseLayerConfig>,
    pub plates: PlateStyle,
    pub markers: MarkerStyle,
    pub overlays: OverlayNames,
    pub legend: LegendConfig,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            view: ViewConfig::default(),
            base_layers: default_base_layers(),
            plates: PlateStyle::default(),
            markers: MarkerStyle::default(),
            overlays: OverlayNames::default(),
            legend: LegendConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub title: String,
    /// `[latitude, longitude]`
    pub center: [f64; 2],
    pub zoom: u8,
    pub default_base_layer: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: "Earthquakes and Tectonic Plates".to_string(),
            center: [36.7783, -119.4179],
            zoom: 3,
            default_base_layer: "Default".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLayerConfig {
    pub name: String,
    pub url_template: String,
    pub attribution: String,
    #[serde(default)]
    pub min_zoom: Option<u8>,
    #[serde(default)]
    pub max_zoom: Option<u8>,
    #[serde(default)]
    pub subdomains: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}

fn default_base_layers() -> Vec<BaseLayerConfig> {
    vec![
        BaseLayerConfig {
            name: "Default".to_string(),
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
            min_zoom: None,
            max_zoom: Some(19),
            subdomains: None,
            ext: None,
        },
        BaseLayerConfig {
            name: "GrayScale".to_string(),
            url_template: "https://tiles.stadiamaps.com/tiles/stamen_toner_lite/{z}/{x}/{y}{r}.{ext}".to_string(),
            attribution: "Map tiles by <a href=\"http://stamen.com\">Stamen Design</a>, <a href=\"http://creativecommons.org/licenses/by/3.0\">CC BY 3.0</a> &mdash; Map data &copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
            min_zoom: Some(0),
            max_zoom: Some(20),
            subdomains: Some("abcd".to_string()),
            ext: Some("png".to_string()),
        },
        BaseLayerConfig {
            name: "Topographic".to_string(),
            url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "Map data: &copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors, <a href=\"http://viewfinderpanoramas.org\">SRTM</a> | Map style: &copy; <a href=\"https://opentopomap.org\">OpenTopoMap</a> (<a href=\"https://creativecommons.org/licenses/by-sa/3.0/\">CC-BY-SA</a>)".to_string(),
            min_zoom: None,
            max_zoom: Some(17),
            subdomains: None,
            ext: None,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateStyle {
    pub color: String,
    pub weight: f64,
}

impl Default for PlateStyle {
    fn default() -> Self {
        Self {
            color: "yellow".to_string(),
            weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub opacity: f64,
    pub fill_opacity: f64,
    pub outline_color: String,
    pub weight: f64,
    pub stroke: bool,
    pub escape_popup_html: bool,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            fill_opacity: 0.5,
            outline_color: "#000000".to_string(),
            weight: 0.5,
            stroke: true,
            escape_popup_html: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayNames {
    pub tectonic_plates: String,
    pub earthquakes: String,
}

impl Default for OverlayNames {
    fn default() -> Self {
        Self {
            tectonic_plates: "Tectonic Plates".to_string(),
            earthquakes: "Earthquake Data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub position: String,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            position: "bottomright".to_string(),
        }
    }
}

impl MapConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("feeds.earthquakes", &self.feeds.earthquakes)?;
        validation::validate_url("feeds.tectonic_plates", &self.feeds.tectonic_plates)?;
        validation::validate_positive_number("feeds.timeout_seconds", self.feeds.timeout_seconds, 1)?;

        validation::validate_path("output.path", &self.output.path)?;
        if self.output.bundle {
            validation::validate_non_empty_string(
                "output.bundle_filename",
                &self.output.bundle_filename,
            )?;
            validation::validate_path("output.bundle_filename", &self.output.bundle_filename)?;
        }

        self.map.validate()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for MapSettings {
    fn validate(&self) -> Result<()> {
        let [lat, lon] = self.view.center;
        validation::validate_range("map.center[0]", lat, -90.0, 90.0)?;
        validation::validate_range("map.center[1]", lon, -180.0, 180.0)?;
        validation::validate_range("map.zoom", self.view.zoom, 0, 20)?;

        if self.base_layers.is_empty() {
            return Err(MapError::MissingConfigError {
                field: "base_layers".to_string(),
            });
        }

        for (i, layer) in self.base_layers.iter().enumerate() {
            validation::validate_non_empty_string(&format!("base_layers[{}].name", i), &layer.name)?;
            validation::validate_tile_template(
                &format!("base_layers[{}].url_template", i),
                &layer.url_template,
            )?;
            if let (Some(min), Some(max)) = (layer.min_zoom, layer.max_zoom) {
                if min > max {
                    return Err(MapError::ConfigValidationError {
                        field: format!("base_layers[{}]", i),
                        message: format!("min_zoom {} exceeds max_zoom {}", min, max),
                    });
                }
            }
            if self.base_layers[..i].iter().any(|other| other.name == layer.name) {
                return Err(MapError::ConfigValidationError {
                    field: format!("base_layers[{}].name", i),
                    message: format!("duplicate base layer name '{}'", layer.name),
                });
            }
        }

        if !self
            .base_layers
            .iter()
            .any(|layer| layer.name == self.view.default_base_layer)
        {
            return Err(MapError::InvalidConfigValueError {
                field: "map.default_base_layer".to_string(),
                value: self.view.default_base_layer.clone(),
                reason: "No base layer with that name".to_string(),
            });
        }

        validation::validate_non_empty_string("plates.color", &self.plates.color)?;
        validation::validate_range("plates.weight", self.plates.weight, 0.0, 50.0)?;
        validation::validate_range("markers.opacity", self.markers.opacity, 0.0, 1.0)?;
        validation::validate_range("markers.fill_opacity", self.markers.fill_opacity, 0.0, 1.0)?;
        validation::validate_range("markers.weight", self.markers.weight, 0.0, 50.0)?;
        validation::validate_non_empty_string(
            "overlays.tectonic_plates",
            &self.overlays.tectonic_plates,
        )?;
        validation::validate_non_empty_string("overlays.earthquakes", &self.overlays.earthquakes)?;
        validation::validate_one_of("legend.position", &self.legend.position, &LEGEND_POSITIONS)?;

        Ok(())
    }
}

impl ConfigProvider for MapConfig {
    fn earthquake_feed(&self) -> &str {
        &self.feeds.earthquakes
    }

    fn plates_feed(&self) -> &str {
        &self.feeds.tectonic_plates
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.feeds.timeout_seconds)
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.output
            .bundle
            .then_some(self.output.bundle_filename.as_str())
    }

    fn escape_popup_html(&self) -> bool {
        self.map.markers.escape_popup_html
    }

    fn map_settings(&self) -> &MapSettings {
        &self.map
    }
}

impl Validate for MapConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
