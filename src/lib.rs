pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{LocalStorage, MapConfig};
pub use crate::core::{etl::MapEngine, pipeline::QuakeMapPipeline};
pub use domain::legend::{legend_labels, LegendInterval, LegendLabel, DEPTH_LEGEND};
pub use domain::style::{depth_color, feature_popup_text, magnitude_radius, ColorToken};
pub use utils::error::{MapError, Result};
