use crate::core::feed::{self, FeedClient};
use crate::core::render;
use crate::core::{ConfigProvider, FeedSet, MapLayers, Pipeline, Storage};
use crate::domain::legend::{legend_labels, DEPTH_LEGEND};
use crate::domain::model::{
    EarthquakeFeature, FeedOutcome, FeedReport, FeedStatus, RejectedFeature, RunSummary,
    StyledFeature,
};
use crate::domain::style::{depth_color, escape_html, feature_popup_text, magnitude_radius};
use crate::utils::error::{MapError, Result};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const INDEX_FILE: &str = "index.html";
pub const EARTHQUAKES_FILE: &str = "earthquakes.geojson";
pub const PLATES_FILE: &str = "tectonic_plates.geojson";
pub const CSV_FILE: &str = "earthquakes.csv";
pub const LEGEND_FILE: &str = "legend.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Styles one validated record.
pub fn style_feature(feature: EarthquakeFeature, escape_place: bool) -> StyledFeature {
    let place = if escape_place {
        escape_html(&feature.place)
    } else {
        feature.place.clone()
    };

    StyledFeature {
        color: depth_color(feature.depth_km),
        radius: magnitude_radius(feature.magnitude),
        popup: feature_popup_text(feature.magnitude, feature.depth_km, &place),
        feature,
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: Option<&'a str>,
    time: Option<String>,
    magnitude: f64,
    depth_km: f64,
    place: &'a str,
    color: &'static str,
    radius: f64,
}

fn earthquakes_csv(earthquakes: &[StyledFeature]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for styled in earthquakes {
        writer.serialize(CsvRow {
            id: styled.feature.id.as_deref(),
            time: styled.feature.time.map(|t| t.to_rfc3339()),
            magnitude: styled.feature.magnitude,
            depth_km: styled.feature.depth_km,
            place: &styled.feature.place,
            color: styled.color.css(),
            radius: styled.radius,
        })?;
    }

    // serialize only emits headers alongside the first row
    if earthquakes.is_empty() {
        writer.write_record(["id", "time", "magnitude", "depth_km", "place", "color", "radius"])?;
    }

    writer
        .into_inner()
        .map_err(|e| MapError::IoError(e.into_error()))
}

pub struct QuakeMapPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: FeedClient,
}

impl<S: Storage, C: ConfigProvider> QuakeMapPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let client = FeedClient::new(config.request_timeout());
        Self {
            storage,
            config,
            client,
        }
    }

    fn artifacts(&self, layers: &MapLayers) -> Result<Vec<(&'static str, Vec<u8>)>> {
        Ok(vec![
            (
                INDEX_FILE,
                render::render_map_page(self.config.map_settings(), layers)?.into_bytes(),
            ),
            (
                EARTHQUAKES_FILE,
                serde_json::to_vec_pretty(&render::earthquake_collection(layers))?,
            ),
            (
                PLATES_FILE,
                serde_json::to_vec(&render::plates_collection(layers))?,
            ),
            (CSV_FILE, earthquakes_csv(&layers.earthquakes)?),
            (LEGEND_FILE, serde_json::to_vec_pretty(&layers.legend)?),
            (SUMMARY_FILE, serde_json::to_vec_pretty(&layers.summary)?),
        ])
    }
}

fn feed_report(url: &str, reason: Option<String>, accepted: usize, rejected: usize) -> FeedReport {
    FeedReport {
        url: url.to_string(),
        status: if reason.is_some() {
            FeedStatus::Failed
        } else {
            FeedStatus::Ok
        },
        reason,
        accepted,
        rejected,
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for QuakeMapPipeline<S, C> {
    async fn extract(&self) -> Result<FeedSet> {
        tracing::info!(
            "Fetching feeds: {} and {}",
            self.config.earthquake_feed(),
            self.config.plates_feed()
        );

        let (earthquakes, plates) = tokio::join!(
            self.client.fetch(self.config.earthquake_feed()),
            self.client.fetch(self.config.plates_feed())
        );

        Ok(FeedSet {
            earthquakes,
            plates,
        })
    }

    async fn transform(&self, feeds: FeedSet) -> Result<MapLayers> {
        let (earthquakes, rejected, quake_failure): (Vec<StyledFeature>, Vec<RejectedFeature>, _) =
            match feeds.earthquakes {
                FeedOutcome::Success(document) => match feed::parse_earthquakes(&document) {
                    Ok(parsed) => {
                        let escape = self.config.escape_popup_html();
                        let styled = parsed
                            .features
                            .into_iter()
                            .map(|f| style_feature(f, escape))
                            .collect();
                        (styled, parsed.rejected, None)
                    }
                    Err(e) => (Vec::new(), Vec::new(), Some(e.to_string())),
                },
                FeedOutcome::Failure(reason) => (Vec::new(), Vec::new(), Some(reason)),
            };

        if let Some(reason) = &quake_failure {
            tracing::warn!("Earthquake layer will be empty: {}", reason);
        }
        if !rejected.is_empty() {
            tracing::warn!("Rejected {} malformed earthquake records", rejected.len());
        }

        let (plates, plate_count, plates_failure) = match feeds.plates {
            FeedOutcome::Success(document) => match feed::validate_plates(&document) {
                Ok(count) => (Some(document), count, None),
                Err(e) => (None, 0, Some(e.to_string())),
            },
            FeedOutcome::Failure(reason) => (None, 0, Some(reason)),
        };

        if let Some(reason) = &plates_failure {
            tracing::warn!("Tectonic plate layer will be empty: {}", reason);
        }

        if quake_failure.is_some() && plates_failure.is_some() {
            return Err(MapError::NoFeedData);
        }

        let summary = RunSummary {
            generated_at: chrono::Utc::now(),
            earthquakes: feed_report(
                self.config.earthquake_feed(),
                quake_failure,
                earthquakes.len(),
                rejected.len(),
            ),
            plates: feed_report(self.config.plates_feed(), plates_failure, plate_count, 0),
        };

        Ok(MapLayers {
            earthquakes,
            rejected,
            plates,
            legend: legend_labels(&DEPTH_LEGEND),
            summary,
        })
    }

    async fn load(&self, layers: MapLayers) -> Result<String> {
        let artifacts = self.artifacts(&layers)?;
        let output_dir = std::path::Path::new(self.config.output_path());

        match self.config.bundle_filename() {
            Some(bundle) => {
                tracing::debug!("Creating ZIP bundle with {} files", artifacts.len());

                let zip_data = {
                    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                    for (name, data) in &artifacts {
                        zip.start_file::<_, ()>(*name, FileOptions::default())?;
                        zip.write_all(data)?;
                    }
                    zip.finish()?.into_inner()
                };

                tracing::debug!("Writing ZIP bundle ({} bytes) to storage", zip_data.len());
                self.storage.write_file(bundle, &zip_data).await?;
                Ok(output_dir.join(bundle).display().to_string())
            }
            None => {
                for (name, data) in &artifacts {
                    self.storage.write_file(name, data).await?;
                }
                Ok(output_dir.join(INDEX_FILE).display().to_string())
            }
        }
    }
}
