use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs a pipeline's extract, transform and load phases in order.
pub struct MapEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> MapEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting map build...");

        tracing::info!("Extracting feeds...");
        let feeds = self.pipeline.extract().await?;
        tracing::info!(
            "Feeds fetched (earthquakes ok: {}, plates ok: {})",
            feeds.earthquakes.is_success(),
            feeds.plates.is_success()
        );
        self.monitor.log_stats("extract");

        tracing::info!("Styling features...");
        let layers = self.pipeline.transform(feeds).await?;
        tracing::info!(
            "Styled {} earthquakes, rejected {}",
            layers.earthquakes.len(),
            layers.rejected.len()
        );
        self.monitor.log_stats("transform");

        tracing::info!("Writing map...");
        let output_path = self.pipeline.load(layers).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
