use crate::config::toml_config::MapSettings;
use crate::domain::model::{FeedSet, MapLayers};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn earthquake_feed(&self) -> &str;
    fn plates_feed(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn output_path(&self) -> &str;
    /// `Some(file name)` when the run should write a single zip archive.
    fn bundle_filename(&self) -> Option<&str>;
    fn escape_popup_html(&self) -> bool;
    fn map_settings(&self) -> &MapSettings;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<FeedSet>;
    async fn transform(&self, feeds: FeedSet) -> Result<MapLayers>;
    async fn load(&self, layers: MapLayers) -> Result<String>;
}
