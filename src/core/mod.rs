pub mod etl;
pub mod feed;
pub mod pipeline;
pub mod render;

pub use crate::domain::model::{FeedSet, MapLayers};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
