use crate::domain::model::{ChartConfig, ChartHandle, ChartSpec, LabelMode};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn label_mode(&self) -> LabelMode;
    fn canvas_size(&self) -> (u32, u32);
    fn request_timeout(&self) -> Option<Duration>;
    fn archive_enabled(&self) -> bool;
    fn chart_configs(&self) -> Vec<ChartConfig>;
}

/// Where the dashboard's dataset comes from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human readable location, used in logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<serde_json::Value>;
}

/// A set of named canvases, each holding at most one chart instance.
pub trait ChartSurface {
    /// Draw a new chart on `canvas_id` and return its handle.
    fn draw(&mut self, canvas_id: &str, spec: &ChartSpec) -> Result<ChartHandle>;

    /// Destroy a chart instance previously returned by [`ChartSurface::draw`].
    fn destroy(&mut self, handle: &ChartHandle) -> Result<()>;

    /// Fallback cleanup when an instance cannot be destroyed: remove the canvas node itself.
    fn detach(&mut self, canvas_id: &str);
}
