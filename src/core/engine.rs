use crate::adapters::svg::SvgSurface;
use crate::core::dashboard::Dashboard;
use crate::core::publish::{self, INDEX_FILE};
use crate::domain::ports::{ConfigProvider, DataSource, Storage};
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Result of one dashboard run.
#[derive(Debug, Clone)]
pub struct DashboardOutcome {
    pub output_path: String,
    pub error: Option<String>,
    pub records: Option<usize>,
    pub charts_displayed: usize,
    pub files: Vec<String>,
}

/// Mounts the dashboard, waits for the data, publishes the charts and tears down.
pub struct DashboardEngine<D: DataSource + 'static, S: Storage, C: ConfigProvider> {
    source: Arc<D>,
    storage: S,
    config: C,
}

impl<D: DataSource + 'static, S: Storage, C: ConfigProvider> DashboardEngine<D, S, C> {
    pub fn new(source: D, storage: S, config: C) -> Self {
        Self {
            source: Arc::new(source),
            storage,
            config,
        }
    }

    pub async fn run(&self) -> Result<DashboardOutcome> {
        tracing::info!("🚀 Starting dashboard render");

        let configs = self.config.chart_configs();
        let surface = SvgSurface::new(
            self.config.canvas_size(),
            configs.iter().map(|c| c.id.as_str()),
        );

        // Mount
        let mut dashboard = Dashboard::mount(
            self.source.clone(),
            surface,
            configs,
            self.config.label_mode(),
        );

        // Fetch
        dashboard.settle().await;
        if let Some(error) = dashboard.error() {
            tracing::warn!("⚠️ {}, charts render without data", error);
        }

        // Publish, then tear down even when publishing failed
        let files =
            publish_and_teardown(&mut dashboard, &self.storage, self.config.archive_enabled())
                .await?;

        let outcome = DashboardOutcome {
            output_path: Path::new(self.config.output_path())
                .join(INDEX_FILE)
                .to_string_lossy()
                .into_owned(),
            error: dashboard.error().map(str::to_string),
            records: dashboard.state().record_count(),
            charts_displayed: dashboard.last_report().displayed(),
            files,
        };

        tracing::info!(
            "📊 Rendered {} charts into {}",
            outcome.charts_displayed,
            self.config.output_path()
        );
        Ok(outcome)
    }
}

/// Write the last render pass to storage and release every chart.
async fn publish_and_teardown<S: Storage>(
    dashboard: &mut Dashboard<SvgSurface>,
    storage: &S,
    archive: bool,
) -> Result<Vec<String>> {
    let published = match publish::build_bundle(dashboard, chrono::Utc::now()) {
        Ok(bundle) => publish::write_bundle(storage, &bundle, archive).await,
        Err(e) => Err(e),
    };

    let teardown = dashboard.teardown();
    tracing::debug!(
        "Dashboard torn down, released {} charts",
        teardown.released_charts
    );

    published
}
