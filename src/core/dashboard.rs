use crate::core::renderer::{ChartRenderer, RenderReport};
use crate::domain::model::{ChartConfig, DatasetState, LabelMode};
use crate::domain::ports::{ChartSurface, DataSource};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Message shown to the user when the dataset could not be loaded.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownReport {
    pub aborted_fetch: bool,
    pub released_charts: usize,
}

/// The mounted dashboard: one dataset slot, one in-flight fetch, one set of charts.
///
/// Every dataset or config change runs a full render pass. Teardown aborts the
/// fetch and releases every chart, after which no further state changes are applied.
pub struct Dashboard<S: ChartSurface> {
    configs: Vec<ChartConfig>,
    state: DatasetState,
    renderer: ChartRenderer<S>,
    fetch: Option<JoinHandle<Result<serde_json::Value>>>,
    last_report: RenderReport,
    render_passes: usize,
    torn_down: bool,
}

impl<S: ChartSurface> Dashboard<S> {
    /// Spawn the dataset fetch and draw the initial (empty) charts.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount<D: DataSource + 'static>(
        source: Arc<D>,
        surface: S,
        configs: Vec<ChartConfig>,
        label_mode: LabelMode,
    ) -> Self {
        tracing::info!("📡 Fetching dashboard data from {}", source.describe());
        let fetch = tokio::spawn(async move { source.fetch().await });

        let mut dashboard = Self {
            configs,
            state: DatasetState::Absent,
            renderer: ChartRenderer::new(surface, label_mode),
            fetch: Some(fetch),
            last_report: RenderReport::default(),
            render_passes: 0,
            torn_down: false,
        };
        dashboard.rerender();
        dashboard
    }

    /// Wait for the in-flight fetch and apply its outcome.
    pub async fn settle(&mut self) -> &DatasetState {
        let Some(task) = self.fetch.take() else {
            return &self.state;
        };

        match task.await {
            Ok(Ok(dataset)) => {
                match dataset.as_array() {
                    Some(records) => tracing::info!("✅ Loaded {} records", records.len()),
                    None => tracing::warn!("Loaded dataset is not an array"),
                }
                self.set_dataset(DatasetState::loaded(dataset));
            }
            Ok(Err(e)) => self.record_failure(&e.to_string()),
            Err(e) => self.record_failure(&format!("fetch task did not complete: {}", e)),
        }

        &self.state
    }

    fn record_failure(&mut self, cause: &str) {
        tracing::error!("❌ {}: {}", FETCH_ERROR_MESSAGE, cause);
        // 資料集仍是空的，沿用掛載時畫好的空圖表
        self.state = DatasetState::Failed(FETCH_ERROR_MESSAGE.to_string());
    }

    /// Replace the dataset and redraw every chart.
    pub fn set_dataset(&mut self, state: DatasetState) -> &RenderReport {
        if self.torn_down {
            tracing::warn!("Ignoring dataset update on a torn-down dashboard");
            return &self.last_report;
        }
        self.state = state;
        self.rerender()
    }

    /// Replace the chart configuration list and redraw.
    pub fn set_configs(&mut self, configs: Vec<ChartConfig>) -> &RenderReport {
        if self.torn_down {
            tracing::warn!("Ignoring config update on a torn-down dashboard");
            return &self.last_report;
        }
        self.configs = configs;
        self.rerender()
    }

    /// Run one render pass against the current dataset.
    pub fn rerender(&mut self) -> &RenderReport {
        if self.torn_down {
            tracing::warn!("Ignoring render request on a torn-down dashboard");
            return &self.last_report;
        }
        self.last_report = self.renderer.render(self.state.dataset(), &self.configs);
        self.render_passes += 1;
        &self.last_report
    }

    /// Abort the fetch if still running and destroy every chart.
    pub fn teardown(&mut self) -> TeardownReport {
        let aborted_fetch = match self.fetch.take() {
            Some(task) if !task.is_finished() => {
                task.abort();
                tracing::debug!("Aborted in-flight dataset fetch");
                true
            }
            _ => false,
        };

        let released_charts = self.renderer.teardown();
        self.torn_down = true;

        TeardownReport {
            aborted_fetch,
            released_charts,
        }
    }

    pub fn state(&self) -> &DatasetState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn configs(&self) -> &[ChartConfig] {
        &self.configs
    }

    pub fn last_report(&self) -> &RenderReport {
        &self.last_report
    }

    pub fn render_passes(&self) -> usize {
        self.render_passes
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn label_mode(&self) -> LabelMode {
        self.renderer.label_mode()
    }

    pub fn live_charts(&self) -> usize {
        self.renderer.live_charts()
    }

    pub fn surface(&self) -> &S {
        self.renderer.surface()
    }
}

impl<S: ChartSurface> Drop for Dashboard<S> {
    fn drop(&mut self) {
        if let Some(task) = self.fetch.take() {
            task.abort();
        }
    }
}
