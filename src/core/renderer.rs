use crate::core::aggregate::aggregate;
use crate::domain::model::{Aggregation, ChartConfig, ChartHandle, ChartSpec, LabelMode};
use crate::domain::ports::ChartSurface;
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of one render pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderReport {
    pub charts: Vec<RenderedChart>,
    /// Prior instances torn down through `destroy`.
    pub destroyed: usize,
    /// Canvases removed through the `detach` fallback.
    pub detached: usize,
}

impl RenderReport {
    pub fn displayed(&self) -> usize {
        self.charts.iter().filter(|c| c.displayed).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedChart {
    pub config: ChartConfig,
    pub aggregation: Aggregation,
    pub displayed: bool,
}

/// Owns every chart instance on a surface and rebuilds them on each pass.
pub struct ChartRenderer<S: ChartSurface> {
    surface: S,
    handles: HashMap<String, ChartHandle>,
    label_mode: LabelMode,
}

impl<S: ChartSurface> ChartRenderer<S> {
    pub fn new(surface: S, label_mode: LabelMode) -> Self {
        Self {
            surface,
            handles: HashMap::new(),
            label_mode,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn label_mode(&self) -> LabelMode {
        self.label_mode
    }

    pub fn live_charts(&self) -> usize {
        self.handles.len()
    }

    pub fn handle(&self, canvas_id: &str) -> Option<&ChartHandle> {
        self.handles.get(canvas_id)
    }

    /// Destroy and redraw every configured chart against `dataset`.
    pub fn render(&mut self, dataset: Option<&serde_json::Value>, configs: &[ChartConfig]) -> RenderReport {
        let mut report = RenderReport::default();

        // 已不在設定清單中的畫布也要清掉
        let stale: Vec<String> = self
            .handles
            .keys()
            .filter(|id| !configs.iter().any(|c| &c.id == *id))
            .cloned()
            .collect();
        for canvas_id in stale {
            self.release(&canvas_id, &mut report);
        }

        for config in configs {
            self.release(&config.id, &mut report);

            let aggregation = aggregate(dataset, &config.field);
            let spec = ChartSpec::from_aggregation(config, &aggregation, self.label_mode);

            let displayed = match self.surface.draw(&config.id, &spec) {
                Ok(handle) => {
                    self.handles.insert(config.id.clone(), handle);
                    true
                }
                Err(e) => {
                    tracing::error!("❌ Failed to draw '{}' ({}): {}", config.id, config.kind, e);
                    false
                }
            };

            report.charts.push(RenderedChart {
                config: config.clone(),
                aggregation,
                displayed,
            });
        }

        tracing::debug!(
            "Render pass finished: {} displayed, {} destroyed, {} detached",
            report.displayed(),
            report.destroyed,
            report.detached
        );
        report
    }

    /// Destroy every live chart. Returns how many instances were released.
    pub fn teardown(&mut self) -> usize {
        let mut report = RenderReport::default();
        let ids: Vec<String> = self.handles.keys().cloned().collect();
        for canvas_id in ids {
            self.release(&canvas_id, &mut report);
        }
        report.destroyed + report.detached
    }

    fn release(&mut self, canvas_id: &str, report: &mut RenderReport) {
        let Some(handle) = self.handles.remove(canvas_id) else {
            return;
        };

        match self.surface.destroy(&handle) {
            Ok(()) => report.destroyed += 1,
            Err(e) => {
                tracing::warn!("Destroy failed for '{}', detaching canvas: {}", canvas_id, e);
                self.surface.detach(canvas_id);
                report.detached += 1;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::model::ChartKind;
    use crate::utils::error::{DashboardError, Result};
    use serde_json::json;

    /// Surface that records every lifecycle call.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        next_id: u64,
        pub live: HashMap<String, u64>,
        pub drawn: Vec<(String, ChartSpec)>,
        pub destroyed: Vec<u64>,
        pub detached: Vec<String>,
        pub fail_destroy: bool,
        pub fail_draw_for: Option<String>,
    }

    impl ChartSurface for RecordingSurface {
        fn draw(&mut self, canvas_id: &str, spec: &ChartSpec) -> Result<ChartHandle> {
            if self.fail_draw_for.as_deref() == Some(canvas_id) {
                return Err(DashboardError::ChartError {
                    canvas_id: canvas_id.to_string(),
                    message: "canvas missing".to_string(),
                });
            }
            if self.live.contains_key(canvas_id) {
                panic!("canvas '{}' already holds a chart", canvas_id);
            }
            self.next_id += 1;
            self.live.insert(canvas_id.to_string(), self.next_id);
            self.drawn.push((canvas_id.to_string(), spec.clone()));
            Ok(ChartHandle {
                canvas_id: canvas_id.to_string(),
                instance_id: self.next_id,
                kind: spec.kind,
            })
        }

        fn destroy(&mut self, handle: &ChartHandle) -> Result<()> {
            if self.fail_destroy {
                return Err(DashboardError::ChartError {
                    canvas_id: handle.canvas_id.clone(),
                    message: "destroy unsupported".to_string(),
                });
            }
            assert!(
                !self.destroyed.contains(&handle.instance_id),
                "instance destroyed twice"
            );
            self.live.remove(&handle.canvas_id);
            self.destroyed.push(handle.instance_id);
            Ok(())
        }

        fn detach(&mut self, canvas_id: &str) {
            self.live.remove(canvas_id);
            self.detached.push(canvas_id.to_string());
        }
    }

    #[test]
    fn test_first_pass_draws_every_config() {
        let mut renderer = ChartRenderer::new(RecordingSurface::default(), LabelMode::Counts);
        let configs = ChartConfig::defaults();

        let report = renderer.render(None, &configs);

        assert_eq!(report.displayed(), 8);
        assert_eq!(report.destroyed, 0);
        assert_eq!(renderer.live_charts(), 8);
        assert!(report.charts.iter().all(|c| c.aggregation.is_empty()));
    }

    #[test]
    fn test_rerender_destroys_each_instance_exactly_once() {
        let mut renderer = ChartRenderer::new(RecordingSurface::default(), LabelMode::Counts);
        let configs = ChartConfig::defaults();
        let dataset = json!([{"country": "A", "region": "Asia"}]);

        renderer.render(Some(&dataset), &configs);
        let first_ids: Vec<u64> = renderer.surface().live.values().copied().collect();

        let report = renderer.render(Some(&dataset), &configs);
        renderer.render(Some(&dataset), &configs);

        let surface = renderer.surface();
        assert_eq!(report.destroyed, 8);
        assert_eq!(surface.destroyed.len(), 16);
        assert_eq!(surface.live.len(), 8);
        assert_eq!(surface.drawn.len(), 24);
        for id in first_ids {
            assert_eq!(surface.destroyed.iter().filter(|d| **d == id).count(), 1);
        }
    }

    #[test]
    fn test_destroy_failure_falls_back_to_detach() {
        let surface = RecordingSurface {
            fail_destroy: true,
            ..Default::default()
        };
        let mut renderer = ChartRenderer::new(surface, LabelMode::Counts);
        let configs = ChartConfig::defaults();

        renderer.render(None, &configs);
        let report = renderer.render(None, &configs);

        assert_eq!(report.destroyed, 0);
        assert_eq!(report.detached, 8);
        assert_eq!(renderer.surface().detached.len(), 8);
        assert_eq!(renderer.live_charts(), 8);
    }

    #[test]
    fn test_draw_failure_does_not_abort_pass() {
        let surface = RecordingSurface {
            fail_draw_for: Some("cityChart".to_string()),
            ..Default::default()
        };
        let mut renderer = ChartRenderer::new(surface, LabelMode::Counts);

        let report = renderer.render(None, &ChartConfig::defaults());

        assert_eq!(report.displayed(), 7);
        assert!(renderer.handle("cityChart").is_none());
        assert!(renderer.handle("yearChart").is_some());
    }

    #[test]
    fn test_removed_configs_are_destroyed() {
        let mut renderer = ChartRenderer::new(RecordingSurface::default(), LabelMode::Counts);
        renderer.render(None, &ChartConfig::defaults());

        let only_year = vec![ChartConfig::new("yearChart", "Year", "start_year", ChartKind::Doughnut)];
        let report = renderer.render(None, &only_year);

        assert_eq!(report.destroyed, 8);
        assert_eq!(renderer.live_charts(), 1);
        assert_eq!(renderer.surface().live.len(), 1);
    }

    #[test]
    fn test_label_modes_reach_the_surface() {
        let dataset = json!([{"country": "India"}, {"country": "India"}, {"country": "USA"}]);
        let configs = vec![ChartConfig::new("countryChart", "Country", "country", ChartKind::PolarArea)];

        let mut literal = ChartRenderer::new(RecordingSurface::default(), LabelMode::Counts);
        literal.render(Some(&dataset), &configs);
        let (_, spec) = &literal.surface().drawn[0];
        assert_eq!(spec.labels, vec!["2", "1"]);
        assert_eq!(spec.values, vec![2.0, 1.0]);

        let mut corrected = ChartRenderer::new(RecordingSurface::default(), LabelMode::Categories);
        corrected.render(Some(&dataset), &configs);
        let (_, spec) = &corrected.surface().drawn[0];
        assert_eq!(spec.labels, vec!["India", "USA"]);
    }

    #[test]
    fn test_teardown_releases_all_charts() {
        let mut renderer = ChartRenderer::new(RecordingSurface::default(), LabelMode::Counts);
        renderer.render(None, &ChartConfig::defaults());

        assert_eq!(renderer.teardown(), 8);
        assert_eq!(renderer.live_charts(), 0);
        assert!(renderer.surface().live.is_empty());
        assert_eq!(renderer.teardown(), 0);
    }
}
