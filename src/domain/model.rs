use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Chart.js 風格的圖表種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Doughnut,
    PolarArea,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Doughnut => "doughnut",
            ChartKind::PolarArea => "polarArea",
        }
    }

    /// Pie, doughnut and polar-area charts are drawn around a center point.
    pub fn is_radial(&self) -> bool {
        matches!(
            self,
            ChartKind::Pie | ChartKind::Doughnut | ChartKind::PolarArea
        )
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binds one record field to a chart kind and the canvas it is drawn on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub id: String,
    pub label: String,
    pub field: String,
    pub kind: ChartKind,
}

impl ChartConfig {
    pub fn new(id: &str, label: &str, field: &str, kind: ChartKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field: field.to_string(),
            kind,
        }
    }

    /// The eight charts shown on the dashboard, in display order.
    pub fn defaults() -> Vec<ChartConfig> {
        vec![
            ChartConfig::new("intensityChart", "Intensity by Region", "region", ChartKind::Pie),
            ChartConfig::new("likelihoodChart", "Likelihood by Country", "country", ChartKind::Bar),
            ChartConfig::new("relevanceChart", "Relevance by Country", "topic", ChartKind::Line),
            ChartConfig::new("topicsChart", "Topics", "relevance", ChartKind::Bar),
            ChartConfig::new("cityChart", "City", "intensity", ChartKind::Line),
            ChartConfig::new("regionChart", "Region", "intensity", ChartKind::Pie),
            ChartConfig::new("yearChart", "Year", "start_year", ChartKind::Doughnut),
            ChartConfig::new("countryChart", "Country", "country", ChartKind::PolarArea),
        ]
    }
}

/// How aggregated entries map onto chart labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LabelMode {
    /// Counts used as both labels and series values (dashboard's historical output).
    #[default]
    Counts,
    /// Category keys as labels, counts as series values.
    Categories,
}

/// Frequency count for one field, highest counts first, at most [`Aggregation::MAX_KEYS`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub entries: Vec<(String, u64)>,
}

impl Aggregation {
    pub const MAX_KEYS: usize = 10;

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn counts(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|(_, c)| *c)
    }

    pub fn total(&self) -> u64 {
        self.counts().sum()
    }
}

/// The single dataset slot owned by the dashboard.
#[derive(Debug, Clone, Default)]
pub enum DatasetState {
    #[default]
    Absent,
    Loaded(Arc<serde_json::Value>),
    Failed(String),
}

impl DatasetState {
    pub fn loaded(value: serde_json::Value) -> Self {
        DatasetState::Loaded(Arc::new(value))
    }

    pub fn dataset(&self) -> Option<&serde_json::Value> {
        match self {
            DatasetState::Loaded(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DatasetState::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn record_count(&self) -> Option<usize> {
        self.dataset()
            .and_then(|value| value.as_array())
            .map(|records| records.len())
    }
}

/// Everything a surface needs to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSpec {
    pub fn from_aggregation(config: &ChartConfig, aggregation: &Aggregation, mode: LabelMode) -> Self {
        let values: Vec<f64> = aggregation.counts().map(|c| c as f64).collect();
        let labels = match mode {
            LabelMode::Counts => aggregation.counts().map(|c| c.to_string()).collect(),
            LabelMode::Categories => aggregation.keys().map(str::to_string).collect(),
        };

        Self {
            title: config.label.clone(),
            kind: config.kind,
            labels,
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Handle to a chart instance drawn on a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle {
    pub canvas_id: String,
    pub instance_id: u64,
    pub kind: ChartKind,
}
