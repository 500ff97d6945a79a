use crate::adapters::svg::SvgSurface;
use crate::core::dashboard::Dashboard;
use crate::domain::model::{ChartKind, LabelMode};
use crate::domain::ports::Storage;
use crate::utils::error::{DashboardError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const INDEX_FILE: &str = "index.html";
pub const AGGREGATIONS_JSON_FILE: &str = "aggregations.json";
pub const AGGREGATIONS_CSV_FILE: &str = "aggregations.csv";
pub const ARCHIVE_FILE: &str = "dashboard.zip";

#[derive(Debug, Clone)]
pub struct BundleFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// Files describing one rendered dashboard, ready to be written to storage.
#[derive(Debug, Clone, Default)]
pub struct DashboardBundle {
    pub files: Vec<BundleFile>,
}

impl DashboardBundle {
    fn push(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.files.push(BundleFile {
            name: name.into(),
            data,
        });
    }

    pub fn file(&self, name: &str) -> Option<&BundleFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }
}

#[derive(Debug, Serialize)]
struct DashboardSummary<'a> {
    generated_at: String,
    label_mode: LabelMode,
    records: Option<usize>,
    error: Option<&'a str>,
    charts: Vec<ChartSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct ChartSummary<'a> {
    id: &'a str,
    label: &'a str,
    field: &'a str,
    kind: ChartKind,
    displayed: bool,
    entries: Vec<EntrySummary<'a>>,
}

#[derive(Debug, Serialize)]
struct EntrySummary<'a> {
    key: &'a str,
    count: u64,
}

#[derive(Debug, Serialize)]
struct AggregationRow<'a> {
    chart_id: &'a str,
    field: &'a str,
    rank: usize,
    key: &'a str,
    count: u64,
}

/// Collect SVG canvases, the HTML page and aggregation exports from the last render pass.
pub fn build_bundle(
    dashboard: &Dashboard<SvgSurface>,
    generated_at: DateTime<Utc>,
) -> Result<DashboardBundle> {
    let mut bundle = DashboardBundle::default();
    let surface = dashboard.surface();

    for config in dashboard.configs() {
        match surface.svg(&config.id) {
            Some(svg) => bundle.push(format!("{}.svg", config.id), svg.as_bytes().to_vec()),
            None => tracing::warn!("Canvas '{}' holds no chart, skipping", config.id),
        }
    }

    bundle.push(
        INDEX_FILE,
        render_index(dashboard, generated_at).into_bytes(),
    );
    bundle.push(
        AGGREGATIONS_JSON_FILE,
        aggregations_json(dashboard, generated_at)?,
    );
    bundle.push(AGGREGATIONS_CSV_FILE, aggregations_csv(dashboard)?);

    tracing::debug!("Bundle contains {} files", bundle.files.len());
    Ok(bundle)
}

fn aggregations_json(dashboard: &Dashboard<SvgSurface>, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let charts = dashboard
        .last_report()
        .charts
        .iter()
        .map(|chart| ChartSummary {
            id: &chart.config.id,
            label: &chart.config.label,
            field: &chart.config.field,
            kind: chart.config.kind,
            displayed: chart.displayed,
            entries: chart
                .aggregation
                .entries
                .iter()
                .map(|(key, count)| EntrySummary { key, count: *count })
                .collect(),
        })
        .collect();

    let summary = DashboardSummary {
        generated_at: generated_at.to_rfc3339(),
        label_mode: dashboard.label_mode(),
        records: dashboard.state().record_count(),
        error: dashboard.error(),
        charts,
    };

    Ok(serde_json::to_vec_pretty(&summary)?)
}

fn aggregations_csv(dashboard: &Dashboard<SvgSurface>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for chart in &dashboard.last_report().charts {
        for (rank, (key, count)) in chart.aggregation.entries.iter().enumerate() {
            writer.serialize(AggregationRow {
                chart_id: &chart.config.id,
                field: &chart.config.field,
                rank: rank + 1,
                key,
                count: *count,
            })?;
        }
    }

    // 沒有任何資料列時 serialize 不會寫標題，手動補上
    if dashboard.last_report().charts.iter().all(|c| c.aggregation.is_empty()) {
        writer.write_record(["chart_id", "field", "rank", "key", "count"])?;
    }

    writer
        .into_inner()
        .map_err(|e| DashboardError::ProcessingError {
            message: format!("Failed to finish CSV export: {}", e),
        })
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn render_index(dashboard: &Dashboard<SvgSurface>, generated_at: DateTime<Utc>) -> String {
    let surface = dashboard.surface();
    let mut cards = String::new();

    for config in dashboard.configs() {
        let label = escape_html(&config.label);
        let id = escape_html(&config.id);
        let body = match (surface.svg(&config.id), surface.canvas_size(&config.id)) {
            (Some(_), Some((width, height))) => format!(
                r#"<img id="{id}" src="{id}.svg" width="{width}" height="{height}" role="img" alt="{label}">"#
            ),
            _ => r#"<p class="card-empty">Chart unavailable</p>"#.to_string(),
        };

        cards.push_str(&format!(
            r#"    <div class="card">
      <h4 class="card-title">{label}</h4>
      <div class="card-text">{body}</div>
    </div>
"#
        ));
    }

    let banner = dashboard
        .error()
        .map(|message| format!(r#"  <div class="error" role="alert">{}</div>"#, escape_html(message)) + "\n")
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Dashboard</title>
  <style>
    .dashboard {{ display: flex; flex-wrap: wrap; gap: 16px; }}
    .card {{ flex: 1 1 45%; box-shadow: 0 2px 4px rgba(0,0,0,.2); padding: 12px; }}
    .error {{ color: #9c0006; background: #ffc7ce; padding: 8px; margin-bottom: 12px; }}
  </style>
</head>
<body>
{banner}  <div class="dashboard">
{cards}  </div>
  <footer>Generated {generated}</footer>
</body>
</html>
"#,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

/// Pack every bundle file into a single ZIP archive.
pub fn archive_bundle(bundle: &DashboardBundle) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for file in &bundle.files {
        zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
        zip.write_all(&file.data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Write the bundle (and optionally its archive) to storage, returning the written names.
pub async fn write_bundle<S: Storage>(
    storage: &S,
    bundle: &DashboardBundle,
    archive: bool,
) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(bundle.files.len() + 1);

    for file in &bundle.files {
        tracing::debug!("Writing {} ({} bytes)", file.name, file.data.len());
        storage.write_file(&file.name, &file.data).await?;
        written.push(file.name.clone());
    }

    if archive {
        let zip_data = archive_bundle(bundle)?;
        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        storage.write_file(ARCHIVE_FILE, &zip_data).await?;
        written.push(ARCHIVE_FILE.to_string());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::svg::DEFAULT_CANVAS_SIZE;
    use crate::domain::model::{ChartConfig, DatasetState};
    use crate::domain::ports::DataSource;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                DashboardError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct NeverSource;

    #[async_trait::async_trait]
    impl DataSource for NeverSource {
        fn describe(&self) -> String {
            "never".to_string()
        }

        async fn fetch(&self) -> Result<serde_json::Value> {
            std::future::pending().await
        }
    }

    fn rendered_dashboard(state: DatasetState) -> Dashboard<SvgSurface> {
        let configs = ChartConfig::defaults();
        let surface = SvgSurface::new(DEFAULT_CANVAS_SIZE, configs.iter().map(|c| c.id.as_str()));
        let mut dashboard = Dashboard::mount(
            Arc::new(NeverSource),
            surface,
            configs,
            LabelMode::Categories,
        );
        dashboard.set_dataset(state);
        dashboard
    }

    fn sample_state() -> DatasetState {
        DatasetState::loaded(json!([
            {"country": "India", "region": "Asia", "start_year": 2017, "topic": ["oil"]},
            {"country": "India", "region": "Asia", "start_year": 2016, "topic": ["gas", "oil"]},
            {"country": "Mexico & Co", "region": "Central America", "intensity": 6}
        ]))
    }

    #[tokio::test]
    async fn test_bundle_contains_every_canvas_and_exports() {
        let dashboard = rendered_dashboard(sample_state());
        let bundle = build_bundle(&dashboard, Utc::now()).unwrap();

        let names = bundle.names();
        assert_eq!(names.len(), 11);
        for config in ChartConfig::defaults() {
            assert!(names.contains(&format!("{}.svg", config.id).as_str()));
        }
        assert!(names.contains(&INDEX_FILE));
        assert!(names.contains(&AGGREGATIONS_JSON_FILE));
        assert!(names.contains(&AGGREGATIONS_CSV_FILE));
    }

    #[tokio::test]
    async fn test_index_escapes_labels_and_links_canvases() {
        let mut dashboard = rendered_dashboard(sample_state());
        dashboard.set_configs(vec![ChartConfig::new(
            "countryChart",
            "Country <& region>",
            "country",
            ChartKind::PolarArea,
        )]);

        let bundle = build_bundle(&dashboard, Utc::now()).unwrap();
        let index = String::from_utf8(bundle.file(INDEX_FILE).unwrap().data.clone()).unwrap();

        assert!(index.contains("Country &lt;&amp; region&gt;"));
        assert!(index.contains(r#"src="countryChart.svg""#));
        assert!(!index.contains("role=\"alert\""));
    }

    #[tokio::test]
    async fn test_failed_dashboard_shows_single_error_banner() {
        let dashboard = rendered_dashboard(DatasetState::Failed("Failed to fetch data".to_string()));
        let bundle = build_bundle(&dashboard, Utc::now()).unwrap();
        let index = String::from_utf8(bundle.file(INDEX_FILE).unwrap().data.clone()).unwrap();

        assert_eq!(index.matches("role=\"alert\"").count(), 1);
        assert!(index.contains("Failed to fetch data"));

        let summary: serde_json::Value =
            serde_json::from_slice(&bundle.file(AGGREGATIONS_JSON_FILE).unwrap().data).unwrap();
        assert_eq!(summary["error"], "Failed to fetch data");
        assert!(summary["records"].is_null());
        assert_eq!(summary["charts"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_aggregation_exports() {
        let dashboard = rendered_dashboard(sample_state());
        let bundle = build_bundle(&dashboard, Utc::now()).unwrap();

        let summary: serde_json::Value =
            serde_json::from_slice(&bundle.file(AGGREGATIONS_JSON_FILE).unwrap().data).unwrap();
        assert_eq!(summary["records"], 3);
        assert_eq!(summary["label_mode"], "categories");
        let likelihood = &summary["charts"][1];
        assert_eq!(likelihood["id"], "likelihoodChart");
        assert_eq!(likelihood["kind"], "bar");
        assert_eq!(likelihood["entries"][0]["key"], "India");
        assert_eq!(likelihood["entries"][0]["count"], 2);

        let csv_text =
            String::from_utf8(bundle.file(AGGREGATIONS_CSV_FILE).unwrap().data.clone()).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(lines.next(), Some("chart_id,field,rank,key,count"));
        assert!(csv_text.contains("likelihoodChart,country,1,India,2"));
        assert!(csv_text.contains("relevanceChart,topic,1,oil,2"));
    }

    #[tokio::test]
    async fn test_empty_csv_still_has_header() {
        let dashboard = rendered_dashboard(DatasetState::Absent);
        let bundle = build_bundle(&dashboard, Utc::now()).unwrap();
        let csv_text =
            String::from_utf8(bundle.file(AGGREGATIONS_CSV_FILE).unwrap().data.clone()).unwrap();

        assert_eq!(csv_text.trim(), "chart_id,field,rank,key,count");
    }

    #[tokio::test]
    async fn test_write_bundle_with_archive() {
        let dashboard = rendered_dashboard(sample_state());
        let bundle = build_bundle(&dashboard, Utc::now()).unwrap();
        let storage = MockStorage::new();

        let written = write_bundle(&storage, &bundle, true).await.unwrap();
        assert_eq!(written.len(), bundle.files.len() + 1);
        assert_eq!(written.last().map(String::as_str), Some(ARCHIVE_FILE));

        let zip_bytes = storage.get_file(ARCHIVE_FILE).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), bundle.files.len());

        let mut svg = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("yearChart.svg").unwrap(), &mut svg)
            .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[tokio::test]
    async fn test_write_bundle_without_archive() {
        let dashboard = rendered_dashboard(DatasetState::Absent);
        let bundle = build_bundle(&dashboard, Utc::now()).unwrap();
        let storage = MockStorage::new();

        let written = write_bundle(&storage, &bundle, false).await.unwrap();

        assert!(!written.contains(&ARCHIVE_FILE.to_string()));
        assert!(storage.get_file(ARCHIVE_FILE).await.is_none());
        assert!(storage.get_file(INDEX_FILE).await.is_some());
    }
}
