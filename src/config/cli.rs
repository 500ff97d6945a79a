use crate::core::{ChartConfig, ConfigProvider, LabelMode};
use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "small-dashboard")]
#[command(about = "Render the dashboard charts from the backend dataset")]
pub struct CliConfig {
    #[arg(long, env = "DASHBOARD_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, default_value = "./dashboard")]
    pub output_path: String,

    #[arg(long, value_enum, default_value = "counts")]
    pub label_mode: LabelMode,

    #[arg(long, default_value = "525")]
    pub width: u32,

    #[arg(long, default_value = "500")]
    pub height: u32,

    #[arg(long, help = "Request timeout in seconds (no timeout when omitted)")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Also bundle every output file into dashboard.zip")]
    pub archive: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn label_mode(&self) -> LabelMode {
        self.label_mode
    }

    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn archive_enabled(&self) -> bool {
        self.archive
    }

    fn chart_configs(&self) -> Vec<ChartConfig> {
        ChartConfig::defaults()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| DashboardError::MissingConfigError {
                field: "base_url (--base-url or DASHBOARD_BASE_URL)".to_string(),
            })?;
        validation::validate_url("base_url", base_url)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_canvas_size(self.width, self.height)?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("timeout_seconds", timeout, 1)?;
        }
        Ok(())
    }
}
