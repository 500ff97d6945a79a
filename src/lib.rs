pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{storage::LocalStorage, toml_config::TomlConfig};

pub use adapters::{http::HttpDataSource, svg::SvgSurface};
pub use core::{
    aggregate::aggregate, dashboard::Dashboard, engine::DashboardEngine,
    renderer::ChartRenderer,
};
pub use domain::model::{Aggregation, ChartConfig, ChartKind, DatasetState, LabelMode};
pub use utils::error::{DashboardError, Result};
