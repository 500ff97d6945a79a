pub mod aggregate;
pub mod dashboard;
pub mod engine;
pub mod publish;
pub mod renderer;

pub use crate::domain::model::{
    Aggregation, ChartConfig, ChartHandle, ChartKind, ChartSpec, DatasetState, LabelMode,
};
pub use crate::domain::ports::{ChartSurface, ConfigProvider, DataSource, Storage};
pub use crate::utils::error::Result;
