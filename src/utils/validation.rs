use crate::domain::model::ChartConfig;
use crate::utils::error::{DashboardError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DashboardError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 畫布尺寸限制
pub const MIN_CANVAS_SIDE: u32 = 50;
pub const MAX_CANVAS_SIDE: u32 = 4096;

pub fn validate_canvas_size(width: u32, height: u32) -> Result<()> {
    validate_range("render.width", width, MIN_CANVAS_SIDE, MAX_CANVAS_SIDE)?;
    validate_range("render.height", height, MIN_CANVAS_SIDE, MAX_CANVAS_SIDE)
}

/// 圖表 id 必須唯一，每張圖都要有欄位名稱
pub fn validate_chart_configs(field_name: &str, configs: &[ChartConfig]) -> Result<()> {
    if configs.is_empty() {
        return Err(DashboardError::ConfigValidationError {
            field: field_name.to_string(),
            message: "At least one chart must be configured".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for config in configs {
        validate_non_empty_string(&format!("{}.id", field_name), &config.id)?;
        validate_non_empty_string(&format!("{}.field", field_name), &config.field)?;

        if !seen.insert(config.id.as_str()) {
            return Err(DashboardError::InvalidConfigValueError {
                field: format!("{}.id", field_name),
                value: config.id.clone(),
                reason: "Chart ids must be unique".to_string(),
            });
        }
    }

    Ok(())
}
