use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API responded with status {status} for {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Chart rendering failed: {message}")]
    RenderError { message: String },

    #[error("Canvas '{canvas_id}': {message}")]
    ChartError { canvas_id: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Rendering,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashboardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DashboardError::ApiError(_) | DashboardError::HttpStatusError { .. } => {
                ErrorCategory::Network
            }
            DashboardError::ConfigError { .. }
            | DashboardError::ConfigValidationError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DashboardError::RenderError { .. } | DashboardError::ChartError { .. } => {
                ErrorCategory::Rendering
            }
            DashboardError::IoError(_) | DashboardError::ZipError(_) => ErrorCategory::Storage,
            DashboardError::CsvError(_)
            | DashboardError::SerializationError(_)
            | DashboardError::ProcessingError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 儀表板在抓取失敗時仍會輸出空圖表
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Rendering => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DashboardError::ApiError(_) | DashboardError::HttpStatusError { .. } => {
                "Check that the backend is running and that the base URL points at it"
            }
            DashboardError::ConfigError { .. }
            | DashboardError::ConfigValidationError { .. }
            | DashboardError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            DashboardError::MissingConfigError { .. } => {
                "Provide the missing value via CLI flag, environment or config file"
            }
            DashboardError::IoError(_) | DashboardError::ZipError(_) => {
                "Make sure the output directory exists and is writable"
            }
            DashboardError::RenderError { .. } | DashboardError::ChartError { .. } => {
                "Check the canvas size and chart configuration"
            }
            DashboardError::CsvError(_)
            | DashboardError::SerializationError(_)
            | DashboardError::ProcessingError { .. } => {
                "Inspect the dataset returned by the backend with --verbose"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not load dashboard data: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Rendering => format!("Could not draw charts: {}", self),
            ErrorCategory::Storage => format!("Could not write dashboard output: {}", self),
            ErrorCategory::Data => format!("Could not process dashboard data: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_is_network_medium() {
        let err = DashboardError::HttpStatusError {
            status: 503,
            url: "http://localhost/api/data".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = DashboardError::MissingConfigError {
            field: "source.base_url".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }
}
