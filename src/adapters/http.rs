use crate::domain::ports::DataSource;
use crate::utils::error::{DashboardError, Result};
use reqwest::Client;
use std::time::Duration;

/// Path of the dataset endpoint, appended to the configured base URL.
pub const DATA_PATH: &str = "/api/data";

/// Loads the dataset with a single GET, without retries or caching.
pub struct HttpDataSource {
    client: Client,
    endpoint: String,
}

impl HttpDataSource {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: data_endpoint(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub fn data_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), DATA_PATH)
}

#[async_trait::async_trait]
impl DataSource for HttpDataSource {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    async fn fetch(&self) -> Result<serde_json::Value> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            return Err(DashboardError::HttpStatusError {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = response.text().await?;
        let dataset: serde_json::Value = serde_json::from_str(&body)?;

        match dataset.as_array() {
            Some(records) => tracing::debug!("Received {} records", records.len()),
            None => tracing::debug!("Received a non-array dataset"),
        }

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_data_endpoint_joins_base_url() {
        assert_eq!(
            data_endpoint("http://localhost:5000"),
            "http://localhost:5000/api/data"
        );
        assert_eq!(
            data_endpoint("http://localhost:5000/"),
            "http://localhost:5000/api/data"
        );
    }

    #[tokio::test]
    async fn test_fetch_successful_api_response() {
        let server = MockServer::start();
        let mock_data = serde_json::json!([
            {"country": "India", "topic": ["oil", "gas"], "intensity": 6},
            {"country": "Japan", "topic": ["gas"], "intensity": 2}
        ]);

        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/data");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(mock_data.clone());
        });

        let source = HttpDataSource::new(&server.base_url(), None).unwrap();
        let result = source.fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(result, mock_data);
    }

    #[tokio::test]
    async fn test_fetch_keeps_non_array_body() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/data");
            then.status(200).json_body(serde_json::json!({"message": "ok"}));
        });

        let source = HttpDataSource::new(&server.base_url(), None).unwrap();
        let result = source.fetch().await.unwrap();

        api_mock.assert();
        assert!(result.is_object());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_fails() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/data");
            then.status(500);
        });

        let source = HttpDataSource::new(&server.base_url(), None).unwrap();
        let err = source.fetch().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(
            err,
            DashboardError::HttpStatusError { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_fails() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/data");
            then.status(200).body("<html>not json</html>");
        });

        let source = HttpDataSource::new(&server.base_url(), None).unwrap();
        let err = source.fetch().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, DashboardError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_fails() {
        let source =
            HttpDataSource::new("http://127.0.0.1:9", Some(Duration::from_secs(2))).unwrap();
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, DashboardError::ApiError(_)));
    }
}
