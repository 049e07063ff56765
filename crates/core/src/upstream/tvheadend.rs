//! TVHeadend HTTP client for the EPG and channel grid endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::TvheadendConfig;

use super::{Channel, EpgEvent, EpgSource, GridPage, UpstreamError};

/// TVHeadend grid API client.
pub struct TvheadendClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl TvheadendClient {
    /// Create a new client from configuration.
    pub fn new(config: &TvheadendConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| UpstreamError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Build a grid URL with paging and sort parameters.
    fn grid_url(&self, path: &str, offset: usize, limit: usize, sort: &str) -> String {
        format!(
            "{}{}?start={}&limit={}&sort={}&dir=ASC",
            self.base_url,
            path,
            offset,
            limit,
            urlencoding::encode(sort)
        )
    }

    async fn get_grid<T: DeserializeOwned>(&self, url: &str) -> Result<GridPage<T>, UpstreamError> {
        debug!(url = url, "Requesting TVHeadend grid");

        let mut request = self.client.get(url);
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        response
            .json::<GridPage<T>>()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

/// Map a non-success HTTP status to an upstream error.
fn status_error(status: StatusCode, body: String) -> UpstreamError {
    let message: String = body.chars().take(200).collect();
    match status {
        StatusCode::BAD_REQUEST => UpstreamError::BadRequest(message),
        StatusCode::UNAUTHORIZED => UpstreamError::Authentication(message),
        StatusCode::FORBIDDEN => UpstreamError::Authorization(message),
        StatusCode::NOT_FOUND => UpstreamError::NotFound(message),
        _ => UpstreamError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl EpgSource for TvheadendClient {
    async fn events_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<GridPage<EpgEvent>, UpstreamError> {
        let url = self.grid_url("/api/epg/events/grid", offset, limit, "start");
        self.get_grid(&url).await
    }

    async fn channels_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<GridPage<Channel>, UpstreamError> {
        let url = self.grid_url("/api/channel/grid", offset, limit, "number");
        self.get_grid(&url).await
    }
}
