//! HTTP client for the order service

use super::error::parse_error_body;
use super::{ApiError, ApiFuture, ApiResult, PromoCodeCheck, PromoCodeValidation, StorefrontApi};
use crate::config::ApiConfig;
use crate::types::{Order, OrderId, OrderRequest};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Order service client over HTTP with JSON bodies
#[derive(Clone, Debug)]
pub struct StorefrontClient {
    client: Client,
    base_url: String,
}

impl StorefrontClient {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.as_str(), config.request_timeout)
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let errors = parse_error_body(status.as_u16(), &body);
    tracing::debug!(status = status.as_u16(), ?errors, "Order service rejected request");

    Err(ApiError::Rejected {
        status: status.as_u16(),
        errors,
    })
}

impl StorefrontApi for StorefrontClient {
    fn fetch_order(&self, order_id: &OrderId) -> ApiFuture<Order> {
        let this = self.clone();
        // Ids are opaque; keep them to a single path segment.
        let path = format!("orders/{}", urlencoding::encode(order_id.as_str()));
        Box::pin(async move { this.get(&path).await })
    }

    fn create_order(&self, request: OrderRequest) -> ApiFuture<Order> {
        let this = self.clone();
        Box::pin(async move { this.post("orders", &request).await })
    }

    fn validate_promo_code(&self, check: PromoCodeCheck) -> ApiFuture<PromoCodeValidation> {
        let this = self.clone();
        Box::pin(async move { this.post("promo-codes/validate", &check).await })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = StorefrontClient::new("http://localhost:8080/api/", Duration::from_secs(5))
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("orders"), "http://localhost:8080/api/orders");
    }
}
