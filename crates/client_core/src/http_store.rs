use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Deal, DealId},
    error::{ApiError, ApiErrorBody, ErrorCode},
    protocol::{DealCreate, DealListResponse, DealUpdate},
};
use tracing::debug;
use url::Url;

use crate::{
    error::StoreError,
    store::{MoveCommand, RemoteDealStore},
};

/// Deal store backed by the deal REST API.
///
/// `base_url` is the API root, e.g. `http://127.0.0.1:8000/api`; deal routes
/// live under `{base_url}/deals`.
#[derive(Debug, Clone)]
pub struct HttpDealStore {
    http: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpDealStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, StoreError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|err| StoreError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::InvalidUrl {
                url: base_url.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn deals_url(&self) -> String {
        format!("{}/deals", self.base_url)
    }

    fn deal_url(&self, id: DealId) -> String {
        format!("{}/deals/{id}", self.base_url)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl RemoteDealStore for HttpDealStore {
    async fn list(&self) -> Result<Vec<Deal>, StoreError> {
        let response = self.request(Method::GET, self.deals_url()).send().await?;
        let body: DealListResponse = read_json(response).await?;
        debug!(count = body.items.len(), total = body.total, "fetched deals");
        Ok(body.items)
    }

    async fn get(&self, id: DealId) -> Result<Deal, StoreError> {
        let response = self.request(Method::GET, self.deal_url(id)).send().await?;
        read_json(response).await
    }

    async fn create(&self, payload: DealCreate) -> Result<Deal, StoreError> {
        let response = self
            .request(Method::POST, self.deals_url())
            .json(&payload)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update(&self, id: DealId, patch: DealUpdate) -> Result<Deal, StoreError> {
        let response = self
            .request(Method::PATCH, self.deal_url(id))
            .json(&patch)
            .send()
            .await?;
        read_json(response).await
    }

    async fn move_deal(&self, command: &MoveCommand) -> Result<Deal, StoreError> {
        debug!(
            deal_id = %command.deal_id,
            stage = %command.target_stage,
            position = command.target_position,
            "sending move"
        );
        let response = self
            .request(
                Method::PATCH,
                format!("{}/move", self.deal_url(command.deal_id)),
            )
            .json(&command.request())
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete(&self, id: DealId) -> Result<(), StoreError> {
        let response = self.request(Method::DELETE, self.deal_url(id)).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let response = check_status(response).await?;
    Ok(response.json::<T>().await?)
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Api(api_error_from_body(status, &body)))
}

fn api_error_from_body(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|body| body.message())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    ApiError::new(ErrorCode::from_status(status.as_u16()), message)
}

#[cfg(test)]
#[path = "tests/http_store_tests.rs"]
mod tests;
