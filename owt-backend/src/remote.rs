//! OnlyWorlds world API client.
//!
//! Elements live at `{base_url}/{element_type}/{id}/`; credentials are sent
//! in the `API-Key` and `API-Pin` headers on every request.

use crate::backend::ElementBackend;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use owt_model::Element;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the world API, without trailing slash.
    pub base_url: String,
    /// World API key.
    pub api_key: String,
    /// World PIN.
    pub api_pin: String,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.onlyworlds.com/api/worldapi".to_string(),
            api_key: String::new(),
            api_pin: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Element backend over the remote world API.
pub struct RemoteBackend {
    config: ApiConfig,
    client: Client,
}

impl RemoteBackend {
    /// Creates a new client.
    pub fn new(config: ApiConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Whether both credentials are set.
    pub fn has_credentials(&self) -> bool {
        !self.config.api_key.is_empty() && !self.config.api_pin.is_empty()
    }

    fn collection_url(&self, element_type: &str) -> String {
        format!(
            "{}/{}/",
            self.config.base_url.trim_end_matches('/'),
            element_type
        )
    }

    fn element_url(&self, element_type: &str, id: &str) -> String {
        format!("{}{}/", self.collection_url(element_type), id)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("API-Key", &self.config.api_key)
            .header("API-Pin", &self.config.api_pin)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> BackendResult<Response> {
        self.authed(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("{what} failed: {e}")))
    }

    /// Maps non-success statuses onto the error taxonomy.
    async fn check(
        response: Response,
        element_type: &str,
        id: Option<&str>,
    ) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => BackendError::NotFound {
                element_type: element_type.to_string(),
                id: id.unwrap_or_default().to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                BackendError::Validation(body)
            }
            other => BackendError::Http {
                status: other.as_u16(),
                body,
            },
        })
    }

    async fn parse_element(response: Response, element_type: &str) -> BackendResult<Element> {
        let value: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Network(format!("failed to parse element: {e}")))?;
        Ok(Element::from_json(element_type, value)?)
    }
}

#[async_trait]
impl ElementBackend for RemoteBackend {
    fn backend_name(&self) -> &'static str {
        "OnlyWorlds API"
    }

    async fn get_element(&self, element_type: &str, id: &str) -> BackendResult<Element> {
        debug!("GET {element_type}/{id}");
        let request = self.client.get(self.element_url(element_type, id));
        let response = self.send(request, "get element").await?;
        let response = Self::check(response, element_type, Some(id)).await?;
        Self::parse_element(response, element_type).await
    }

    async fn list_elements(&self, element_type: &str) -> BackendResult<Vec<Element>> {
        debug!("GET {element_type}/");
        let request = self.client.get(self.collection_url(element_type));
        let response = self.send(request, "list elements").await?;
        let response = Self::check(response, element_type, None).await?;
        let values: Vec<Value> = response
            .json()
            .await
            .map_err(|e| BackendError::Network(format!("failed to parse element list: {e}")))?;
        values
            .into_iter()
            .map(|v| Element::from_json(element_type, v).map_err(Into::into))
            .collect()
    }

    async fn create_element(
        &self,
        element_type: &str,
        fields: &Map<String, Value>,
    ) -> BackendResult<Element> {
        let request = self.client.post(self.collection_url(element_type)).json(fields);
        let response = self.send(request, "create element").await?;
        let response = Self::check(response, element_type, None).await?;
        let element = Self::parse_element(response, element_type).await?;
        info!("Created {} {}", element_type, element.id);
        Ok(element)
    }

    async fn update_element(
        &self,
        element_type: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> BackendResult<Element> {
        debug!("PATCH {element_type}/{id} ({} fields)", updates.len());
        let request = self.client.patch(self.element_url(element_type, id)).json(updates);
        let response = self.send(request, "update element").await?;
        let response = Self::check(response, element_type, Some(id)).await?;
        Self::parse_element(response, element_type).await
    }

    async fn delete_element(&self, element_type: &str, id: &str) -> BackendResult<()> {
        let request = self.client.delete(self.element_url(element_type, id));
        let response = self.send(request, "delete element").await?;
        Self::check(response, element_type, Some(id)).await?;
        info!("Deleted {element_type} {id}");
        Ok(())
    }
}
