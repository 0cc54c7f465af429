use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use pflow_core::{
    ClientError, ClientResult, CreateFlowInput, CreateWorkOrderInput, Flow, FlowApi, WorkOrder, WorkOrderApi, WorkOrderId,
};

use crate::config::HttpClientConfig;

/// Client for the remote engine's HTTP API
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    base_url: Url,
    client: Client,
}

impl HttpRemoteClient {
    /// Creates a client; fails if the base URL cannot carry resource paths
    pub fn new(config: HttpClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!("{}: not a base URL", config.base_url)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    pub fn with_url_and_timeout(base_url: impl Into<String>, timeout_secs: u64) -> ClientResult<Self> {
        Self::new(HttpClientConfig {
            base_url: base_url.into(),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Maps a reqwest error to a ClientError
    fn map_http_error(error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Transport(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ClientError::Transport(format!("Connection error: {}", error))
        } else if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Transport(format!("HTTP error: {}", error))
        }
    }

    /// Turns a non-2xx response into `ClientError::Status`
    async fn check_status(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| format!("HTTP error: {}", status));
        debug!(status = status.as_u16(), "Request rejected");
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl FlowApi for HttpRemoteClient {
    #[instrument(skip(self))]
    async fn list_flows(&self) -> ClientResult<Vec<Flow>> {
        let url = self.endpoint(&["flows"])?;
        debug!(%url, "Listing flows");

        let response = self.client.get(url).send().await.map_err(Self::map_http_error)?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, input), fields(name = %input.name, nodes = input.definition.nodes.len()))]
    async fn create_flow(&self, input: &CreateFlowInput) -> ClientResult<Flow> {
        let url = self.endpoint(&["flows"])?;
        debug!(%url, "Creating flow");

        let response = self
            .client
            .post(url)
            .json(input)
            .send()
            .await
            .map_err(Self::map_http_error)?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl WorkOrderApi for HttpRemoteClient {
    #[instrument(skip(self))]
    async fn list_work_orders(&self) -> ClientResult<Vec<WorkOrder>> {
        let url = self.endpoint(&["workorders"])?;
        debug!(%url, "Listing work orders");

        let response = self.client.get(url).send().await.map_err(Self::map_http_error)?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, input), fields(flow_id = %input.flow_id, title = %input.title))]
    async fn create_work_order(&self, input: &CreateWorkOrderInput) -> ClientResult<WorkOrder> {
        let url = self.endpoint(&["workorders"])?;
        debug!(%url, "Creating work order");

        let response = self
            .client
            .post(url)
            .json(input)
            .send()
            .await
            .map_err(Self::map_http_error)?;
        Self::read_json(response).await
    }

    #[instrument(skip(self), fields(work_order_id = %id))]
    async fn retry_work_order(&self, id: &WorkOrderId) -> ClientResult<()> {
        let url = self.endpoint(&["workorders", id.as_str(), "retry"])?;
        debug!(%url, "Retrying work order");

        let response = self.client.post(url).send().await.map_err(Self::map_http_error)?;
        Self::check_status(response).await.map(|_| ())
    }
}
