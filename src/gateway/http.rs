//! Power Automate management API client

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::Url;

use super::FetchGateway;
use super::wire::{FlowMetadata, FlowRecord, RunListResponse, RunRecord};
use crate::config::GatewayConfig;
use crate::error::{Error, GatewayError, Result};
use crate::retry::fetch_with_retry;
use crate::types::{Action, Run};

/// [`FetchGateway`] backed by the Power Automate management API
///
/// Every request carries the configured bearer token, except content downloads:
/// content locators are pre-signed URLs and are fetched as-is.
///
/// The flow definition, which supplies each step's type, is fetched alongside
/// the first step list and kept for the lifetime of the gateway (and its
/// clones). A failed definition fetch is not kept and is retried with the next
/// step list.
#[derive(Clone, Debug)]
pub struct HttpFetchGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    flow_url: Url,
    definition: Arc<OnceCell<FlowMetadata>>,
}

impl HttpFetchGateway {
    /// Validate the config and build the HTTP client
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::from)?;

        let flow_url = flow_url(&config)?;

        Ok(Self {
            client,
            config,
            flow_url,
            definition: Arc::new(OnceCell::new()),
        })
    }

    /// Most recent runs of the flow, newest first as the service returns them
    ///
    /// At most `runs_page_size` runs are requested.
    pub async fn fetch_runs(&self) -> Result<Vec<Run>> {
        let mut url = self.flow_url.clone();
        extend_path(&mut url, &["runs"]);
        url.query_pairs_mut()
            .append_pair("api-version", &self.config.api_version)
            .append_pair("$top", &self.config.runs_page_size.to_string());

        let body: RunListResponse = self.get_json(&url).await?;
        let runs = body
            .value
            .into_iter()
            .map(RunRecord::into_run)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(count = runs.len(), flow_id = %self.config.flow_id, "fetched runs");
        Ok(runs)
    }

    /// Step metadata from the flow definition, fetched once per gateway
    async fn flow_metadata(&self) -> std::result::Result<&FlowMetadata, GatewayError> {
        self.definition
            .get_or_try_init(|| async {
                let mut url = self.flow_url.clone();
                url.query_pairs_mut()
                    .append_pair("api-version", &self.config.api_version)
                    .append_pair("$expand", "definition,connectionReferences");

                let record: FlowRecord = self.get_json(&url).await?;
                let metadata = record.into_metadata();
                tracing::debug!(
                    flow_id = %self.config.flow_id,
                    steps = metadata.len(),
                    "fetched flow definition"
                );
                Ok(metadata)
            })
            .await
    }

    async fn get_json<T>(&self, url: &Url) -> std::result::Result<T, GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let client = &self.client;
        let token = self.config.access_token.as_str();

        fetch_with_retry(&self.config.retry, move || async move {
            let response = client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, "application/json")
                .bearer_auth(token)
                .send()
                .await
                .map_err(map_transport_error)?;

            let response = check_status(response)?;
            let bytes = response.bytes().await.map_err(map_transport_error)?;
            serde_json::from_slice::<T>(&bytes).map_err(GatewayError::from)
        })
        .await
    }
}

#[async_trait]
impl FetchGateway for HttpFetchGateway {
    async fn fetch_run_steps(
        &self,
        run_id: &str,
    ) -> std::result::Result<Vec<Action>, GatewayError> {
        let mut url = self.flow_url.clone();
        extend_path(&mut url, &["runs", run_id]);
        url.query_pairs_mut()
            .append_pair("api-version", &self.config.api_version)
            .append_pair("$expand", "properties/actions");

        let (record, metadata) =
            tokio::join!(self.get_json::<RunRecord>(&url), self.flow_metadata());
        let record = record?;
        let metadata = match metadata {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!(
                    run_id,
                    error = %e,
                    "flow definition unavailable, step types omitted"
                );
                None
            }
        };

        let actions = record.into_actions(metadata);
        tracing::debug!(run_id, count = actions.len(), "fetched run steps");
        Ok(actions)
    }

    async fn fetch_content(
        &self,
        locator: &str,
    ) -> std::result::Result<serde_json::Value, GatewayError> {
        let url = Url::parse(locator).map_err(|e| GatewayError::InvalidLocator {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;

        let client = &self.client;
        let url = &url;

        fetch_with_retry(&self.config.retry, move || async move {
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(map_transport_error)?;

            let response = check_status(response)?;
            let text = response.text().await.map_err(map_transport_error)?;

            // Some steps produce plain text rather than JSON
            Ok::<_, GatewayError>(
                serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
            )
        })
        .await
    }
}

/// `{api_base}/providers/Microsoft.ProcessSimple/environments/{env}/flows/{flow}`
fn flow_url(config: &GatewayConfig) -> Result<Url> {
    let mut url = Url::parse(&config.api_base).map_err(|e| Error::Config {
        message: format!("api_base is not a valid URL: {e}"),
        key: Some("api_base".to_string()),
    })?;
    if url.cannot_be_a_base() {
        return Err(Error::Config {
            message: "api_base cannot be used as a base URL".to_string(),
            key: Some("api_base".to_string()),
        });
    }
    extend_path(
        &mut url,
        &[
            "providers",
            "Microsoft.ProcessSimple",
            "environments",
            &config.environment_id,
            "flows",
            &config.flow_id,
        ],
    );
    Ok(url)
}

/// Append percent-encoded path segments
fn extend_path(url: &mut Url, segments: &[&str]) {
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
}

fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(GatewayError::Unauthorized);
    }
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(e)
    }
}
