//! Fetch gateway
//!
//! The export pipeline never talks to the network directly. Everything it needs
//! from the workflow service goes through the [`FetchGateway`] trait:
//!
//! - [`HttpFetchGateway`]: talks to the Power Automate management API with a
//!   bearer token supplied by the caller
//! - any test double or alternative transport implementing the trait
//!
//! Timeouts and retries are the gateway's business; the pipeline treats each call
//! as a single request that either succeeds or fails.

mod http;
mod wire;


pub use http::HttpFetchGateway;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::Action;

/// Authenticated access to run steps and step payloads
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// Steps of one run, in the order the service defines
    async fn fetch_run_steps(&self, run_id: &str) -> Result<Vec<Action>, GatewayError>;

    /// Payload behind a content locator
    async fn fetch_content(&self, locator: &str) -> Result<serde_json::Value, GatewayError>;
}
