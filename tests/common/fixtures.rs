//! Mock workflow service and sample data

use chrono::{DateTime, TimeZone, Utc};
use flow_run_export::{GatewayConfig, HttpFetchGateway, RetryConfig, Run, RunStatus};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ENVIRONMENT: &str = "env-test";
pub const FLOW: &str = "flow-test";

/// Path of the flow resource on the mock server
pub fn flow_path() -> String {
    format!("/providers/Microsoft.ProcessSimple/environments/{ENVIRONMENT}/flows/{FLOW}")
}

/// Gateway pointed at `server` with fast retries
pub fn gateway_for(server: &MockServer) -> HttpFetchGateway {
    let mut config = GatewayConfig::new(ENVIRONMENT, FLOW, "test-token");
    config.api_base = server.uri();
    config.timeout = Duration::from_secs(5);
    config.retry = RetryConfig {
        max_attempts: 2,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(10),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    HttpFetchGateway::new(config).expect("valid gateway config")
}

/// Fixed UTC timestamp
pub fn at(h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, h, mi, s).unwrap()
}

/// Run that started at `start` and took `secs` seconds
pub fn finished_run(id: &str, status: RunStatus, start: DateTime<Utc>, secs: i64) -> Run {
    Run::new(id, status).with_times(Some(start), Some(start + chrono::Duration::seconds(secs)))
}

/// Content locator served by `server`
pub fn content_url(server: &MockServer, name: &str) -> String {
    format!("{}/content/{name}", server.uri())
}

/// Serve the step list of `run_id`; `actions` is the `properties.actions` object
///
/// The mock expects exactly `expected_calls` requests when the server is dropped.
pub async fn mount_run_steps(server: &MockServer, run_id: &str, actions: Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{}/runs/{run_id}", flow_path())))
        .and(query_param("$expand", "properties/actions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": run_id,
            "properties": { "status": "Succeeded", "actions": actions }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Serve the flow definition; `definition` is the `properties.definition` object
pub async fn mount_flow_definition(server: &MockServer, definition: Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(flow_path()))
        .and(query_param("$expand", "definition,connectionReferences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": FLOW,
            "properties": { "definition": definition, "connectionReferences": {} }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Make every step-list request for `run_id` fail with `status`
pub async fn mount_failing_run_steps(server: &MockServer, run_id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("{}/runs/{run_id}", flow_path())))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve `body` as JSON at the content locator `name`
pub async fn mount_content(server: &MockServer, name: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/content/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Make the content locator `name` fail with `status`
pub async fn mount_failing_content(server: &MockServer, name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/content/{name}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Step record without content links
pub fn plain_step(status: &str, start: &str) -> Value {
    json!({ "status": status, "startTime": start })
}

/// Step record with the given content locators
pub fn linked_step(status: &str, start: &str, inputs: Option<&str>, outputs: Option<&str>) -> Value {
    let mut step = plain_step(status, start);
    if let Some(uri) = inputs {
        step["inputsLink"] = json!({ "uri": uri });
    }
    if let Some(uri) = outputs {
        step["outputsLink"] = json!({ "uri": uri });
    }
    step
}
