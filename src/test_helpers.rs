//! In-memory gateway and fixtures shared by unit tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::GatewayError;
use crate::gateway::FetchGateway;
use crate::types::Action;

/// Scripted [`FetchGateway`] that records every call
#[derive(Default)]
pub(crate) struct FakeGateway {
    /// Run id → steps, or HTTP status to fail with
    steps: HashMap<String, Result<Vec<Action>, u16>>,
    /// Locator → payload, or HTTP status to fail with
    contents: HashMap<String, Result<serde_json::Value, u16>>,
    /// Artificial latency of every content fetch
    content_delay: Duration,
    step_calls: Mutex<Vec<String>>,
    content_calls: Mutex<Vec<String>>,
    content_in_flight: AtomicUsize,
    content_peak: AtomicUsize,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_steps(mut self, run_id: &str, actions: Vec<Action>) -> Self {
        self.steps.insert(run_id.to_string(), Ok(actions));
        self
    }

    pub(crate) fn with_failing_steps(mut self, run_id: &str, status: u16) -> Self {
        self.steps.insert(run_id.to_string(), Err(status));
        self
    }

    pub(crate) fn with_content(mut self, locator: &str, value: serde_json::Value) -> Self {
        self.contents.insert(locator.to_string(), Ok(value));
        self
    }

    pub(crate) fn with_failing_content(mut self, locator: &str, status: u16) -> Self {
        self.contents.insert(locator.to_string(), Err(status));
        self
    }

    pub(crate) fn with_content_delay(mut self, delay: Duration) -> Self {
        self.content_delay = delay;
        self
    }

    pub(crate) fn step_calls(&self) -> Vec<String> {
        self.step_calls.lock().unwrap().clone()
    }

    pub(crate) fn content_calls(&self) -> Vec<String> {
        self.content_calls.lock().unwrap().clone()
    }

    pub(crate) fn content_peak(&self) -> usize {
        self.content_peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchGateway for FakeGateway {
    async fn fetch_run_steps(&self, run_id: &str) -> Result<Vec<Action>, GatewayError> {
        self.step_calls.lock().unwrap().push(run_id.to_string());
        tokio::task::yield_now().await;
        match self.steps.get(run_id) {
            Some(Ok(actions)) => Ok(actions.clone()),
            Some(Err(status)) => Err(GatewayError::Status { status: *status }),
            None => Err(GatewayError::Status { status: 404 }),
        }
    }

    async fn fetch_content(&self, locator: &str) -> Result<serde_json::Value, GatewayError> {
        self.content_calls.lock().unwrap().push(locator.to_string());
        let now = self.content_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.content_peak.fetch_max(now, Ordering::SeqCst);

        if self.content_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.content_delay).await;
        }

        self.content_in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.contents.get(locator) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(status)) => Err(GatewayError::Status { status: *status }),
            None => Err(GatewayError::Status { status: 404 }),
        }
    }
}

/// Fixed UTC timestamp for deterministic fixtures
pub(crate) fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}
