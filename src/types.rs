//! Core types for flow-run-export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Execution status of a run or of a single step
///
/// The upstream service reports statuses as free-form strings. Anything not
/// recognised maps to [`RunStatus::Unknown`] so new upstream statuses never fail
/// a fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
    /// Stopped by a user or by the service
    Cancelled,
    /// Still executing
    Running,
    /// Missing or unrecognised status
    #[default]
    Unknown,
}

impl RunStatus {
    /// Display label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "Succeeded",
            RunStatus::Failed => "Failed",
            RunStatus::Cancelled => "Cancelled",
            RunStatus::Running => "Running",
            RunStatus::Unknown => "Unknown",
        }
    }
}

impl From<&str> for RunStatus {
    fn from(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "succeeded" => RunStatus::Succeeded,
            "failed" => RunStatus::Failed,
            "cancelled" | "canceled" => RunStatus::Cancelled,
            "running" => RunStatus::Running,
            _ => RunStatus::Unknown,
        }
    }
}

impl From<String> for RunStatus {
    fn from(status: String) -> Self {
        RunStatus::from(status.as_str())
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.label().to_string()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a [`ServiceError`]'s detail list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceErrorDetail {
    /// Error code of this detail
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message of this detail
    #[serde(default)]
    pub message: Option<String>,
}

/// Structured error attached to a run or step by the upstream service
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error code (e.g. "ActionFailed")
    #[serde(default)]
    pub code: Option<String>,
    /// Top-level message
    #[serde(default)]
    pub message: Option<String>,
    /// Nested details; the first one is used when the top-level message is blank
    #[serde(default)]
    pub details: Vec<ServiceErrorDetail>,
}

impl ServiceError {
    /// Create an error carrying only a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// The most useful one-line description of this error, if any
    ///
    /// Prefers the trimmed top-level message, then the first detail's message.
    pub fn summary(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().map(str::trim)
            && !message.is_empty()
        {
            return Some(message.to_string());
        }
        self.details
            .first()
            .and_then(|d| d.message.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// One execution instance of the monitored workflow
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier, unique within a flow
    pub id: String,
    /// Final or current status
    pub status: RunStatus,
    /// When the run started
    pub start_time: Option<DateTime<Utc>>,
    /// When the run ended (absent while running)
    pub end_time: Option<DateTime<Utc>>,
    /// Run-level error reported by the service
    pub error: Option<ServiceError>,
}

impl Run {
    /// Create a run with no timestamps and no error
    pub fn new(id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            status,
            start_time: None,
            end_time: None,
            error: None,
        }
    }

    /// Set start and end times
    pub fn with_times(
        mut self,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Attach a run-level error
    pub fn with_error(mut self, error: ServiceError) -> Self {
        self.error = Some(error);
        self
    }

    /// One-line error text for reports
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(ServiceError::summary)
    }
}

/// Out-of-band reference to a step's inputs or outputs payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentLink {
    /// Opaque locator the payload is fetched from
    pub uri: String,
    /// Payload size in bytes, when the service reports it
    #[serde(default)]
    pub content_size: Option<u64>,
}

impl ContentLink {
    /// Create a link without size information
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content_size: None,
        }
    }
}

/// One step of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Step name, unique within its run
    pub name: String,
    /// Step status
    pub status: RunStatus,
    /// When the step started
    pub start_time: Option<DateTime<Utc>>,
    /// When the step ended
    pub end_time: Option<DateTime<Utc>>,
    /// Upstream result code (e.g. "NotSpecified", "BadRequest")
    pub code: Option<String>,
    /// Step-level error
    pub error: Option<ServiceError>,
    /// Where the step's inputs can be fetched from
    pub inputs_link: Option<ContentLink>,
    /// Where the step's outputs can be fetched from
    pub outputs_link: Option<ContentLink>,
    /// Definition type of the step (e.g. "OpenApiConnection", "If", "Foreach")
    #[serde(default)]
    pub action_type: Option<String>,
    /// Definition kind refining the type (e.g. "Http", "Button")
    #[serde(default)]
    pub kind: Option<String>,
    /// Connector API the step calls, for connector steps
    #[serde(default)]
    pub connector_id: Option<String>,
}

impl Action {
    /// Create a step with no timestamps, error or content links
    pub fn new(name: impl Into<String>, status: RunStatus) -> Self {
        Self {
            name: name.into(),
            status,
            start_time: None,
            end_time: None,
            code: None,
            error: None,
            inputs_link: None,
            outputs_link: None,
            action_type: None,
            kind: None,
            connector_id: None,
        }
    }

    /// Set the definition type and kind
    pub fn with_type(mut self, action_type: impl Into<String>, kind: Option<&str>) -> Self {
        self.action_type = Some(action_type.into());
        self.kind = kind.map(str::to_string);
        self
    }

    /// Set the inputs locator
    pub fn with_inputs(mut self, uri: impl Into<String>) -> Self {
        self.inputs_link = Some(ContentLink::new(uri));
        self
    }

    /// Set the outputs locator
    pub fn with_outputs(mut self, uri: impl Into<String>) -> Self {
        self.outputs_link = Some(ContentLink::new(uri));
        self
    }

    /// Attach a step-level error
    pub fn with_error(mut self, error: ServiceError) -> Self {
        self.error = Some(error);
        self
    }

    /// Whether any payload has to be fetched for this step
    pub fn has_content(&self) -> bool {
        self.inputs_link.is_some() || self.outputs_link.is_some()
    }

    /// One-line error text for reports
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(ServiceError::summary)
    }

    /// Type for reports: `"Type"`, or `"Type (kind)"` when a kind is known
    pub fn type_label(&self) -> Option<String> {
        let action_type = self.action_type.as_deref()?;
        Some(match self.kind.as_deref() {
            Some(kind) => format!("{action_type} ({kind})"),
            None => action_type.to_string(),
        })
    }
}

/// Fetched payloads of one step, rendered as cell text
///
/// Each field holds single-line JSON, a truncated rendering ending in the
/// truncation marker, or an error marker. An empty string means the payload was
/// not requested.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContent {
    /// Rendered inputs
    pub inputs: String,
    /// Rendered outputs
    pub outputs: String,
}

/// Key of a step's content: the owning run and the step name
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey {
    /// Owning run identifier
    pub run_id: String,
    /// Step name
    pub action: String,
}

impl ContentKey {
    /// Create a key
    pub fn new(run_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            action: action.into(),
        }
    }
}

/// Steps of every exported run, keyed by run identifier
pub type RunActions = HashMap<String, Vec<Action>>;

/// Rendered content of every step that had content links
pub type ContentMap = HashMap<ContentKey, ActionContent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(RunStatus::from("Succeeded"), RunStatus::Succeeded);
        assert_eq!(RunStatus::from("FAILED"), RunStatus::Failed);
        assert_eq!(RunStatus::from("cancelled"), RunStatus::Cancelled);
        assert_eq!(RunStatus::from("Running"), RunStatus::Running);
    }

    #[test]
    fn unrecognised_status_falls_back_to_unknown() {
        assert_eq!(RunStatus::from("Skipped"), RunStatus::Unknown);
        assert_eq!(RunStatus::from(""), RunStatus::Unknown);
    }

    #[test]
    fn status_round_trips_through_json_as_label() {
        let json = serde_json::to_string(&RunStatus::Cancelled).unwrap();
        assert_eq!(json, "\"Cancelled\"");
        let back: RunStatus = serde_json::from_str("\"TimedOut\"").unwrap();
        assert_eq!(back, RunStatus::Unknown);
    }

    #[test]
    fn error_summary_prefers_trimmed_message() {
        let error = ServiceError {
            code: Some("ActionFailed".to_string()),
            message: Some("  An action failed.  ".to_string()),
            details: vec![ServiceErrorDetail {
                code: None,
                message: Some("inner".to_string()),
            }],
        };
        assert_eq!(error.summary().as_deref(), Some("An action failed."));
    }

    #[test]
    fn error_summary_falls_back_to_first_detail() {
        let error = ServiceError {
            code: None,
            message: Some("   ".to_string()),
            details: vec![ServiceErrorDetail {
                code: None,
                message: Some(" connector timed out ".to_string()),
            }],
        };
        assert_eq!(error.summary().as_deref(), Some("connector timed out"));
    }

    #[test]
    fn error_summary_absent_when_nothing_usable() {
        assert_eq!(ServiceError::default().summary(), None);
    }

    #[test]
    fn action_has_content_with_either_link() {
        assert!(!Action::new("Compose", RunStatus::Succeeded).has_content());
        assert!(
            Action::new("Compose", RunStatus::Succeeded)
                .with_outputs("https://example.test/out")
                .has_content()
        );
    }

    #[test]
    fn type_label_includes_kind_when_known() {
        let plain = Action::new("Condition", RunStatus::Succeeded);
        assert_eq!(plain.type_label(), None);
        assert_eq!(
            plain.clone().with_type("If", None).type_label().as_deref(),
            Some("If")
        );
        assert_eq!(
            plain.with_type("Request", Some("Button")).type_label().as_deref(),
            Some("Request (Button)")
        );
    }
}
