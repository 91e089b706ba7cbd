//! Response shapes of the management API and their conversion to domain types

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::error::GatewayError;
use crate::types::{Action, ContentLink, Run, RunStatus, ServiceError};

/// `GET .../runs` body
#[derive(Debug, Deserialize)]
pub(super) struct RunListResponse {
    #[serde(default)]
    pub(super) value: Vec<RunRecord>,
}

/// One run as returned by the service
#[derive(Debug, Deserialize)]
pub(super) struct RunRecord {
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) properties: RunProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RunProperties {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    error: Option<ServiceError>,
    /// Only present with `$expand=properties/actions`
    #[serde(default)]
    pub(super) actions: Option<BTreeMap<String, ActionRecord>>,
}

/// One step as returned inside `properties.actions`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ActionRecord {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<ServiceError>,
    #[serde(default)]
    inputs_link: Option<ContentLink>,
    #[serde(default)]
    outputs_link: Option<ContentLink>,
}

/// `GET .../flows/{flow}?$expand=definition,connectionReferences` body
#[derive(Debug, Default, Deserialize)]
pub(super) struct FlowRecord {
    #[serde(default)]
    properties: FlowProperties,
}

#[derive(Debug, Default, Deserialize)]
struct FlowProperties {
    #[serde(default)]
    definition: FlowDefinition,
}

#[derive(Debug, Default, Deserialize)]
struct FlowDefinition {
    #[serde(default)]
    triggers: BTreeMap<String, DefinitionAction>,
    #[serde(default)]
    actions: BTreeMap<String, DefinitionAction>,
}

/// A trigger or action of the flow definition
///
/// Scopes, conditions, switches and loops nest further actions.
#[derive(Debug, Default, Deserialize)]
struct DefinitionAction {
    #[serde(default, rename = "type")]
    action_type: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    /// Free-form; only `host.apiId` / `host.connectionName` are read
    #[serde(default)]
    inputs: Option<serde_json::Value>,
    #[serde(default)]
    actions: BTreeMap<String, DefinitionAction>,
    #[serde(default, rename = "else")]
    else_branch: Option<Branch>,
    #[serde(default)]
    cases: BTreeMap<String, Branch>,
    #[serde(default)]
    default: Option<Branch>,
}

#[derive(Debug, Default, Deserialize)]
struct Branch {
    #[serde(default)]
    actions: BTreeMap<String, DefinitionAction>,
}

/// Definition metadata of one step, looked up by step name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct StepMetadata {
    pub(super) action_type: Option<String>,
    pub(super) kind: Option<String>,
    pub(super) connector_id: Option<String>,
}

/// Step name → metadata for every trigger and action of a flow
pub(super) type FlowMetadata = HashMap<String, StepMetadata>;

impl FlowRecord {
    /// Metadata of every step, nested ones included
    ///
    /// A trigger and an action sharing a name resolve to the trigger.
    pub(super) fn into_metadata(self) -> FlowMetadata {
        let definition = self.properties.definition;
        let mut metadata = FlowMetadata::new();
        collect_metadata(&definition.actions, &mut metadata);
        collect_metadata(&definition.triggers, &mut metadata);
        metadata
    }
}

fn collect_metadata(actions: &BTreeMap<String, DefinitionAction>, metadata: &mut FlowMetadata) {
    for (name, action) in actions {
        metadata.insert(name.clone(), action.metadata());

        collect_metadata(&action.actions, metadata);
        if let Some(branch) = &action.else_branch {
            collect_metadata(&branch.actions, metadata);
        }
        for branch in action.cases.values() {
            collect_metadata(&branch.actions, metadata);
        }
        if let Some(branch) = &action.default {
            collect_metadata(&branch.actions, metadata);
        }
    }
}

impl DefinitionAction {
    fn metadata(&self) -> StepMetadata {
        let host = self.inputs.as_ref().and_then(|inputs| inputs.get("host"));
        let connector_id = host
            .and_then(|h| h.get("apiId").or_else(|| h.get("connectionName")))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        StepMetadata {
            action_type: self.action_type.clone(),
            kind: self.kind.clone(),
            connector_id,
        }
    }
}

impl RunRecord {
    pub(super) fn into_run(self) -> Result<Run, GatewayError> {
        let id = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| GatewayError::MissingField("name".to_string()))?;
        let props = self.properties;
        Ok(Run {
            id,
            status: status_of(props.status.as_deref()),
            start_time: parse_time(props.start_time.as_deref()),
            end_time: parse_time(props.end_time.as_deref()),
            error: props.error,
        })
    }

    /// Steps of this run ordered by start time, steps without one last
    ///
    /// Steps sharing a start time keep name order. A run the service reports
    /// without an `actions` object has no steps yet. Steps found in `metadata`
    /// get their definition type, kind and connector.
    pub(super) fn into_actions(self, metadata: Option<&FlowMetadata>) -> Vec<Action> {
        let mut steps: Vec<Action> = self
            .properties
            .actions
            .unwrap_or_default()
            .into_iter()
            .map(|(name, record)| {
                let step_metadata = metadata.and_then(|m| m.get(&name)).cloned();
                record.into_action(name, step_metadata.unwrap_or_default())
            })
            .collect();
        steps.sort_by_key(|a| (a.start_time.is_none(), a.start_time));
        steps
    }
}

impl ActionRecord {
    fn into_action(self, name: String, metadata: StepMetadata) -> Action {
        Action {
            name,
            status: status_of(self.status.as_deref()),
            start_time: parse_time(self.start_time.as_deref()),
            end_time: parse_time(self.end_time.as_deref()),
            code: self.code,
            error: self.error,
            inputs_link: self.inputs_link.filter(|l| !l.uri.is_empty()),
            outputs_link: self.outputs_link.filter(|l| !l.uri.is_empty()),
            action_type: metadata.action_type,
            kind: metadata.kind,
            connector_id: metadata.connector_id,
        }
    }
}

fn status_of(status: Option<&str>) -> RunStatus {
    status.map(RunStatus::from).unwrap_or_default()
}

fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(value, error = %e, "ignoring unparseable timestamp");
            None
        }
    }
}
