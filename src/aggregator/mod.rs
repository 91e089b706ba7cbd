//! Action aggregation
//!
//! Two phases, both fanned out through [`run_bounded`]:
//! 1. [`ActionAggregator::resolve_actions`] resolves every run's step list,
//!    read-through the [`ActionCache`]
//! 2. [`ActionAggregator::fetch_contents`] fetches the inputs/outputs payload of
//!    every step that has a content link, under `content_concurrency`
//!
//! Failures of individual fetches never escape: a run whose steps cannot be
//! fetched resolves to no steps, a payload that cannot be fetched becomes an
//! error marker.

mod content;


pub use content::{
    INPUTS_ERROR_MARKER, OUTPUTS_ERROR_MARKER, TRUNCATION_MARKER, cap_cell_text, render_content,
};

use std::collections::HashSet;
use std::sync::Arc;

use content::ContentField;

use crate::cache::ActionCache;
use crate::config::ExportConfig;
use crate::gateway::FetchGateway;
use crate::pool::run_bounded;
use crate::progress::{Progress, ProgressReporter};
use crate::types::{Action, ActionContent, ContentKey, ContentLink, ContentMap, Run, RunActions};

/// One step whose content has to be fetched
struct ContentJob<'a> {
    run_id: &'a str,
    action: &'a Action,
    /// Set on the first job of each run: (1-based run position, total runs)
    announce: Option<(usize, usize)>,
}

/// Resolves step lists and step payloads for a set of runs
#[derive(Clone)]
pub struct ActionAggregator {
    gateway: Arc<dyn FetchGateway>,
    cache: ActionCache,
    run_concurrency: usize,
    content_concurrency: usize,
    max_cell_length: usize,
}

impl ActionAggregator {
    /// Create an aggregator using `cache` for step lists
    pub fn new(gateway: Arc<dyn FetchGateway>, cache: ActionCache, config: &ExportConfig) -> Self {
        Self {
            gateway,
            cache,
            run_concurrency: config.run_concurrency,
            content_concurrency: config.content_concurrency,
            max_cell_length: config.report.max_cell_length,
        }
    }

    /// The step-list cache this aggregator reads and fills
    pub fn cache(&self) -> &ActionCache {
        &self.cache
    }

    /// Step lists of all runs, keyed by run id
    ///
    /// Each distinct run id is resolved once. Runs whose fetch fails map to an
    /// empty list and are not cached.
    pub async fn resolve_actions(&self, runs: &[Run]) -> RunActions {
        let mut seen = HashSet::new();
        let run_ids: Vec<&str> = runs
            .iter()
            .map(|run| run.id.as_str())
            .filter(|id| seen.insert(*id))
            .collect();

        run_bounded(run_ids, self.run_concurrency, |run_id| async move {
            (run_id.to_string(), self.resolve_run(run_id).await)
        })
        .await
        .into_iter()
        .collect()
    }

    async fn resolve_run(&self, run_id: &str) -> Vec<Action> {
        if let Some(cached) = self.cache.get(run_id).await {
            tracing::debug!(run_id, count = cached.len(), "using cached run steps");
            return cached.as_ref().clone();
        }

        match self.gateway.fetch_run_steps(run_id).await {
            Ok(actions) => {
                self.cache.insert(run_id, actions.clone()).await;
                actions
            }
            Err(e) => {
                tracing::warn!(run_id, error = %e, "failed to fetch run steps, exporting run without steps");
                Vec::new()
            }
        }
    }

    /// Rendered payloads of every step with a content link
    ///
    /// Reports [`Progress::FetchingSteps`] once per run, when the first of its
    /// payload fetches starts.
    pub async fn fetch_contents(
        &self,
        runs: &[Run],
        actions: &RunActions,
        progress: &ProgressReporter,
    ) -> ContentMap {
        let total = runs.len();
        let mut seen = HashSet::new();
        let mut jobs = Vec::new();

        for (index, run) in runs.iter().enumerate() {
            if !seen.insert(run.id.as_str()) {
                continue;
            }
            let Some(steps) = actions.get(&run.id) else {
                continue;
            };
            let mut announce = Some((index + 1, total));
            for action in steps.iter().filter(|a| a.has_content()) {
                jobs.push(ContentJob {
                    run_id: &run.id,
                    action,
                    announce: announce.take(),
                });
            }
        }

        tracing::debug!(
            jobs = jobs.len(),
            limit = self.content_concurrency,
            "fetching step content"
        );

        run_bounded(jobs, self.content_concurrency, |job| {
            if let Some((run, total)) = job.announce {
                progress.report(Progress::FetchingSteps { run, total });
            }
            async move {
                let content = self.fetch_action_content(job.run_id, job.action).await;
                (ContentKey::new(job.run_id, &job.action.name), content)
            }
        })
        .await
        .into_iter()
        .collect()
    }

    async fn fetch_action_content(&self, run_id: &str, action: &Action) -> ActionContent {
        let inputs = match &action.inputs_link {
            Some(link) => {
                self.fetch_field(run_id, &action.name, link, ContentField::Inputs)
                    .await
            }
            None => String::new(),
        };
        let outputs = match &action.outputs_link {
            Some(link) => {
                self.fetch_field(run_id, &action.name, link, ContentField::Outputs)
                    .await
            }
            None => String::new(),
        };
        ActionContent { inputs, outputs }
    }

    async fn fetch_field(
        &self,
        run_id: &str,
        action: &str,
        link: &ContentLink,
        field: ContentField,
    ) -> String {
        match self.gateway.fetch_content(&link.uri).await {
            Ok(value) => render_content(&value, self.max_cell_length),
            Err(e) => {
                tracing::warn!(
                    run_id,
                    action,
                    field = field.as_str(),
                    error = %e,
                    "failed to fetch step content"
                );
                field.error_marker().to_string()
            }
        }
    }
}
