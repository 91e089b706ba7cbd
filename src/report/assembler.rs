//! Assembly of fetched run data into a [`Report`]

use super::format::{format_duration, format_sheet_stamp, format_timestamp};
use super::naming::{SUMMARY_SHEET, SheetNamer, report_file_name, sanitize_sheet_name};
use super::{Cell, Report, Sheet};
use crate::aggregator::cap_cell_text;
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::types::{Action, ContentKey, ContentMap, Run, RunActions};

/// Header row of the Summary sheet
pub const SUMMARY_HEADER: [&str; 7] = [
    "#",
    "Run ID",
    "Status",
    "Start Time",
    "End Time",
    "Duration",
    "Error",
];

/// Labels of the key/value block at the top of every run sheet
pub const RUN_SHEET_FIELDS: [&str; 6] = [
    "Run ID",
    "Status",
    "Start Time",
    "End Time",
    "Duration",
    "Error",
];

/// Header row of the step table on every run sheet
pub const STEP_HEADER: [&str; 6] = [
    "Step Name",
    "Status",
    "Error",
    "Inputs",
    "Outputs",
    "Type",
];

const NO_STEPS: &str = "No steps found";

/// Build the report for `runs`
///
/// The result has a Summary sheet followed by exactly one sheet per run, in
/// input order; Summary row `i` links to run sheet `i`. Steps appear in the
/// order given by `actions`; runs missing from `actions` get the "No steps
/// found" row. Content missing from `contents` renders as empty cells.
///
/// Pure: the same inputs always produce an equal report.
pub fn assemble_report(
    flow_name: &str,
    runs: &[Run],
    actions: &RunActions,
    contents: &ContentMap,
    config: &ReportConfig,
) -> Result<Report> {
    if runs.is_empty() {
        return Err(Error::NoRuns);
    }

    let mut namer = SheetNamer::new();
    let names: Vec<String> = runs
        .iter()
        .enumerate()
        .map(|(i, run)| namer.assign(&sanitize_sheet_name(&sheet_candidate(i + 1, run), i + 1)))
        .collect();

    let mut sheets = Vec::with_capacity(runs.len() + 1);
    sheets.push(summary_sheet(runs, &names, config));
    for (run, name) in runs.iter().zip(&names) {
        let steps = actions.get(&run.id).map(Vec::as_slice).unwrap_or_default();
        sheets.push(run_sheet(name, run, steps, contents, config));
    }

    tracing::debug!(
        flow_name,
        sheets = sheets.len(),
        "assembled report"
    );

    Ok(Report {
        sheets,
        file_name: report_file_name(flow_name),
    })
}

/// Column widths for `rows`: longest displayed text, capped, plus padding
pub fn column_widths(rows: &[Vec<Cell>], config: &ReportConfig) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|col| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(Cell::display_len)
                .max()
                .unwrap_or(0);
            longest.min(config.column_width_cap) + config.column_padding
        })
        .collect()
}

fn sheet_candidate(position: usize, run: &Run) -> String {
    match &run.start_time {
        Some(start) => format!("{position} {} {}", run.status, format_sheet_stamp(start)),
        None => format!("{position} {}", run.status),
    }
}

fn summary_sheet(runs: &[Run], names: &[String], config: &ReportConfig) -> Sheet {
    let mut rows = Vec::with_capacity(runs.len() + 1);
    rows.push(header_row(&SUMMARY_HEADER));

    for (i, (run, name)) in runs.iter().zip(names).enumerate() {
        rows.push(vec![
            Cell::Link {
                label: (i + 1).to_string(),
                sheet: name.clone(),
            },
            Cell::text(&run.id),
            Cell::text(run.status.label()),
            Cell::optional(run.start_time.as_ref().map(format_timestamp)),
            Cell::optional(run.end_time.as_ref().map(format_timestamp)),
            Cell::optional(format_duration(run.start_time, run.end_time)),
            error_cell(run.error_message(), config),
        ]);
    }

    finish_sheet(SUMMARY_SHEET.to_string(), rows, config)
}

fn run_sheet(
    name: &str,
    run: &Run,
    steps: &[Action],
    contents: &ContentMap,
    config: &ReportConfig,
) -> Sheet {
    let values = [
        Cell::text(&run.id),
        Cell::text(run.status.label()),
        Cell::optional(run.start_time.as_ref().map(format_timestamp)),
        Cell::optional(run.end_time.as_ref().map(format_timestamp)),
        Cell::optional(format_duration(run.start_time, run.end_time)),
        error_cell(run.error_message(), config),
    ];

    let mut rows: Vec<Vec<Cell>> = RUN_SHEET_FIELDS
        .iter()
        .zip(values)
        .map(|(label, value)| vec![Cell::text(*label), value])
        .collect();
    rows.push(Vec::new());
    rows.push(header_row(&STEP_HEADER));

    if steps.is_empty() {
        rows.push(vec![Cell::text(NO_STEPS)]);
    }
    for step in steps {
        let content = contents.get(&ContentKey::new(&run.id, &step.name));
        let (inputs, outputs) = match content {
            Some(content) => (content_cell(&content.inputs), content_cell(&content.outputs)),
            None => (Cell::Empty, Cell::Empty),
        };
        rows.push(vec![
            Cell::text(&step.name),
            Cell::text(step.status.label()),
            error_cell(step.error_message(), config),
            inputs,
            outputs,
            Cell::optional(step.type_label()),
        ]);
    }

    finish_sheet(name.to_string(), rows, config)
}

fn finish_sheet(name: String, rows: Vec<Vec<Cell>>, config: &ReportConfig) -> Sheet {
    let column_widths = column_widths(&rows, config);
    Sheet {
        name,
        rows,
        column_widths,
    }
}

fn header_row(labels: &[&str]) -> Vec<Cell> {
    labels.iter().map(|label| Cell::text(*label)).collect()
}

fn error_cell(message: Option<String>, config: &ReportConfig) -> Cell {
    Cell::optional(message.map(|m| cap_cell_text(m, config.max_cell_length)))
}

fn content_cell(text: &str) -> Cell {
    if text.is_empty() {
        Cell::Empty
    } else {
        Cell::text(text)
    }
}
