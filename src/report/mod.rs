//! Tabular report model and its assembly from fetched run data
//!
//! A [`Report`] is a list of named [`Sheet`]s: a Summary sheet followed by one
//! sheet per exported run. Assembly is a pure function of its inputs, see
//! [`assemble_report`].

mod assembler;
mod format;
mod naming;


pub use assembler::{
    RUN_SHEET_FIELDS, STEP_HEADER, SUMMARY_HEADER, assemble_report, column_widths,
};
pub use format::{format_duration, format_sheet_stamp, format_timestamp};
pub use naming::{
    MAX_SHEET_NAME_LEN, SUMMARY_SHEET, SheetNamer, report_file_name, sanitize_sheet_name,
    unique_sheet_names,
};

use serde::Serialize;

/// One cell of a sheet
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    /// No value
    Empty,
    /// Literal text
    Text(String),
    /// Numeric value
    Number(f64),
    /// Hyperlink to cell A1 of another sheet in the same document
    Link {
        /// Text shown in the cell
        label: String,
        /// Name of the target sheet
        sheet: String,
    },
}

impl Cell {
    /// Text cell
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Text cell, or [`Cell::Empty`] when `value` is `None`
    pub fn optional(value: Option<String>) -> Self {
        value.map_or(Cell::Empty, Cell::Text)
    }

    /// Text the cell displays
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Link { label, .. } => label.clone(),
        }
    }

    /// Number of characters the cell displays
    pub fn display_len(&self) -> usize {
        match self {
            Cell::Empty => 0,
            Cell::Text(text) => text.chars().count(),
            Cell::Number(n) => n.to_string().chars().count(),
            Cell::Link { label, .. } => label.chars().count(),
        }
    }

    /// Whether the cell holds nothing
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// One worksheet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sheet {
    /// Unique sheet name, at most [`MAX_SHEET_NAME_LEN`] characters
    pub name: String,
    /// Row-major cells; rows may have different lengths
    pub rows: Vec<Vec<Cell>>,
    /// Width of each column in characters
    pub column_widths: Vec<usize>,
}

/// A complete multi-sheet report
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// Summary sheet first, then one sheet per run in input order
    pub sheets: Vec<Sheet>,
    /// Suggested file name of the serialized artifact
    pub file_name: String,
}

impl Report {
    /// The Summary sheet
    pub fn summary(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    /// The per-run sheets in run order
    pub fn run_sheets(&self) -> &[Sheet] {
        self.sheets.get(1..).unwrap_or_default()
    }

    /// Look up a sheet by exact name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
