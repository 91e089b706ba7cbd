//! Spreadsheet serialization
//!
//! [`XlsxSerializer`] writes a [`Report`] as an Office Open XML workbook: a zip
//! container holding one worksheet part per sheet, each part streamed through
//! `quick_xml` straight into the archive. Cells are written as inline
//! strings, so no shared-string table is needed. Link cells become internal
//! hyperlinks to cell A1 of their target sheet.

mod parts;
mod sheet;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::io::Cursor;

use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{Error, Result};
use crate::report::Report;

/// MIME type of the produced artifact
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Turns a [`Report`] into the bytes of a downloadable document
///
/// Implementations must either return the complete document or an error; a
/// partial document is never returned.
pub trait ArtifactSerializer: Send + Sync {
    /// Serialize `report`
    fn serialize(&self, report: &Report) -> Result<Vec<u8>>;

    /// MIME type of the serialized document
    fn content_type(&self) -> &'static str;
}

/// Office Open XML (`.xlsx`) writer
#[derive(Clone, Copy, Debug, Default)]
pub struct XlsxSerializer;

impl XlsxSerializer {
    /// Create a serializer
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactSerializer for XlsxSerializer {
    fn serialize(&self, report: &Report) -> Result<Vec<u8>> {
        check_report(report)?;

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let sheet_count = report.sheets.len();

        writer.start_file("[Content_Types].xml", options)?;
        parts::content_types(&mut writer, sheet_count)?;
        writer.start_file("_rels/.rels", options)?;
        parts::root_rels(&mut writer)?;
        writer.start_file("xl/workbook.xml", options)?;
        parts::workbook(&mut writer, &report.sheets)?;
        writer.start_file("xl/_rels/workbook.xml.rels", options)?;
        parts::workbook_rels(&mut writer, sheet_count)?;
        writer.start_file("xl/styles.xml", options)?;
        parts::styles(&mut writer)?;
        for (i, sheet) in report.sheets.iter().enumerate() {
            writer.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            sheet::worksheet(&mut writer, sheet)?;
        }

        let bytes = writer.finish()?.into_inner();
        tracing::debug!(
            sheets = sheet_count,
            bytes = bytes.len(),
            "serialized workbook"
        );
        Ok(bytes)
    }

    fn content_type(&self) -> &'static str {
        XLSX_CONTENT_TYPE
    }
}

/// Reject reports a spreadsheet application would refuse to open
fn check_report(report: &Report) -> Result<()> {
    if report.sheets.is_empty() {
        return Err(Error::Assembly("report has no sheets".to_string()));
    }

    let mut seen = HashSet::new();
    for sheet in &report.sheets {
        if sheet.name.is_empty() {
            return Err(Error::Assembly("sheet name is empty".to_string()));
        }
        if !seen.insert(sheet.name.to_lowercase()) {
            return Err(Error::Assembly(format!(
                "duplicate sheet name: {}",
                sheet.name
            )));
        }
    }
    Ok(())
}
