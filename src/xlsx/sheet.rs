//! Worksheet XML

use std::io::{self, Write};

use super::parts::{RELATIONSHIPS_NS, SPREADSHEET_NS, XmlPart};
use crate::report::{Cell, Sheet};

const HYPERLINK_STYLE: &str = "1";

/// Write one worksheet part
pub(super) fn worksheet<W: Write>(out: W, sheet: &Sheet) -> io::Result<()> {
    let mut xml = XmlPart::new(out)?;
    xml.open(
        "worksheet",
        &[("xmlns", SPREADSHEET_NS), ("xmlns:r", RELATIONSHIPS_NS)],
    )?;

    if !sheet.column_widths.is_empty() {
        xml.open("cols", &[])?;
        for (i, width) in sheet.column_widths.iter().enumerate() {
            let col = (i + 1).to_string();
            let width = width.to_string();
            xml.empty(
                "col",
                &[
                    ("min", col.as_str()),
                    ("max", col.as_str()),
                    ("width", width.as_str()),
                    ("customWidth", "1"),
                ],
            )?;
        }
        xml.close("cols")?;
    }

    let mut links = Vec::new();
    xml.open("sheetData", &[])?;
    for (r, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let row_number = r + 1;
        xml.open("row", &[("r", row_number.to_string().as_str())])?;
        for (c, cell) in row.iter().enumerate() {
            let reference = cell_reference(c + 1, row_number);
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => inline_string(&mut xml, &reference, text, None)?,
                Cell::Number(n) if n.is_finite() => {
                    xml.open("c", &[("r", reference.as_str())])?;
                    xml.text_element("v", &[], &n.to_string())?;
                    xml.close("c")?;
                }
                Cell::Number(n) => inline_string(&mut xml, &reference, &n.to_string(), None)?,
                Cell::Link { label, sheet } => {
                    inline_string(&mut xml, &reference, label, Some(HYPERLINK_STYLE))?;
                    links.push((reference, label.as_str(), sheet.as_str()));
                }
            }
        }
        xml.close("row")?;
    }
    xml.close("sheetData")?;

    if !links.is_empty() {
        xml.open("hyperlinks", &[])?;
        for (reference, label, target) in links {
            let location = format!("{}!A1", quote_sheet_name(target));
            xml.empty(
                "hyperlink",
                &[
                    ("ref", reference.as_str()),
                    ("location", location.as_str()),
                    ("display", label),
                ],
            )?;
        }
        xml.close("hyperlinks")?;
    }

    xml.close("worksheet")
}

fn inline_string<W: Write>(
    xml: &mut XmlPart<W>,
    reference: &str,
    text: &str,
    style: Option<&str>,
) -> io::Result<()> {
    match style {
        Some(style) => xml.open("c", &[("r", reference), ("s", style), ("t", "inlineStr")])?,
        None => xml.open("c", &[("r", reference), ("t", "inlineStr")])?,
    }
    xml.open("is", &[])?;
    xml.text_element("t", &[("xml:space", "preserve")], text)?;
    xml.close("is")?;
    xml.close("c")
}

/// A1-style reference of a 1-based column and row
pub(super) fn cell_reference(column: usize, row: usize) -> String {
    format!("{}{row}", column_letters(column))
}

/// Spreadsheet column name of a 1-based column index: 1 → A, 27 → AA
pub(super) fn column_letters(column: usize) -> String {
    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Sheet name as used in a formula reference: `'it''s'`
pub(super) fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}
