//! Inspection of serialized workbooks

use std::io::{Cursor, Read};

/// Read one part of an `.xlsx` archive as text
pub fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("artifact is a zip archive");
    let mut part = archive
        .by_name(name)
        .unwrap_or_else(|e| panic!("missing part {name}: {e}"));
    let mut content = String::new();
    part.read_to_string(&mut content).expect("part is UTF-8");
    content
}

/// Sheet names in workbook order, XML entities left as written
pub fn sheet_names(bytes: &[u8]) -> Vec<String> {
    let workbook = read_part(bytes, "xl/workbook.xml");
    workbook
        .split("<sheet name=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

/// XML of the worksheet at 1-based `position`
pub fn worksheet(bytes: &[u8], position: usize) -> String {
    read_part(bytes, &format!("xl/worksheets/sheet{position}.xml"))
}

/// Inline string cell `reference` holding exactly `text`
pub fn inline_cell(reference: &str, text: &str) -> String {
    format!(r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{text}</t></is></c>"#)
}

/// Assert the worksheet has the inline string `text` at `reference`
pub fn assert_cell(sheet_xml: &str, reference: &str, text: &str) {
    let expected = inline_cell(reference, text);
    assert!(
        sheet_xml.contains(&expected),
        "expected {expected} in worksheet:\n{sheet_xml}"
    );
}

/// Assert the worksheet has no value at `reference`
pub fn assert_no_cell(sheet_xml: &str, reference: &str) {
    let needle = format!(r#"<c r="{reference}""#);
    assert!(
        !sheet_xml.contains(&needle),
        "expected {reference} to be empty in worksheet:\n{sheet_xml}"
    );
}
