use super::*;
use crate::report::{Cell, Sheet};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::Read;

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

fn sheet(name: &str, rows: Vec<Vec<Cell>>) -> Sheet {
    Sheet {
        name: name.to_string(),
        rows,
        column_widths: vec![10, 20],
    }
}

fn two_sheet_report() -> Report {
    Report {
        sheets: vec![
            sheet(
                "Summary",
                vec![
                    vec![Cell::text("#"), Cell::text("Run ID")],
                    vec![
                        Cell::Link {
                            label: "1".to_string(),
                            sheet: "1 Failed".to_string(),
                        },
                        Cell::text("run-1"),
                    ],
                ],
            ),
            sheet(
                "1 Failed",
                vec![vec![Cell::text("Error"), Cell::text("x < y & \"z\"")]],
            ),
        ],
        file_name: "Flow_run_history.xlsx".to_string(),
    }
}

#[test]
fn writes_all_package_parts() {
    let bytes = XlsxSerializer::new().serialize(&two_sheet_report()).unwrap();

    let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
            "xl/worksheets/sheet2.xml",
        ]
    );
}

#[test]
fn every_part_is_well_formed_xml() {
    let mut report = two_sheet_report();
    report.sheets[1].rows.push(vec![Cell::text("bell \u{7} & <tag>"), Cell::Number(f64::NAN)]);
    let bytes = XlsxSerializer::new().serialize(&report).unwrap();

    let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    for name in names {
        let xml = read_part(&bytes, &name);
        let mut reader = Reader::from_str(&xml);
        let mut depth = 0;
        loop {
            match reader.read_event() {
                Ok(Event::Start(_)) => depth += 1,
                Ok(Event::End(_)) => depth -= 1,
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("{name} is not well-formed: {e}"),
            }
        }
        assert_eq!(depth, 0, "{name} has unbalanced elements");
    }
}

#[test]
fn workbook_lists_sheets_in_order() {
    let bytes = XlsxSerializer::new().serialize(&two_sheet_report()).unwrap();

    let workbook = read_part(&bytes, "xl/workbook.xml");
    let summary = workbook.find(r#"<sheet name="Summary" sheetId="1" r:id="rId1"/>"#);
    let run = workbook.find(r#"<sheet name="1 Failed" sheetId="2" r:id="rId2"/>"#);
    assert!(summary.is_some() && run.is_some());
    assert!(summary < run);

    let rels = read_part(&bytes, "xl/_rels/workbook.xml.rels");
    assert!(rels.contains(r#"Id="rId2""#) && rels.contains("worksheets/sheet2.xml"));
    assert!(rels.contains(r#"Id="rId3""#) && rels.contains("styles.xml"));

    let types = read_part(&bytes, "[Content_Types].xml");
    assert!(types.contains("/xl/worksheets/sheet2.xml"));
    assert!(!types.contains("/xl/worksheets/sheet3.xml"));
}

#[test]
fn summary_links_point_at_run_sheet() {
    let bytes = XlsxSerializer::new().serialize(&two_sheet_report()).unwrap();

    let summary = read_part(&bytes, "xl/worksheets/sheet1.xml");
    assert!(summary.contains(
        r#"<hyperlink ref="A2" location="&apos;1 Failed&apos;!A1" display="1"/>"#
    ));
}

#[test]
fn cell_text_is_escaped() {
    let bytes = XlsxSerializer::new().serialize(&two_sheet_report()).unwrap();

    let run_sheet = read_part(&bytes, "xl/worksheets/sheet2.xml");
    assert!(run_sheet.contains("x &lt; y &amp; &quot;z&quot;"));
}

#[test]
fn output_is_deterministic() {
    let report = two_sheet_report();
    let serializer = XlsxSerializer::new();
    let first = read_part(&serializer.serialize(&report).unwrap(), "xl/worksheets/sheet1.xml");
    let second = read_part(&serializer.serialize(&report).unwrap(), "xl/worksheets/sheet1.xml");
    assert_eq!(first, second);
}

#[test]
fn rejects_empty_report() {
    let report = Report {
        sheets: Vec::new(),
        file_name: "x.xlsx".to_string(),
    };
    assert!(matches!(
        XlsxSerializer::new().serialize(&report),
        Err(Error::Assembly(_))
    ));
}

#[test]
fn rejects_case_insensitive_duplicate_names() {
    let report = Report {
        sheets: vec![sheet("Summary", Vec::new()), sheet("SUMMARY", Vec::new())],
        file_name: "x.xlsx".to_string(),
    };
    match XlsxSerializer::new().serialize(&report) {
        Err(Error::Assembly(message)) => assert!(message.contains("SUMMARY")),
        other => panic!("expected assembly error, got {other:?}"),
    }
}

#[test]
fn reports_xlsx_content_type() {
    assert_eq!(
        XlsxSerializer::new().content_type(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
}
