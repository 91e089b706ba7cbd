//! Package-level workbook parts and the XML writer they share

use std::borrow::Cow;
use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::report::Sheet;

pub(super) const SPREADSHEET_NS: &str =
    "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(super) const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const WORKBOOK_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const STYLES_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const WORKSHEET_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const RELATIONSHIPS_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// One XML part being written
///
/// Element names are static; attribute values and text are escaped by
/// `quick_xml` after characters XML 1.0 cannot carry have been dropped.
pub(super) struct XmlPart<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlPart<W> {
    /// Start a part with the standalone UTF-8 declaration
    pub(super) fn new(out: W) -> io::Result<Self> {
        let mut writer = Writer::new(out);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(Self { writer })
    }

    pub(super) fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> io::Result<()> {
        self.writer.write_event(Event::Start(element(name, attributes)))
    }

    pub(super) fn close(&mut self, name: &str) -> io::Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))
    }

    pub(super) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> io::Result<()> {
        self.writer.write_event(Event::Empty(element(name, attributes)))
    }

    pub(super) fn text(&mut self, text: &str) -> io::Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(&xml_chars(text))))
    }

    /// Element holding only text: `<name>text</name>`
    pub(super) fn text_element(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> io::Result<()> {
        self.open(name, attributes)?;
        self.text(text)?;
        self.close(name)
    }
}

fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute((*key, xml_chars(value).as_ref()));
    }
    start
}

/// `text` without the characters XML 1.0 cannot represent
pub(super) fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

pub(super) fn content_types<W: Write>(out: W, sheet_count: usize) -> io::Result<()> {
    let mut xml = XmlPart::new(out)?;
    xml.open("Types", &[("xmlns", CONTENT_TYPES_NS)])?;
    xml.empty(
        "Default",
        &[("Extension", "rels"), ("ContentType", RELATIONSHIPS_TYPE)],
    )?;
    xml.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    xml.empty(
        "Override",
        &[("PartName", "/xl/workbook.xml"), ("ContentType", WORKBOOK_TYPE)],
    )?;
    xml.empty(
        "Override",
        &[("PartName", "/xl/styles.xml"), ("ContentType", STYLES_TYPE)],
    )?;
    for i in 1..=sheet_count {
        let part_name = format!("/xl/worksheets/sheet{i}.xml");
        xml.empty(
            "Override",
            &[("PartName", part_name.as_str()), ("ContentType", WORKSHEET_TYPE)],
        )?;
    }
    xml.close("Types")
}

pub(super) fn root_rels<W: Write>(out: W) -> io::Result<()> {
    let mut xml = XmlPart::new(out)?;
    xml.open("Relationships", &[("xmlns", PACKAGE_RELATIONSHIPS_NS)])?;
    xml.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", OFFICE_DOCUMENT_REL),
            ("Target", "xl/workbook.xml"),
        ],
    )?;
    xml.close("Relationships")
}

pub(super) fn workbook<W: Write>(out: W, sheets: &[Sheet]) -> io::Result<()> {
    let mut xml = XmlPart::new(out)?;
    xml.open(
        "workbook",
        &[("xmlns", SPREADSHEET_NS), ("xmlns:r", RELATIONSHIPS_NS)],
    )?;
    xml.open("sheets", &[])?;
    for (i, sheet) in sheets.iter().enumerate() {
        let id = (i + 1).to_string();
        let rel_id = format!("rId{id}");
        xml.empty(
            "sheet",
            &[
                ("name", sheet.name.as_str()),
                ("sheetId", id.as_str()),
                ("r:id", rel_id.as_str()),
            ],
        )?;
    }
    xml.close("sheets")?;
    xml.close("workbook")
}

/// Worksheets take rId1..=N, the stylesheet rId(N+1)
pub(super) fn workbook_rels<W: Write>(out: W, sheet_count: usize) -> io::Result<()> {
    let mut xml = XmlPart::new(out)?;
    xml.open("Relationships", &[("xmlns", PACKAGE_RELATIONSHIPS_NS)])?;
    for i in 1..=sheet_count {
        let id = format!("rId{i}");
        let target = format!("worksheets/sheet{i}.xml");
        xml.empty(
            "Relationship",
            &[
                ("Id", id.as_str()),
                ("Type", WORKSHEET_REL),
                ("Target", target.as_str()),
            ],
        )?;
    }
    let styles_id = format!("rId{}", sheet_count + 1);
    xml.empty(
        "Relationship",
        &[
            ("Id", styles_id.as_str()),
            ("Type", STYLES_REL),
            ("Target", "styles.xml"),
        ],
    )?;
    xml.close("Relationships")
}

/// Style 0 is the default cell format, style 1 the hyperlink font
pub(super) fn styles<W: Write>(out: W) -> io::Result<()> {
    let mut xml = XmlPart::new(out)?;
    xml.open("styleSheet", &[("xmlns", SPREADSHEET_NS)])?;

    xml.open("fonts", &[("count", "2")])?;
    xml.open("font", &[])?;
    font_face(&mut xml)?;
    xml.close("font")?;
    xml.open("font", &[])?;
    xml.empty("u", &[])?;
    xml.empty("sz", &[("val", "11")])?;
    xml.empty("color", &[("rgb", "FF0563C1")])?;
    xml.empty("name", &[("val", "Calibri")])?;
    xml.empty("family", &[("val", "2")])?;
    xml.close("font")?;
    xml.close("fonts")?;

    xml.open("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        xml.open("fill", &[])?;
        xml.empty("patternFill", &[("patternType", pattern)])?;
        xml.close("fill")?;
    }
    xml.close("fills")?;

    xml.open("borders", &[("count", "1")])?;
    xml.open("border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        xml.empty(side, &[])?;
    }
    xml.close("border")?;
    xml.close("borders")?;

    xml.open("cellStyleXfs", &[("count", "1")])?;
    xml.empty(
        "xf",
        &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
    )?;
    xml.close("cellStyleXfs")?;

    xml.open("cellXfs", &[("count", "2")])?;
    xml.empty(
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "0"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
        ],
    )?;
    xml.empty(
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "1"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
            ("applyFont", "1"),
        ],
    )?;
    xml.close("cellXfs")?;

    xml.open("cellStyles", &[("count", "1")])?;
    xml.empty(
        "cellStyle",
        &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")],
    )?;
    xml.close("cellStyles")?;

    xml.close("styleSheet")
}

fn font_face<W: Write>(xml: &mut XmlPart<W>) -> io::Result<()> {
    xml.empty("sz", &[("val", "11")])?;
    xml.empty("name", &[("val", "Calibri")])?;
    xml.empty("family", &[("val", "2")])
}
