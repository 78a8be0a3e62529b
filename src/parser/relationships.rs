//! Package-level parts: workbook relationships, sheet list, shared strings and the stylesheet.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;
use crate::xml_helpers::{attr_bool, attr_string};

use super::styles::{parse_styles, StyleTable};
use super::worksheet::SheetInfo;

/// Workbook relationships parsed from xl/_rels/workbook.xml.rels
///
/// Paths are resolved relative to the xl/ directory and stored as full
/// archive paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// rId -> full path, e.g. "rId1" -> "xl/worksheets/sheet1.xml"
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
    pub styles: Option<String>,
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

/// Parse workbook relationships from xl/_rels/workbook.xml.rels
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookRelationships {
    let mut rels = WorkbookRelationships::default();

    let Ok(file) = archive.by_name("xl/_rels/workbook.xml.rels") else {
        return rels; // Relationships file is optional
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_string(e, b"Id").unwrap_or_default();
                let target = attr_string(e, b"Target").unwrap_or_default();
                let rel_type = attr_string(e, b"Type").unwrap_or_default();

                if target.is_empty() {
                    buf.clear();
                    continue;
                }
                let full_path = resolve_target(&target);

                if rel_type.ends_with("/worksheet") && !id.is_empty() {
                    rels.worksheets.insert(id, full_path);
                } else if rel_type.ends_with("/sharedStrings") {
                    rels.shared_strings = Some(full_path);
                } else if rel_type.ends_with("/styles") {
                    rels.styles = Some(full_path);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// What xl/workbook.xml says about the workbook as a whole.
#[derive(Debug, Default)]
pub(super) struct WorkbookInfo {
    /// Sheets in workbook order
    pub sheets: Vec<SheetInfo>,
    /// Date serials count from 1904-01-01 instead of 1900-01-00
    pub date1904: bool,
}

/// Sheet names, part paths and the date system from xl/workbook.xml.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<WorkbookInfo> {
    let file = archive.by_name("xl/workbook.xml")?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);

    let mut sheets = Vec::new();
    let mut date1904 = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e))
                if e.local_name().as_ref() == b"workbookPr" =>
            {
                date1904 = attr_bool(e, b"date1904").unwrap_or(false);
            }
            Ok(Event::Empty(ref e) | Event::Start(ref e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut r_id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => {
                            name = attr
                                .unescape_value()
                                .map(|v| v.into_owned())
                                .unwrap_or_default();
                        }
                        // r:id attribute (namespace prefixed)
                        key if key.ends_with(b":id") => {
                            r_id = std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                        }
                        _ => {}
                    }
                }

                if !name.is_empty() {
                    let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
                        let idx = sheets.len() + 1;
                        format!("xl/worksheets/sheet{idx}.xml")
                    });
                    sheets.push(SheetInfo { name, path });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(WorkbookInfo { sheets, date1904 })
}

/// Parse the shared string table.
///
/// Rich-text runs are concatenated; phonetic guides (`<rPh>`) are skipped.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let Ok(file) = archive.by_name(sst_path) else {
        return Vec::new(); // SharedStrings is optional
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!("shared strings: {}", strings.len());
    strings
}

/// Parse the stylesheet, or an empty table when the workbook has none.
pub(super) fn parse_stylesheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<StyleTable> {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return Ok(StyleTable::default());
    };
    parse_styles(BufReader::new(file))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn archive(parts: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
        <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/data.xml"/>
        <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/other.xml"/>
        <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
        <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
    </Relationships>"#;

    #[test]
    fn test_relationship_targets() {
        let mut zip = archive(&[("xl/_rels/workbook.xml.rels", RELS)]);
        let rels = parse_workbook_relationships(&mut zip);

        assert_eq!(rels.worksheets["rId1"], "xl/worksheets/data.xml");
        assert_eq!(rels.worksheets["rId2"], "xl/worksheets/other.xml");
        assert_eq!(rels.shared_strings.as_deref(), Some("xl/sharedStrings.xml"));
        assert_eq!(rels.styles.as_deref(), Some("xl/styles.xml"));
    }

    #[test]
    fn test_missing_relationships_are_empty() {
        let mut zip = archive(&[("xl/workbook.xml", "<workbook/>")]);
        let rels = parse_workbook_relationships(&mut zip);
        assert!(rels.worksheets.is_empty());
        assert!(rels.shared_strings.is_none());
    }

    #[test]
    fn test_sheet_order_and_fallback_path() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="Q1 &amp; Q2" sheetId="1" r:id="rId2"/>
                <sheet name="Notes" sheetId="2" r:id="rId9"/>
            </sheets>
        </workbook>"#;
        let mut zip = archive(&[("xl/workbook.xml", workbook)]);
        let mut rels = HashMap::new();
        rels.insert("rId2".to_string(), "xl/worksheets/other.xml".to_string());

        let info = get_sheet_info(&mut zip, &rels).unwrap();
        assert!(!info.date1904);
        let sheets = info.sheets;
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "Q1 & Q2");
        assert_eq!(sheets[0].path, "xl/worksheets/other.xml");
        assert_eq!(sheets[1].name, "Notes");
        assert_eq!(sheets[1].path, "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_date1904_flag() {
        let workbook = r#"<workbook>
            <workbookPr date1904="1" defaultThemeVersion="124226"/>
            <sheets><sheet name="Only" sheetId="1"/></sheets>
        </workbook>"#;
        let mut zip = archive(&[("xl/workbook.xml", workbook)]);
        let info = get_sheet_info(&mut zip, &HashMap::new()).unwrap();
        assert!(info.date1904);
        assert_eq!(info.sheets.len(), 1);
    }

    #[test]
    fn test_shared_strings_runs_and_phonetics() {
        let sst = r#"<sst>
            <si><t>plain</t></si>
            <si><r><t>rich </t></r><r><t>text</t></r><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
            <si/>
            <si><t xml:space="preserve"> padded </t></si>
        </sst>"#;
        let mut zip = archive(&[("xl/sharedStrings.xml", sst)]);
        let strings = parse_shared_strings(&mut zip, None);
        assert_eq!(strings, vec!["plain", "rich text", "", " padded "]);
    }

    #[test]
    fn test_missing_stylesheet_is_default() {
        let mut zip = archive(&[("xl/workbook.xml", "<workbook/>")]);
        let styles = parse_stylesheet(&mut zip, None).unwrap();
        assert_eq!(styles.default_font_name(), "Calibri");
    }
}
