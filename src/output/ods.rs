//! ODS Writer
//!
//! グリッドをOpenDocument Spreadsheet形式で書き出します。
//! ZIPコンテナは`zip`、`content.xml`は`quick-xml`で生成します。

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::error::Result;
use crate::grid::{Sheet, Workbook};
use crate::types::CellValue;

const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#;

const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:office", "urn:oasis:names:tc:opendocument:xmlns:office:1.0"),
    ("xmlns:style", "urn:oasis:names:tc:opendocument:xmlns:style:1.0"),
    ("xmlns:text", "urn:oasis:names:tc:opendocument:xmlns:text:1.0"),
    ("xmlns:table", "urn:oasis:names:tc:opendocument:xmlns:table:1.0"),
    ("xmlns:fo", "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0"),
    ("office:version", "1.2"),
];

/// 見出しセルのスタイル名
const HEADER_STYLE: &str = "ce-header";
/// 折り返しセルのスタイル名
const WRAP_STYLE: &str = "ce-wrap";

/// ODSライター
#[derive(Debug)]
pub(crate) struct OdsWriter;

impl OdsWriter {
    /// ワークブックをODS形式で書き出す
    ///
    /// `mimetype`は無圧縮で先頭エントリに格納します。
    pub fn write<W: Write>(&self, workbook: &Workbook, writer: &mut W) -> Result<()> {
        let content = Self::content_xml(workbook)?;

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE.as_bytes())?;
        zip.start_file("META-INF/manifest.xml", deflated)?;
        zip.write_all(MANIFEST.as_bytes())?;
        zip.start_file("content.xml", deflated)?;
        zip.write_all(&content)?;

        let buffer = zip.finish()?.into_inner();
        writer.write_all(&buffer)?;
        Ok(())
    }

    /// `content.xml`を生成
    fn content_xml(workbook: &Workbook) -> Result<Vec<u8>> {
        let mut xml = Writer::new(Vec::new());
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        xml.write_event(Event::Start(
            BytesStart::new("office:document-content").with_attributes(NAMESPACES.iter().copied()),
        ))?;

        let column_styles = collect_column_styles(workbook);
        Self::write_automatic_styles(&mut xml, &column_styles)?;

        xml.write_event(Event::Start(BytesStart::new("office:body")))?;
        xml.write_event(Event::Start(BytesStart::new("office:spreadsheet")))?;
        for sheet in workbook.sheets() {
            Self::write_table(&mut xml, sheet, &column_styles)?;
        }
        xml.write_event(Event::End(BytesEnd::new("office:spreadsheet")))?;
        xml.write_event(Event::End(BytesEnd::new("office:body")))?;
        xml.write_event(Event::End(BytesEnd::new("office:document-content")))?;

        Ok(xml.into_inner())
    }

    fn write_automatic_styles(
        xml: &mut Writer<Vec<u8>>,
        column_styles: &BTreeMap<String, String>,
    ) -> Result<()> {
        xml.write_event(Event::Start(BytesStart::new("office:automatic-styles")))?;

        for (width, name) in column_styles {
            xml.write_event(Event::Start(BytesStart::new("style:style").with_attributes([
                ("style:name", name.as_str()),
                ("style:family", "table-column"),
            ])))?;
            xml.write_event(Event::Empty(
                BytesStart::new("style:table-column-properties")
                    .with_attributes([("style:column-width", width.as_str())]),
            ))?;
            xml.write_event(Event::End(BytesEnd::new("style:style")))?;
        }

        xml.write_event(Event::Start(BytesStart::new("style:style").with_attributes([
            ("style:name", HEADER_STYLE),
            ("style:family", "table-cell"),
        ])))?;
        xml.write_event(Event::Empty(
            BytesStart::new("style:table-cell-properties")
                .with_attributes([("fo:background-color", "#c0c0c0"), ("fo:wrap-option", "wrap")]),
        ))?;
        xml.write_event(Event::Empty(
            BytesStart::new("style:text-properties").with_attributes([("fo:font-weight", "bold")]),
        ))?;
        xml.write_event(Event::End(BytesEnd::new("style:style")))?;

        xml.write_event(Event::Start(BytesStart::new("style:style").with_attributes([
            ("style:name", WRAP_STYLE),
            ("style:family", "table-cell"),
        ])))?;
        xml.write_event(Event::Empty(
            BytesStart::new("style:table-cell-properties").with_attributes([("fo:wrap-option", "wrap")]),
        ))?;
        xml.write_event(Event::End(BytesEnd::new("style:style")))?;

        xml.write_event(Event::End(BytesEnd::new("office:automatic-styles")))?;
        Ok(())
    }

    fn write_table(
        xml: &mut Writer<Vec<u8>>,
        sheet: &Sheet,
        column_styles: &BTreeMap<String, String>,
    ) -> Result<()> {
        xml.write_event(Event::Start(
            BytesStart::new("table:table").with_attributes([("table:name", sheet.name())]),
        ))?;

        let last_col = sheet.column_styles().map(|(col, _)| col).max();
        if let Some(last_col) = last_col {
            for col in 0..=last_col {
                let mut column = BytesStart::new("table:table-column");
                if let Some(style) = sheet.column_style(col).filter(|s| s.width > 0.0) {
                    if let Some(name) = column_styles.get(&column_width(style.width)) {
                        column.push_attribute(("table:style-name", name.as_str()));
                    }
                }
                xml.write_event(Event::Empty(column))?;
            }
        }

        let last_row = sheet.last_row();
        let mut row = 0;
        while let Some(last) = last_row.filter(|last| row <= *last) {
            if !sheet.row_exists(row) {
                // 連続する空行はまとめて出力する
                let mut blank = 1;
                while row + blank <= last && !sheet.row_exists(row + blank) {
                    blank += 1;
                }
                let mut empty_row = BytesStart::new("table:table-row");
                let repeated = blank.to_string();
                empty_row.push_attribute(("table:number-rows-repeated", repeated.as_str()));
                xml.write_event(Event::Start(empty_row))?;
                xml.write_event(Event::Empty(BytesStart::new("table:table-cell")))?;
                xml.write_event(Event::End(BytesEnd::new("table:table-row")))?;
                row += blank;
                continue;
            }
            Self::write_row(xml, sheet, row)?;
            row += 1;
        }

        xml.write_event(Event::End(BytesEnd::new("table:table")))?;
        Ok(())
    }

    fn write_row(xml: &mut Writer<Vec<u8>>, sheet: &Sheet, row: u32) -> Result<()> {
        xml.write_event(Event::Start(BytesStart::new("table:table-row")))?;

        let mut next_col = 0;
        let cells: Vec<_> = sheet.cells().filter(|(coord, _)| coord.row == row).collect();
        for (coord, value) in cells {
            if coord.col > next_col {
                let mut gap = BytesStart::new("table:table-cell");
                let repeated = (coord.col - next_col).to_string();
                gap.push_attribute(("table:number-columns-repeated", repeated.as_str()));
                xml.write_event(Event::Empty(gap))?;
            }
            let style = if sheet.header_row() == Some(row) {
                Some(HEADER_STYLE)
            } else if sheet.column_style(coord.col).map(|s| s.wrap).unwrap_or(false) {
                Some(WRAP_STYLE)
            } else {
                None
            };
            Self::write_cell(xml, value, style)?;
            next_col = coord.col + 1;
        }

        xml.write_event(Event::End(BytesEnd::new("table:table-row")))?;
        Ok(())
    }

    /// セルを出力
    ///
    /// 文字列は改行ごとに`text:p`要素へ分割します。
    fn write_cell(xml: &mut Writer<Vec<u8>>, value: &CellValue, style: Option<&str>) -> Result<()> {
        let mut cell = BytesStart::new("table:table-cell");
        if let Some(style) = style {
            cell.push_attribute(("table:style-name", style));
        }
        let display = match value {
            CellValue::String(_) => {
                cell.push_attribute(("office:value-type", "string"));
                None
            }
            CellValue::Number(n) => {
                let text = n.to_string();
                cell.push_attribute(("office:value-type", "float"));
                cell.push_attribute(("office:value", text.as_str()));
                Some(text)
            }
            CellValue::Bool(b) => {
                let text = b.to_string();
                cell.push_attribute(("office:value-type", "boolean"));
                cell.push_attribute(("office:boolean-value", text.as_str()));
                Some(text.to_uppercase())
            }
            CellValue::Date(d) => {
                let text = d.format("%Y-%m-%dT%H:%M:%S").to_string();
                cell.push_attribute(("office:value-type", "date"));
                cell.push_attribute(("office:date-value", text.as_str()));
                Some(d.format("%Y-%m-%d %H:%M:%S").to_string())
            }
        };
        xml.write_event(Event::Start(cell))?;

        let text = match (value, display) {
            (CellValue::String(s), _) => s.clone(),
            (_, Some(display)) => display,
            (_, None) => String::new(),
        };
        for line in text.split('\n') {
            xml.write_event(Event::Start(BytesStart::new("text:p")))?;
            xml.write_event(Event::Text(BytesText::new(line)))?;
            xml.write_event(Event::End(BytesEnd::new("text:p")))?;
        }

        xml.write_event(Event::End(BytesEnd::new("table:table-cell")))?;
        Ok(())
    }
}

/// 列幅（文字数）をODSの長さ表記に変換
fn column_width(width: f64) -> String {
    // 1文字あたり約0.075インチ
    format!("{:.3}in", width * 0.075)
}

/// ワークブック全体で使用する列幅ごとにスタイル名を割り当てる
fn collect_column_styles(workbook: &Workbook) -> BTreeMap<String, String> {
    let mut styles = BTreeMap::new();
    for sheet in workbook.sheets() {
        for (_, style) in sheet.column_styles() {
            if style.width > 0.0 {
                let width = column_width(style.width);
                let next = styles.len() + 1;
                styles.entry(width).or_insert_with(|| format!("co{}", next));
            }
        }
    }
    styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ColumnStyle;
    use crate::parser::WorkbookParser;
    use crate::security::SecurityConfig;
    use chrono::NaiveDate;

    #[test]
    fn test_content_xml_structure() {
        let mut workbook = Workbook::new();
        let sheet = workbook.create_sheet("Data & More");
        sheet.set(0, 0, CellValue::from("a<b"));
        sheet.set(0, 2, CellValue::Number(1.5));

        let xml = String::from_utf8(OdsWriter::content_xml(&workbook).unwrap()).unwrap();
        assert!(xml.contains(r#"table:name="Data &amp; More""#));
        assert!(xml.contains("a&lt;b"));
        assert!(xml.contains(r#"table:number-columns-repeated="1""#));
        assert!(xml.contains(r#"office:value="1.5""#));
    }

    // 書き出したODSをcalamineで読み戻せる
    #[test]
    fn test_write_and_read_back() {
        let mut workbook = Workbook::new();
        let sheet = workbook.create_sheet("Data");
        sheet.set_header_row(0);
        sheet.set_column_style(0, ColumnStyle { width: 30.0, wrap: true });
        sheet.set(0, 0, CellValue::from("Header"));
        sheet.set(1, 0, CellValue::from("line1\nline2"));
        sheet.set(1, 1, CellValue::Number(42.0));
        sheet.set(1, 2, CellValue::Bool(true));
        let date = NaiveDate::from_ymd_opt(2010, 1, 29)
            .unwrap()
            .and_hms_opt(18, 30, 22)
            .unwrap();
        sheet.set(4, 0, CellValue::Date(date));
        workbook.create_sheet("Second").set(0, 0, CellValue::from("x"));

        let mut buffer = Vec::new();
        OdsWriter.write(&workbook, &mut buffer).unwrap();

        let read = WorkbookParser::read(&buffer[..], &SecurityConfig::default()).unwrap();
        assert_eq!(read.sheet_names(), vec!["Data", "Second"]);
        let sheet = read.sheet("Data").unwrap();
        assert_eq!(sheet.get(0, 0), Some(&CellValue::from("Header")));
        assert_eq!(sheet.get(1, 0), Some(&CellValue::from("line1\nline2")));
        assert_eq!(sheet.get(1, 1).map(|v| v.as_text()), Some("42".to_string()));
        assert_eq!(sheet.get(1, 2), Some(&CellValue::Bool(true)));
        assert!(!sheet.row_exists(2));
        assert_eq!(sheet.get(4, 0).and_then(|v| v.as_date()), Some(date));
    }
}
