//! XLSX Writer
//!
//! `rust_xlsxwriter`を使用してグリッドをXLSX形式で書き出します。

use std::io::Write;

use rust_xlsxwriter::{Color, Format, FormatAlign, Worksheet};

use crate::error::{Result, SpreadsheetError};
use crate::grid::{Sheet, Workbook};
use crate::types::{datetime_to_serial, CellValue};

use super::DATE_NUM_FORMAT;

/// XLSXライター
#[derive(Debug)]
pub(crate) struct XlsxWriter;

/// セル書式のセット
struct Formats {
    header: Format,
    wrap: Format,
    date: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_background_color(Color::Silver),
            wrap: Format::new()
                .set_text_wrap()
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            date: Format::new().set_num_format(DATE_NUM_FORMAT),
        }
    }
}

impl XlsxWriter {
    /// ワークブックをXLSX形式で書き出す
    pub fn write<W: Write>(&self, workbook: &Workbook, writer: &mut W) -> Result<()> {
        let mut book = rust_xlsxwriter::Workbook::new();
        let formats = Formats::new();

        for sheet in workbook.sheets() {
            let worksheet = book.add_worksheet();
            worksheet.set_name(sheet.name())?;
            Self::write_sheet(worksheet, sheet, &formats)?;
        }

        let buffer = book.save_to_buffer()?;
        writer.write_all(&buffer)?;
        Ok(())
    }

    fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, formats: &Formats) -> Result<()> {
        for (col, style) in sheet.column_styles() {
            let col = to_col(col)?;
            if style.width > 0.0 {
                worksheet.set_column_width(col, style.width)?;
            }
        }

        let header_row = sheet.header_row();
        for (coord, value) in sheet.cells() {
            let col = to_col(coord.col)?;
            let row = coord.row;
            let is_header = header_row == Some(row);
            let wrapped = sheet.column_style(coord.col).map(|s| s.wrap).unwrap_or(false);

            match value {
                CellValue::String(s) if is_header => {
                    worksheet.write_string_with_format(row, col, s, &formats.header)?;
                }
                CellValue::String(s) if wrapped => {
                    worksheet.write_string_with_format(row, col, s, &formats.wrap)?;
                }
                CellValue::String(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                CellValue::Date(d) => {
                    let serial = datetime_to_serial(d).ok_or_else(|| {
                        SpreadsheetError::Write(format!("Date out of range: {}", d))
                    })?;
                    worksheet.write_number_with_format(row, col, serial, &formats.date)?;
                }
            }
        }
        Ok(())
    }
}

fn to_col(col: u32) -> Result<u16> {
    u16::try_from(col).map_err(|_| SpreadsheetError::Write(format!("Column index out of range: {}", col)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::WorkbookParser;
    use crate::security::SecurityConfig;
    use chrono::NaiveDate;

    // 書き出したXLSXをcalamineで読み戻せる
    #[test]
    fn test_write_and_read_back() {
        let mut workbook = Workbook::new();
        let sheet = workbook.create_sheet("Data");
        sheet.set_header_row(0);
        sheet.set(0, 0, CellValue::from("Header"));
        sheet.set(1, 0, CellValue::from("line1\nline2"));
        sheet.set(1, 1, CellValue::Number(42.0));
        sheet.set(1, 2, CellValue::Bool(true));
        let date = NaiveDate::from_ymd_opt(2010, 1, 29)
            .unwrap()
            .and_hms_opt(18, 30, 22)
            .unwrap();
        sheet.set(2, 0, CellValue::Date(date));

        let mut buffer = Vec::new();
        XlsxWriter.write(&workbook, &mut buffer).unwrap();

        let read = WorkbookParser::read(&buffer[..], &SecurityConfig::default()).unwrap();
        let sheet = read.sheet("Data").unwrap();
        assert_eq!(sheet.get(0, 0), Some(&CellValue::from("Header")));
        assert_eq!(sheet.get(1, 0), Some(&CellValue::from("line1\nline2")));
        assert_eq!(sheet.get(1, 1).map(|v| v.as_text()), Some("42".to_string()));
        assert_eq!(sheet.get(1, 2), Some(&CellValue::Bool(true)));
        assert_eq!(sheet.get(2, 0).and_then(|v| v.as_date()), Some(date));
    }
}
