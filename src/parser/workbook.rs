//! Parser Module
//!
//! calamineを使用したワークブック解析の実装。
//! 全シートを読み込み、値を持つセルだけをメモリ上のグリッドに格納します。

use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::Result;
use crate::grid::{Sheet, Workbook};
use crate::security::{check_zip_container, read_limited, SecurityConfig};
use crate::types::{serial_to_datetime, CellCoord, CellValue};

/// ワークブックパーサー
///
/// calamineのラッパーとして、物理コンテナからグリッドへの変換を提供します。
pub(crate) struct WorkbookParser;

impl WorkbookParser {
    /// ワークブックを読み込む
    ///
    /// # 引数
    ///
    /// * `reader` - ワークブックのバイト列を読み込むリーダー
    /// * `security` - 入力サイズ・ZIP展開の制限
    ///
    /// # 戻り値
    ///
    /// * `Ok(Workbook)` - 全シートを格納したグリッド
    /// * `Err(SpreadsheetError)` - 制限超過、または解析に失敗した場合
    pub fn read<R: Read>(reader: R, security: &SecurityConfig) -> Result<Workbook> {
        // セキュリティ: 入力サイズとZIP展開サイズを事前に検査
        let buffer = read_limited(reader, security)?;
        check_zip_container(&buffer, security)?;

        let mut sheets = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        let mut workbook = Workbook::new();

        for name in sheets.sheet_names().to_vec() {
            let range = sheets.worksheet_range(&name)?;
            let sheet = Self::convert_range(&name, &range);
            debug!(
                sheet = %name,
                last_cell = ?sheet.last_row().map(|r| CellCoord::new(r, 0).to_a1_notation()),
                "worksheet loaded"
            );
            workbook.push_sheet(sheet);
        }

        Ok(workbook)
    }

    /// calamineの範囲をグリッドのシートに変換
    fn convert_range(name: &str, range: &Range<Data>) -> Sheet {
        let mut sheet = Sheet::new(name);
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        for (row, col, data) in range.used_cells() {
            if let Some(value) = Self::convert_data(data) {
                sheet.set(start_row + row as u32, start_col + col as u32, value);
            }
        }
        sheet
    }

    /// セル値の変換
    ///
    /// 空セルは`None`になります。日付セルはシリアル値（XLSX）または
    /// ISO 8601文字列（ODS）から変換します。
    fn convert_data(data: &Data) -> Option<CellValue> {
        match data {
            Data::Empty => None,
            Data::String(s) => Some(CellValue::String(s.clone())),
            Data::Int(i) => Some(CellValue::Number(*i as f64)),
            Data::Float(f) => Some(CellValue::Number(*f)),
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                Some(
                    serial_to_datetime(serial)
                        .map(CellValue::Date)
                        .unwrap_or(CellValue::Number(serial)),
                )
            }
            Data::DateTimeIso(s) => Some(
                parse_iso_datetime(s)
                    .map(CellValue::Date)
                    .unwrap_or_else(|| CellValue::String(s.clone())),
            ),
            Data::DurationIso(s) => Some(CellValue::String(s.clone())),
            Data::Error(e) => Some(CellValue::String(format!("{:?}", e))),
        }
    }
}

/// ISO 8601の日付・日付時刻文字列を解析
fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
