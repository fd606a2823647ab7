//! Output Module
//!
//! メモリ上のグリッドを物理コンテナ（XLSX / ODS）に書き出すモジュール。
//! 列スキーマとセル値は両形式で共通で、異なるのはコンテナのみです。

mod ods;
mod xlsx;

use std::io::Write;

use crate::api::SpreadsheetFormat;
use crate::error::Result;
use crate::grid::Workbook;

pub(crate) use ods::OdsWriter;
pub(crate) use xlsx::XlsxWriter;

/// 日付セルに適用する表示書式
pub(crate) const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// ワークブックライター（Strategy Pattern）
///
/// 各物理形式をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub(crate) enum WorkbookWriter {
    Xlsx,
    Ods,
}

impl WorkbookWriter {
    /// 物理形式からライターを生成
    pub fn from_format(format: SpreadsheetFormat) -> Self {
        match format {
            SpreadsheetFormat::Xlsx => WorkbookWriter::Xlsx,
            SpreadsheetFormat::Ods => WorkbookWriter::Ods,
        }
    }

    /// ワークブックを指定された形式で書き出す
    ///
    /// # 引数
    ///
    /// * `workbook` - 書き出すグリッド
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(SpreadsheetError)` - エラーが発生した場合
    pub fn write<W: Write>(&self, workbook: &Workbook, writer: &mut W) -> Result<()> {
        match self {
            WorkbookWriter::Xlsx => XlsxWriter.write(workbook, writer),
            WorkbookWriter::Ods => OdsWriter.write(workbook, writer),
        }
    }
}
