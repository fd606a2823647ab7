//! Sheets Module
//!
//! エンティティごとのシートアダプタと、それらが共有する列スキーマ・シート基盤。
//!
//! 各アダプタは次の3つの操作を提供します。
//!
//! - `create`: 最新スキーマのヘッダー行だけを持つシートを作り直す
//! - `verify`: シートの存在、ヘッダー、各データ行の必須セルと値を検証する
//! - `add` / `get`: 1行の書き込みと、1行からのエンティティ再構築
//!
//! 過去のスキーマはアダプタの派生型ではなく、静的な列定義の表
//! （[`Schema`]）として表現します。読み書きの処理はエンティティごとに1つで、
//! 列が存在しない旧バージョンでは[`Schema::col`]が`None`を返します。

pub(crate) mod annotation;
pub(crate) mod document;
pub(crate) mod external_ref;
pub(crate) mod extracted_license;
pub(crate) mod file;
pub(crate) mod package;
pub(crate) mod relationship;
pub(crate) mod reviewer;
pub(crate) mod snippet;

use tracing::debug;

use crate::codec::truncate_cell_text;
use crate::error::{Result, SpreadsheetError};
use crate::grid::{ColumnStyle, Sheet, Workbook};
use crate::types::CellValue;

/// 必須列
pub(crate) const REQUIRED: u8 = 0b01;
/// 折り返し列
pub(crate) const WRAP: u8 = 0b10;
/// 任意・折り返しなし
pub(crate) const PLAIN: u8 = 0;

/// 1列分の定義
#[derive(Debug, Clone, Copy)]
pub(crate) struct Column<F: 'static> {
    pub field: F,
    pub title: &'static str,
    pub width: f64,
    flags: u8,
}

impl<F: Copy> Column<F> {
    pub const fn new(field: F, title: &'static str, width: f64, flags: u8) -> Self {
        Self {
            field,
            title,
            width,
            flags,
        }
    }

    pub fn required(&self) -> bool {
        self.flags & REQUIRED != 0
    }

    pub fn wrap(&self) -> bool {
        self.flags & WRAP != 0
    }
}

/// 最終列（ユーザー定義列の見出し）
///
/// 検証の対象外で、常に折り返し表示です。
#[derive(Debug, Clone, Copy)]
pub(crate) struct Trailer {
    pub title: &'static str,
    pub width: f64,
}

/// シートの列スキーマ
#[derive(Debug)]
pub(crate) struct Schema<F: 'static> {
    pub columns: &'static [Column<F>],
    pub trailer: Option<Trailer>,
}

impl<F: Copy + PartialEq> Schema<F> {
    /// フィールドの列番号（このバージョンに列がなければ`None`）
    pub fn col(&self, field: F) -> Option<u32> {
        self.columns
            .iter()
            .position(|c| c.field == field)
            .map(|i| i as u32)
    }

    pub fn title(&self, field: F) -> &'static str {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.title)
            .unwrap_or("")
    }

    /// ヘッダー行だけを持つシートを作成
    ///
    /// 同名のシートは削除してから作り直すため、何度呼び出しても
    /// 結果はヘッダー行のみのシートになります。
    ///
    /// # 引数
    ///
    /// * `workbook` - 作成先のワークブック
    /// * `name` - シート名
    /// * `styled` - 列幅・折り返しを設定するか
    pub fn create<'w>(&self, workbook: &'w mut Workbook, name: &str, styled: bool) -> &'w mut Sheet {
        let sheet = workbook.create_sheet(name);
        sheet.set_header_row(0);
        for (i, column) in self.columns.iter().enumerate() {
            let col = i as u32;
            sheet.set(0, col, CellValue::from(column.title));
            if styled {
                sheet.set_column_style(
                    col,
                    ColumnStyle {
                        width: column.width,
                        wrap: column.wrap(),
                    },
                );
            }
        }
        if let Some(trailer) = self.trailer {
            let col = self.columns.len() as u32;
            sheet.set(0, col, CellValue::from(trailer.title));
            if styled {
                sheet.set_column_style(
                    col,
                    ColumnStyle {
                        width: trailer.width,
                        wrap: true,
                    },
                );
            }
        }
        debug!(sheet = name, columns = self.columns.len(), "sheet created");
        sheet
    }

    /// ヘッダー行の見出しを検証（最終のユーザー定義列は対象外）
    pub fn verify_header(&self, base: &SheetBase<'_>, label: &str) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            let col = base.first_col + i as u32;
            let matches = base
                .cell(base.first_row, col)
                .map(|v| v.as_text() == column.title)
                .unwrap_or(false);
            if !matches {
                return Err(SpreadsheetError::Format(format!(
                    "Column {} missing for {} worksheet",
                    column.title, label
                )));
            }
        }
        Ok(())
    }

    /// 必須セルの有無を検証
    ///
    /// セルが存在しない場合と空文字列の場合は同じく「値なし」とみなします。
    pub fn check_required(&self, base: &SheetBase<'_>, row: u32, suffix: &str) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if column.required() && base.text(row, base.first_col + i as u32).is_none() {
                return Err(SpreadsheetError::invalid(
                    &base.name,
                    row,
                    format!("Required cell {} missing for row {}{}", column.title, row, suffix),
                ));
            }
        }
        Ok(())
    }
}

/// シート共通の基盤
///
/// データ行数は開いた時点で計算して保持します。ヘッダーの次の行から、
/// 先頭列のセルが存在しないか空白の行の直前までがデータ行です。
///
/// 文字列の書き込みはすべてワークブックの文字数上限で切り詰めます。
#[derive(Debug)]
pub(crate) struct SheetBase<'a> {
    pub name: String,
    sheet: Option<&'a mut Sheet>,
    pub first_row: u32,
    pub first_col: u32,
    data_rows: u32,
    max_chars: usize,
}

impl<'a> SheetBase<'a> {
    /// シートを名前で開く（存在しない場合も`Ok`で、`exists()`が`false`になる）
    pub fn open(workbook: &'a mut Workbook, name: &str) -> Self {
        let max_chars = workbook.max_text_chars();
        let sheet = workbook.sheet_mut(name);
        let (first_row, first_col) = sheet
            .as_deref()
            .and_then(|s| s.first_row().map(|r| (r, s.first_col(r).unwrap_or(0))))
            .unwrap_or((0, 0));
        let mut base = Self {
            name: name.to_string(),
            sheet,
            first_row,
            first_col,
            data_rows: 0,
            max_chars,
        };
        base.data_rows = base.count_data_rows();
        if base.exists() {
            debug!(sheet = name, rows = base.num_data_rows(), "sheet opened");
        }
        base
    }

    fn count_data_rows(&self) -> u32 {
        let mut count = 0;
        while self.text(self.first_data_row() + count, self.first_col).is_some() {
            count += 1;
        }
        count
    }

    pub fn exists(&self) -> bool {
        self.sheet.is_some()
    }

    /// シートが存在しない場合のエラー
    pub fn missing(&self, label: &str) -> SpreadsheetError {
        SpreadsheetError::Format(format!("Worksheet for {} does not exist", label))
    }

    pub fn first_data_row(&self) -> u32 {
        self.first_row + 1
    }

    pub fn num_data_rows(&self) -> u32 {
        self.data_rows
    }

    /// データ行の範囲
    pub fn data_rows(&self) -> std::ops::Range<u32> {
        self.first_data_row()..self.first_data_row() + self.data_rows
    }

    pub fn row_exists(&self, row: u32) -> bool {
        self.sheet.as_deref().map(|s| s.row_exists(row)).unwrap_or(false)
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.sheet.as_deref().and_then(|s| s.get(row, col))
    }

    /// セルの文字列値（存在しないか空白の場合は`None`）
    pub fn text(&self, row: u32, col: u32) -> Option<String> {
        self.cell(row, col)
            .filter(|v| !v.is_blank())
            .map(|v| v.as_text())
    }

    /// 列が存在するバージョンの場合のみセルの文字列値を取得
    pub fn text_opt(&self, row: u32, col: Option<u32>) -> Option<String> {
        col.and_then(|c| self.text(row, c))
    }

    /// 1セルの文字数上限
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// セルを書き込む
    ///
    /// 上限を超える文字列は`... [MORE] ...`付きで切り詰めます。
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        let value = match value.into() {
            CellValue::String(s) if s.chars().count() > self.max_chars => {
                CellValue::String(truncate_cell_text(&s, self.max_chars))
            }
            value => value,
        };
        if let Some(sheet) = self.sheet.as_deref_mut() {
            sheet.set(row, col, value);
        }
    }

    /// 値が存在する場合のみセルを書き込む
    pub fn set_opt(&mut self, row: u32, col: Option<u32>, value: Option<&str>) {
        if let (Some(col), Some(value)) = (col, value) {
            self.set(row, col, value);
        }
    }

    /// 最後のデータ行の直後に行を追加し、その行番号を返す
    pub fn add_row(&mut self) -> u32 {
        let row = self.first_data_row() + self.data_rows;
        self.data_rows += 1;
        row
    }

    /// ヘッダー以外の全データ行を削除
    pub fn clear(&mut self) {
        let rows: Vec<u32> = self.data_rows().collect();
        if let Some(sheet) = self.sheet.as_deref_mut() {
            for row in rows {
                sheet.remove_row(row);
            }
        }
        self.data_rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum TestField {
        Id,
        Name,
        Comment,
    }

    static TEST_COLUMNS: [Column<TestField>; 3] = [
        Column::new(TestField::Id, "ID", 20.0, REQUIRED),
        Column::new(TestField::Name, "Name", 30.0, REQUIRED | WRAP),
        Column::new(TestField::Comment, "Comment", 40.0, WRAP),
    ];

    static TEST_SCHEMA: Schema<TestField> = Schema {
        columns: &TEST_COLUMNS,
        trailer: Some(Trailer {
            title: "User Defined Columns...",
            width: 50.0,
        }),
    };

    // createを2回呼んでもヘッダー行のみのシートになる
    #[test]
    fn test_create_idempotent() {
        let mut wb = Workbook::new();
        TEST_SCHEMA.create(&mut wb, "Test", true);
        {
            let mut base = SheetBase::open(&mut wb, "Test");
            let row = base.add_row();
            base.set(row, 0, "a");
            base.set(row, 1, "b");
        }
        TEST_SCHEMA.create(&mut wb, "Test", true);
        let base = SheetBase::open(&mut wb, "Test");
        assert_eq!(base.num_data_rows(), 0);
        assert_eq!(base.text(0, 3), Some("User Defined Columns...".to_string()));
        assert!(TEST_SCHEMA.verify_header(&base, "Test").is_ok());
        assert_eq!(wb.sheets().len(), 1);
    }

    #[test]
    fn test_column_styles() {
        let mut wb = Workbook::new();
        let sheet = TEST_SCHEMA.create(&mut wb, "Test", true);
        assert_eq!(sheet.column_style(0).map(|s| s.wrap), Some(false));
        assert_eq!(sheet.column_style(1).map(|s| s.width), Some(30.0));
        assert_eq!(sheet.column_style(3).map(|s| s.wrap), Some(true));

        let plain = TEST_SCHEMA.create(&mut wb, "Plain", false);
        assert_eq!(plain.column_style(0), None);
    }

    #[test]
    fn test_data_rows_stop_at_blank() {
        let mut wb = Workbook::new();
        TEST_SCHEMA.create(&mut wb, "Test", false);
        let sheet = wb.sheet_mut("Test").unwrap();
        sheet.set(1, 0, CellValue::from("r1"));
        sheet.set(2, 0, CellValue::from("r2"));
        sheet.set(3, 0, CellValue::from(" "));
        sheet.set(4, 0, CellValue::from("r4"));

        let mut base = SheetBase::open(&mut wb, "Test");
        assert_eq!(base.num_data_rows(), 2);
        // 空白行は上書きされる
        assert_eq!(base.add_row(), 3);
        base.clear();
        assert_eq!(base.num_data_rows(), 0);
        assert!(!base.row_exists(1));
        assert!(base.row_exists(0));
    }

    #[test]
    fn test_missing_sheet() {
        let mut wb = Workbook::new();
        let base = SheetBase::open(&mut wb, "Nope");
        assert!(!base.exists());
        assert_eq!(
            base.missing("Relationships").to_string(),
            "Worksheet for Relationships does not exist"
        );
    }

    #[test]
    fn test_verify_header_and_required() {
        let mut wb = Workbook::new();
        TEST_SCHEMA.create(&mut wb, "Test", false);
        let sheet = wb.sheet_mut("Test").unwrap();
        sheet.set(0, 1, CellValue::from("Wrong"));
        sheet.set(1, 0, CellValue::from("id"));
        sheet.set(1, 1, CellValue::from(""));

        let base = SheetBase::open(&mut wb, "Test");
        let err = TEST_SCHEMA.verify_header(&base, "Test").unwrap_err();
        assert_eq!(err.to_string(), "Column Name missing for Test worksheet");

        let err = TEST_SCHEMA.check_required(&base, 1, " in test sheet").unwrap_err();
        assert!(err
            .to_string()
            .ends_with("Required cell Name missing for row 1 in test sheet"));
        assert_eq!(TEST_SCHEMA.col(TestField::Comment), Some(2));
        assert_eq!(TEST_SCHEMA.title(TestField::Name), "Name");
    }

    // 先頭列がずれたシートでも必須セルは見出しと同じ列で検証する
    #[test]
    fn test_check_required_with_column_offset() {
        let mut wb = Workbook::new();
        let sheet = wb.create_sheet("Offset");
        for (i, title) in ["ID", "Name", "Comment"].iter().enumerate() {
            sheet.set(0, 2 + i as u32, CellValue::from(*title));
        }
        sheet.set(1, 2, CellValue::from("id"));
        sheet.set(1, 3, CellValue::from("name"));
        sheet.set(2, 2, CellValue::from("id2"));

        let base = SheetBase::open(&mut wb, "Offset");
        assert_eq!(base.first_col, 2);
        assert!(TEST_SCHEMA.verify_header(&base, "Offset").is_ok());
        assert!(TEST_SCHEMA.check_required(&base, 1, "").is_ok());
        let err = TEST_SCHEMA.check_required(&base, 2, "").unwrap_err();
        assert!(err.to_string().ends_with("Required cell Name missing for row 2"));
    }

    // 上限を超える文字列はsetで切り詰められる
    #[test]
    fn test_set_truncates_long_text() {
        let mut wb = Workbook::new();
        wb.set_max_text_chars(100);
        TEST_SCHEMA.create(&mut wb, "Test", false);
        let mut base = SheetBase::open(&mut wb, "Test");
        assert_eq!(base.max_chars(), 100);
        let row = base.add_row();
        base.set(row, 1, "x".repeat(500));
        base.set(row, 2, "short");

        let name = base.text(row, 1).unwrap();
        assert_eq!(name.chars().count(), 94);
        assert!(name.ends_with("... [MORE] ..."));
        assert_eq!(base.text(row, 2), Some("short".to_string()));
    }
}
