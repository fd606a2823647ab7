//! Grid Module
//!
//! ワークブックのメモリ上表現（スパースなセルグリッド）を提供するモジュール。
//! 物理コンテナ（XLSX/ODS）との変換は`parser`と`output`が担当し、
//! シートアダプタはこのグリッドだけを読み書きします。

use std::collections::BTreeMap;

use unicode_width::UnicodeWidthStr;

use crate::codec::MAX_CHARACTERS_PER_CELL;
use crate::types::{CellCoord, CellValue};

/// 列の見た目に関する設定（幅・折り返し）
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ColumnStyle {
    /// 列幅（文字数単位）
    pub width: f64,
    /// テキストを折り返すかどうか
    pub wrap: bool,
}

/// 1枚のシート
///
/// 値を持つセルのみを保持します。行は「1つ以上のセルを持つ」場合に
/// 存在するとみなされます。
#[derive(Debug, Clone, Default)]
pub(crate) struct Sheet {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u32, CellValue>>,
    column_styles: BTreeMap<u32, ColumnStyle>,
    header_row: Option<u32>,
}

impl Sheet {
    /// 空のシートを生成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// セルの値を取得
    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    /// セルの値を設定
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.rows.entry(row).or_default().insert(col, value);
    }

    /// 行が存在するかを判定
    pub fn row_exists(&self, row: u32) -> bool {
        self.rows.get(&row).map(|r| !r.is_empty()).unwrap_or(false)
    }

    /// 行を削除
    pub fn remove_row(&mut self, row: u32) {
        self.rows.remove(&row);
    }

    /// 最初に値を持つ行の番号
    pub fn first_row(&self) -> Option<u32> {
        self.rows
            .iter()
            .find(|(_, cells)| !cells.is_empty())
            .map(|(row, _)| *row)
    }

    /// 指定行の最初に値を持つ列の番号
    pub fn first_col(&self, row: u32) -> Option<u32> {
        self.rows
            .get(&row)
            .and_then(|cells| cells.keys().next().copied())
    }

    /// 最後に値を持つ行の番号
    pub fn last_row(&self) -> Option<u32> {
        self.rows
            .iter()
            .rev()
            .find(|(_, cells)| !cells.is_empty())
            .map(|(row, _)| *row)
    }

    /// 全セルを行・列順に走査
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &CellValue)> {
        self.rows.iter().flat_map(|(row, cells)| {
            cells
                .iter()
                .map(move |(col, value)| (CellCoord::new(*row, *col), value))
        })
    }

    pub fn set_header_row(&mut self, row: u32) {
        self.header_row = Some(row);
    }

    pub fn header_row(&self) -> Option<u32> {
        self.header_row
    }

    pub fn set_column_style(&mut self, col: u32, style: ColumnStyle) {
        self.column_styles.insert(col, style);
    }

    pub fn column_style(&self, col: u32) -> Option<ColumnStyle> {
        self.column_styles.get(&col).copied()
    }

    pub fn column_styles(&self) -> impl Iterator<Item = (u32, ColumnStyle)> + '_ {
        self.column_styles.iter().map(|(col, style)| (*col, *style))
    }

    /// 折り返しなしの列を内容に合わせて拡幅
    ///
    /// 複数行テキストは最長の行で幅を計算します。表示幅は
    /// `unicode-width`で算出するため、全角文字は2文字分として扱われます。
    ///
    /// # 引数
    ///
    /// * `max_width` - 列幅の上限
    pub fn auto_size_columns(&mut self, max_width: f64) {
        let mut widths: BTreeMap<u32, usize> = BTreeMap::new();
        for cells in self.rows.values() {
            for (col, value) in cells {
                let text = value.as_text();
                let width = text.lines().map(|line| line.width()).max().unwrap_or(0);
                let entry = widths.entry(*col).or_insert(0);
                *entry = (*entry).max(width);
            }
        }
        for (col, width) in widths {
            let style = self.column_styles.entry(col).or_insert(ColumnStyle {
                width: 0.0,
                wrap: false,
            });
            if !style.wrap {
                let fitted = (width as f64 + 2.0).min(max_width);
                style.width = style.width.max(fitted);
            }
        }
    }
}

/// メモリ上のワークブック
///
/// シートの並び順は作成順で、物理コンテナへの書き出し順になります。
/// 1セルに書き込める文字数の上限もワークブック単位で保持します。
#[derive(Debug, Clone)]
pub(crate) struct Workbook {
    sheets: Vec<Sheet>,
    max_text_chars: usize,
}

impl Default for Workbook {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            max_text_chars: MAX_CHARACTERS_PER_CELL,
        }
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1セルの文字数上限
    pub fn max_text_chars(&self) -> usize {
        self.max_text_chars
    }

    pub fn set_max_text_chars(&mut self, max: usize) {
        self.max_text_chars = max.min(MAX_CHARACTERS_PER_CELL);
    }

    #[cfg(test)]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// シートを作成
    ///
    /// 同名のシートが既に存在する場合は削除してから作成し直します。
    pub fn create_sheet(&mut self, name: &str) -> &mut Sheet {
        self.remove_sheet(name);
        self.sheets.push(Sheet::new(name));
        let idx = self.sheets.len() - 1;
        &mut self.sheets[idx]
    }

    pub fn remove_sheet(&mut self, name: &str) {
        self.sheets.retain(|s| s.name != name);
    }

    /// 読み込み済みシートを追加（同名シートは置き換え）
    pub fn push_sheet(&mut self, sheet: Sheet) {
        self.remove_sheet(&sheet.name);
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> impl Iterator<Item = &mut Sheet> {
        self.sheets.iter_mut()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut sheet = Sheet::new("Test");
        sheet.set(2, 1, CellValue::from("value"));
        assert_eq!(sheet.get(2, 1), Some(&CellValue::from("value")));
        assert_eq!(sheet.get(2, 0), None);
        assert!(sheet.row_exists(2));
        assert!(!sheet.row_exists(1));
    }

    #[test]
    fn test_first_and_last_row() {
        let mut sheet = Sheet::new("Test");
        assert_eq!(sheet.first_row(), None);
        sheet.set(3, 2, CellValue::from("a"));
        sheet.set(7, 0, CellValue::from("b"));
        assert_eq!(sheet.first_row(), Some(3));
        assert_eq!(sheet.last_row(), Some(7));
        assert_eq!(sheet.first_col(3), Some(2));
        sheet.remove_row(7);
        assert_eq!(sheet.last_row(), Some(3));
    }

    // 同名シートの作成は既存シートを置き換える
    #[test]
    fn test_create_sheet_replaces() {
        let mut wb = Workbook::new();
        wb.create_sheet("A").set(0, 0, CellValue::from("old"));
        wb.create_sheet("B");
        let sheet = wb.create_sheet("A");
        assert!(!sheet.row_exists(0));
        assert_eq!(wb.sheets().len(), 2);
        assert_eq!(wb.sheet_names(), vec!["B", "A"]);
    }

    #[test]
    fn test_auto_size_columns_with_japanese() {
        let mut sheet = Sheet::new("Test");
        sheet.set(0, 0, CellValue::from("市区町村コード"));
        sheet.set(1, 0, CellValue::from("short\nlonger line"));
        sheet.set_column_style(
            1,
            ColumnStyle {
                width: 60.0,
                wrap: true,
            },
        );
        sheet.set(0, 1, CellValue::from("x".repeat(200)));
        sheet.auto_size_columns(80.0);

        // "市区町村コード" の表示幅は14
        assert_eq!(sheet.column_style(0).map(|s| s.width), Some(16.0));
        // 折り返し列は変更しない
        assert_eq!(sheet.column_style(1).map(|s| s.width), Some(60.0));
    }

    #[test]
    fn test_auto_size_columns_capped() {
        let mut sheet = Sheet::new("Test");
        sheet.set(0, 0, CellValue::from("y".repeat(500)));
        sheet.auto_size_columns(80.0);
        assert_eq!(sheet.column_style(0).map(|s| s.width), Some(80.0));
    }
}
