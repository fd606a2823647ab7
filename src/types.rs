//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Excelのシリアル日付値の上限（9999-12-31）
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// セルの値を表す列挙型
///
/// 値を持たないセルはグリッド上に存在しないものとして扱うため、
/// 空セルを表すバリアントは持ちません。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 文字列
    String(String),

    /// 数値（f64）
    Number(f64),

    /// 論理値
    Bool(bool),

    /// 日付時刻
    Date(NaiveDateTime),
}

impl CellValue {
    /// 値を空白とみなせるかを判定
    ///
    /// 空文字列・空白のみの文字列は「値なし」と同じ扱いになります。
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 値をセルの表示文字列として取得
    ///
    /// 整数値の数値は小数点なしで返します（例: `1.0` -> `"1"`）。
    pub fn as_text(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// 日付セルの場合のみ値を取得
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

/// 1900年システムの起点（1899年12月30日）
///
/// シリアル値1が1900年1月1日になるよう、Excelの1900年うるう年バグを
/// 含めた起点を使用します（1900年3月1日以降の日付は正確に変換されます）。
fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30).map(|d| d.and_time(NaiveTime::MIN))
}

/// Excelのシリアル日付値を日付時刻に変換（秒単位に丸める）
///
/// # 戻り値
///
/// * `Some(NaiveDateTime)` - 変換結果
/// * `None` - 値が範囲外の場合
pub(crate) fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let seconds = (serial * 86_400.0).round() as i64;
    excel_epoch()?.checked_add_signed(Duration::seconds(seconds))
}

/// 日付時刻をExcelのシリアル日付値に変換
pub(crate) fn datetime_to_serial(value: &NaiveDateTime) -> Option<f64> {
    let delta = value.signed_duration_since(excel_epoch()?);
    Some(delta.num_seconds() as f64 / 86_400.0)
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        let col_str = Self::col_index_to_letter(self.col);
        format!("{}{}", col_str, self.row + 1)
    }

    /// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
    fn col_index_to_letter(mut col: u32) -> String {
        let mut result = String::new();
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}
