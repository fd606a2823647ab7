//! Public API Types
//!
//! 公開APIで使用する列挙型と定数を定義するモジュール。

/// SPDX形式の日付書式（chrono互換）
pub const SPDX_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// スプレッドシートの物理形式
///
/// 列スキーマ、ヘッダー、セル値のエンコードは両形式で共通です。
/// 異なるのはバイト列としてのコンテナのみです。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SpreadsheetFormat {
    /// Office Open XML（`.xlsx`）
    ///
    /// `rust_xlsxwriter`で書き出します。
    #[default]
    Xlsx,

    /// OpenDocument Spreadsheet（`.ods`）
    ///
    /// ZIPコンテナと`content.xml`を直接書き出します。
    Ods,
}

impl SpreadsheetFormat {
    /// ファイル拡張子から形式を推定
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use spdx_spreadsheet::SpreadsheetFormat;
    ///
    /// assert_eq!(SpreadsheetFormat::from_extension("xlsx"), Some(SpreadsheetFormat::Xlsx));
    /// assert_eq!(SpreadsheetFormat::from_extension("ODS"), Some(SpreadsheetFormat::Ods));
    /// assert_eq!(SpreadsheetFormat::from_extension("csv"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(SpreadsheetFormat::Xlsx),
            "ods" => Some(SpreadsheetFormat::Ods),
            _ => None,
        }
    }

    /// 既定のファイル拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Xlsx => "xlsx",
            SpreadsheetFormat::Ods => "ods",
        }
    }
}

/// 日付文字列の書式
///
/// 日付セルとSPDXモデル上の日付文字列を相互変換する際に使用します。
/// 呼び出しごとに明示的に渡されるため、スレッド間で共有される状態はありません。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum DateFormat {
    /// SPDX形式（`2010-01-29T18:30:22Z`）
    #[default]
    Spdx,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # フォーマット指定子（主要なもの）
    ///
    /// - `%Y`: 4桁の年（例: 2025）
    /// - `%m`: 2桁の月（01-12）
    /// - `%d`: 2桁の日（01-31）
    /// - `%H`: 24時間形式の時（00-23）
    /// - `%M`: 分（00-59）
    /// - `%S`: 秒（00-59）
    ///
    /// 詳細は[chronoのドキュメント](https://docs.rs/chrono/latest/chrono/format/strftime/index.html)を参照してください。
    Custom(String),
}

impl DateFormat {
    /// chrono互換のフォーマット文字列
    pub fn pattern(&self) -> &str {
        match self {
            DateFormat::Spdx => SPDX_DATE_FORMAT,
            DateFormat::Custom(pattern) => pattern,
        }
    }
}
