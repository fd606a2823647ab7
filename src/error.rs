//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// spdx-spreadsheetクレート全体で使用するエラー型
///
/// スプレッドシートの読み込み・検証・書き出し、およびSPDXモデルへの
/// 変換処理中に発生するすべてのエラーを統一的に扱います。
///
/// # エラーの種類
///
/// - `Io`: ストリームの読み書きに失敗したエラー
/// - `Parse`: ワークブックの解析中に発生したエラー（calamine由来）
/// - `Zip` / `Write`: 物理コンテナ（XLSX/ODS）の書き出しに失敗したエラー
/// - `SecurityViolation`: 入力がセキュリティ制限を超えたエラー
/// - `Config`: ビルダー設定の検証に失敗したエラー
/// - `Invalid` / `Format`: シート構造・セル値の検証エラー
///
/// # 使用例
///
/// ```rust,no_run
/// use spdx_spreadsheet::{SpreadsheetError, ErrorKind};
///
/// fn report(err: &SpreadsheetError) {
///     match err.kind() {
///         ErrorKind::Validation => eprintln!("入力を修正してください: {}", err),
///         ErrorKind::Io => eprintln!("I/Oエラー: {}", err),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー
    ///
    /// 暗号化されたファイル、破損したファイル、サポートされていない
    /// コンテナ形式などが原因となります。
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// ZIPアーカイブの読み書きエラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// ワークブックの書き出しエラー（rust_xlsxwriter / quick-xml由来）
    #[error("Spreadsheet write error: {0}")]
    Write(String),

    /// セキュリティ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `SpreadsheetStoreBuilder::build()`時に検出されます。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use spdx_spreadsheet::{SpreadsheetStoreBuilder, SpreadsheetError};
    ///
    /// let result = SpreadsheetStoreBuilder::new()
    ///     .with_max_cell_chars(10)  // 小さすぎる
    ///     .build();
    ///
    /// assert!(matches!(result, Err(SpreadsheetError::Config(_))));
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 特定のシート・行で検出された検証エラー
    ///
    /// 行番号はヘッダー行を含むシート先頭からの0始まりの値です。
    #[error("Invalid row {row} in sheet '{sheet}': {message}")]
    Invalid {
        /// エラーが発生したシート名
        sheet: String,
        /// エラーが発生した行（0始まり）
        row: u32,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// 値の書式・参照整合性に関するエラー
    ///
    /// ライセンス式、チェックサム、範囲、バージョン文字列の解析失敗や、
    /// 参照先の要素が存在しない場合などに発生します。
    #[error("{0}")]
    Format(String),
}

/// エラーの大分類
///
/// 呼び出し側は入力を修正して再投入する（`Validation`）か、
/// 入出力環境を確認する（`Io`）かをこの分類で判断します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// スキーマ違反、必須セルの欠落、参照先不明など
    Validation,
    /// ストリーム・コンテナの読み書き失敗
    Io,
}

impl SpreadsheetError {
    /// エラーの大分類を取得
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpreadsheetError::Io(_)
            | SpreadsheetError::Parse(_)
            | SpreadsheetError::Zip(_)
            | SpreadsheetError::Write(_) => ErrorKind::Io,
            SpreadsheetError::SecurityViolation(_)
            | SpreadsheetError::Config(_)
            | SpreadsheetError::Invalid { .. }
            | SpreadsheetError::Format(_) => ErrorKind::Validation,
        }
    }

    pub(crate) fn invalid(sheet: &str, row: u32, message: impl Into<String>) -> Self {
        SpreadsheetError::Invalid {
            sheet: sheet.to_string(),
            row,
            message: message.into(),
        }
    }
}

impl From<zip::result::ZipError> for SpreadsheetError {
    fn from(err: zip::result::ZipError) -> Self {
        SpreadsheetError::Zip(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SpreadsheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        SpreadsheetError::Write(err.to_string())
    }
}

impl From<quick_xml::Error> for SpreadsheetError {
    fn from(err: quick_xml::Error) -> Self {
        SpreadsheetError::Write(err.to_string())
    }
}

/// クレート内で使用する`Result`型エイリアス
pub type Result<T> = std::result::Result<T, SpreadsheetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    // Ioエラーのテスト
    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: SpreadsheetError = io_err.into();

        match &error {
            SpreadsheetError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected Io error"),
        }
        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.to_string().contains("IO error"));
    }

    // calamine由来のエラーはI/O扱い
    #[test]
    fn test_parse_error_kind() {
        let error: SpreadsheetError = calamine::Error::Msg("Corrupted file").into();
        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.to_string().contains("Corrupted file"));
    }

    #[test]
    fn test_invalid_display() {
        let error = SpreadsheetError::invalid("Per File Info", 3, "Missing SHA1 for file foo.c");
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(
            error.to_string(),
            "Invalid row 3 in sheet 'Per File Info': Missing SHA1 for file foo.c"
        );
    }

    // Formatエラーはメッセージをそのまま表示する
    #[test]
    fn test_format_display_verbatim() {
        let error = SpreadsheetError::Format("Spreadsheet version 9.9 not supported.".into());
        assert_eq!(error.to_string(), "Spreadsheet version 9.9 not supported.");
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_zip_error_conversion() {
        let error: SpreadsheetError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(error, SpreadsheetError::Zip(_)));
        assert_eq!(error.kind(), ErrorKind::Io);
    }
}
