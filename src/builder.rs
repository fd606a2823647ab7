//! Builder Module
//!
//! Fluent Builder APIを提供し、`SpreadsheetStore`インスタンスを段階的に構築する。

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

use crate::api::{DateFormat, SpreadsheetFormat};
use crate::codec::{format_date, parse_date, MAX_CHARACTERS_PER_CELL};
use crate::error::{Result, SpreadsheetError};
use crate::model::{InMemoryStore, ModelStore};
use crate::security::SecurityConfig;
use crate::store::SpreadsheetStore;

/// `max_cell_chars`に指定できる最小値
const MIN_CELL_CHARS: usize = 100;

/// ストアの設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct StoreConfig {
    /// 書き出す物理形式
    pub format: SpreadsheetFormat,

    /// 日付文字列の書式
    pub date_format: DateFormat,

    /// 読み込み時のセキュリティ制限
    pub security: SecurityConfig,

    /// 列幅・折り返しを設定するか
    pub style_columns: bool,

    /// 長文テキストを切り詰める文字数
    pub max_cell_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            format: SpreadsheetFormat::Xlsx,
            date_format: DateFormat::Spdx,
            security: SecurityConfig::default(),
            style_columns: true,
            max_cell_chars: MAX_CHARACTERS_PER_CELL,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `SpreadsheetStore`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use spdx_spreadsheet::{SpreadsheetFormat, SpreadsheetStoreBuilder};
///
/// # fn main() -> Result<(), spdx_spreadsheet::SpreadsheetError> {
/// let store = SpreadsheetStoreBuilder::new()
///     .with_format(SpreadsheetFormat::Ods)
///     .with_style_columns(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SpreadsheetStoreBuilder {
    /// 内部設定（構築中）
    config: StoreConfig,
}

impl Default for SpreadsheetStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetStoreBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 物理形式: XLSX
    /// - 日付形式: SPDX形式（`2010-01-29T18:30:22Z`）
    /// - セキュリティ制限: `SecurityConfig::default()`
    /// - 列の書式設定: あり
    /// - セルの最大文字数: 32,767
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
        }
    }

    /// 書き出す物理形式を指定する
    ///
    /// 読み込みは形式を自動判別するため、この設定の影響を受けません。
    ///
    /// # 引数
    ///
    /// * `format: SpreadsheetFormat`: 物理形式
    pub fn with_format(mut self, format: SpreadsheetFormat) -> Self {
        self.config.format = format;
        self
    }

    /// 日付文字列の書式を指定する
    ///
    /// # 引数
    ///
    /// * `format: DateFormat`: 日付形式
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use spdx_spreadsheet::{DateFormat, SpreadsheetStoreBuilder};
    ///
    /// let builder = SpreadsheetStoreBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y-%m-%d %H:%M:%S".to_string()));
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 読み込み時のセキュリティ制限を指定する
    ///
    /// # 引数
    ///
    /// * `config: SecurityConfig`: 入力サイズ・ZIP展開の制限
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use spdx_spreadsheet::{SecurityConfig, SpreadsheetStoreBuilder};
    ///
    /// let mut security = SecurityConfig::new();
    /// security.max_input_file_size = 10 * 1024 * 1024;
    /// let builder = SpreadsheetStoreBuilder::new().with_security_config(security);
    /// ```
    pub fn with_security_config(mut self, config: SecurityConfig) -> Self {
        self.config.security = config;
        self
    }

    /// 列幅・ヘッダー・折り返しの書式を設定するかを指定する
    pub fn with_style_columns(mut self, style: bool) -> Self {
        self.config.style_columns = style;
        self
    }

    /// 長文テキストを切り詰める文字数を指定する
    ///
    /// 100以上、32,767（XLSXのセル上限）以下である必要があります。
    pub fn with_max_cell_chars(mut self, max: usize) -> Self {
        self.config.max_cell_chars = max;
        self
    }

    /// 設定を検証し、インメモリのモデルストアを持つ`SpreadsheetStore`を構築する
    ///
    /// # 戻り値
    ///
    /// * `Ok(SpreadsheetStore)`: 設定が有効な場合
    /// * `Err(SpreadsheetError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * `SpreadsheetError::Config(String)`: 設定の検証に失敗した場合
    ///   * カスタム日付形式が不正な書式文字列、または書式化した日付を再解析できない
    ///   * `max_cell_chars`が範囲外
    pub fn build(self) -> Result<SpreadsheetStore<InMemoryStore>> {
        self.build_with_store(InMemoryStore::new())
    }

    /// 設定を検証し、指定したモデルストアを持つ`SpreadsheetStore`を構築する
    ///
    /// # 引数
    ///
    /// * `store` - 読み込んだ要素の格納先、書き出す要素の取得元
    pub fn build_with_store<S: ModelStore>(self, store: S) -> Result<SpreadsheetStore<S>> {
        // 1. 日付形式の検証
        validate_date_format(&self.config.date_format)?;

        // 2. セル文字数の検証
        let max = self.config.max_cell_chars;
        if !(MIN_CELL_CHARS..=MAX_CHARACTERS_PER_CELL).contains(&max) {
            return Err(SpreadsheetError::Config(format!(
                "Invalid max cell characters: {} (expected {}..={})",
                max, MIN_CELL_CHARS, MAX_CHARACTERS_PER_CELL
            )));
        }

        Ok(SpreadsheetStore::new(self.config, store))
    }
}

/// テスト用の日付で書式化と再解析を試行する
fn validate_date_format(date_format: &DateFormat) -> Result<()> {
    let DateFormat::Custom(pattern) = date_format else {
        return Ok(());
    };
    if pattern.trim().is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(SpreadsheetError::Config(format!(
            "Invalid date format string: '{}'",
            pattern
        )));
    }
    let sample = NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 30, 45))
        .ok_or_else(|| SpreadsheetError::Config("Failed to create test date".to_string()))?;
    let formatted = format_date(&sample, date_format);
    if parse_date(&formatted, date_format).is_none() {
        return Err(SpreadsheetError::Config(format!(
            "Date format '{}' can not parse its own output '{}'",
            pattern, formatted
        )));
    }
    Ok(())
}
