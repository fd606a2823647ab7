//! Cell Codec Module
//!
//! 全シートで共有するセル値のエンコード・デコード処理を提供するモジュール。
//!
//! - CSV形式のリスト（寄稿者、帰属テキスト等）
//! - チェックサムブロック（`ALGORITHM: value`の改行区切り）
//! - 範囲文字列（`start:end`）
//! - 長文テキストの切り詰め
//! - 日付文字列と日付セルの相互変換
//!
//! CSVのエンコード・デコードは失敗時に例外を投げず、セルに埋め込む
//! センチネル文字列を返します。チェックサムと範囲は厳格で、
//! 不正な値は`Err`になります。

use chrono::{NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::DateFormat;
use crate::error::{Result, SpreadsheetError};
use crate::license::AnyLicenseInfo;
use crate::model::{Checksum, ChecksumAlgorithm, StartEndPointer};

/// 1セルあたりの最大文字数（XLSXの上限）
pub const MAX_CHARACTERS_PER_CELL: usize = 32_767;

/// 抽出ライセンステキストの最大文字数
pub const MAX_EXTRACTED_TEXT_SIZE: usize = 32_700;

/// CSVエンコード失敗時にセルへ書き込まれる文字列
pub const CSV_WRITE_ERROR: &str = "ERROR PARSING CSV Entries";
/// CSVデコード時のI/Oエラーを表す文字列
pub const CSV_IO_ERROR: &str = "I/O ERROR PARSING CSV String";
/// CSVデコード時の検証エラーを表す文字列
pub const CSV_VALIDATION_ERROR: &str = "CSV VALIDATION ERROR PARSING CSV String";

const TRUNCATION_SUFFIX: &str = "... [MORE] ...";
const TRUNCATION_PREFIX: &str = "[WARNING: TRUNCATED]";

static CHECKSUM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\s:]+):\s*(\S+)").unwrap_or_else(|e| panic!("invalid checksum pattern: {e}"))
});

static RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d+)$").unwrap_or_else(|e| panic!("invalid range pattern: {e}"))
});

/// 文字列のリストを1行のCSVに変換
///
/// すべての値を`"`で囲み、`"`と`\`はバックスラッシュでエスケープします。
/// 空のリストは空文字列になります。
///
/// # 戻り値
///
/// CSV文字列。書き込みに失敗した場合は[`CSV_WRITE_ERROR`]
pub fn strings_to_csv<S: AsRef<str>>(strings: &[S]) -> String {
    if strings.is_empty() {
        return String::new();
    }
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .double_quote(false)
        .escape(b'\\')
        .has_headers(false)
        .from_writer(Vec::new());
    // csvクレートは引用符しかエスケープしないため、バックスラッシュは事前に二重化する
    let escaped: Vec<String> = strings
        .iter()
        .map(|s| s.as_ref().replace('\\', "\\\\"))
        .collect();
    if writer.write_record(&escaped).is_err() {
        return CSV_WRITE_ERROR.to_string();
    }
    match writer.into_inner() {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(s) => s.trim().to_string(),
            Err(_) => CSV_WRITE_ERROR.to_string(),
        },
        Err(_) => CSV_WRITE_ERROR.to_string(),
    }
}

/// 1行のCSVを文字列のリストに変換
///
/// 最初のレコードのみを読み込みます。空文字列は空のリストになります。
/// 読み込みに失敗した場合は、センチネル文字列1要素のリストを返します。
pub fn csv_to_strings(csv: &str) -> Vec<String> {
    if csv.trim().is_empty() {
        return Vec::new();
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .double_quote(false)
        .escape(Some(b'\\'))
        .from_reader(csv.as_bytes());
    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(|s| s.to_string()).collect(),
        Ok(false) => Vec::new(),
        Err(e) => match e.kind() {
            csv::ErrorKind::Io(_) => vec![CSV_IO_ERROR.to_string()],
            _ => vec![CSV_VALIDATION_ERROR.to_string()],
        },
    }
}

/// 1件のチェックサムを`ALGORITHM: value`形式に変換
///
/// アルゴリズム名の`_`は`-`に置き換えます（例: `SHA3-256`）。
pub fn checksum_to_string(checksum: &Checksum) -> String {
    format!(
        "{}: {}",
        checksum.algorithm.as_str().replace('_', "-"),
        checksum.value
    )
}

/// チェックサムの集合を改行区切りの文字列に変換
///
/// アルゴリズム名、値の順でソートしてから連結します。
pub fn checksums_to_string(checksums: &[Checksum]) -> String {
    let mut sorted: Vec<&Checksum> = checksums.iter().collect();
    sorted.sort();
    sorted
        .into_iter()
        .map(checksum_to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `ALGORITHM: value`形式の文字列を解析
pub fn parse_checksum(value: &str) -> Result<Checksum> {
    let caps = CHECKSUM_PATTERN
        .captures(value.trim())
        .ok_or_else(|| SpreadsheetError::Format(format!("Invalid checksum: {}", value)))?;
    let algorithm: ChecksumAlgorithm = caps[1].replace('-', "_").parse().map_err(|_| {
        SpreadsheetError::Format(format!("Invalid checksum algorithm: {}", value))
    })?;
    Ok(Checksum::new(algorithm, &caps[2]))
}

/// 改行区切りのチェックサム文字列を解析
///
/// 最初の不正な行でエラーを返します。
pub fn str_to_checksums(value: &str) -> Result<Vec<Checksum>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(parse_checksum)
        .collect()
}

/// ライセンスのリストを`", "`区切りの文字列に変換
pub fn licenses_to_string(licenses: &[AnyLicenseInfo]) -> String {
    join_displayed(licenses, ", ")
}

pub(crate) fn join_displayed<T: std::fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// 範囲を`start:end`形式に変換
pub fn range_to_string(range: &StartEndPointer) -> String {
    format!("{}:{}", range.start, range.end)
}

/// `start:end`形式の範囲文字列の両端（大小関係は見ない）
pub(crate) fn range_bounds(value: &str) -> Option<(u64, u64)> {
    let caps = RANGE_PATTERN.captures(value.trim())?;
    let start = caps[1].parse().ok()?;
    let end = caps[2].parse().ok()?;
    Some((start, end))
}

/// `start:end`形式の範囲文字列を解析
///
/// 両端は符号なし整数で、`start < end`でなければなりません。
pub fn parse_range(value: &str) -> Result<StartEndPointer> {
    let (start, end) = range_bounds(value)
        .ok_or_else(|| SpreadsheetError::Format(format!("Invalid range: {}", value)))?;
    if start >= end {
        return Err(SpreadsheetError::Format(format!(
            "Range start must be less than end: {}",
            value
        )));
    }
    Ok(StartEndPointer { start, end })
}

/// セル上限を超えるテキストを切り詰める
///
/// `max_chars - 20`文字で切り、`... [MORE] ...`を付加します。
pub fn truncate_cell_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(20);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

/// 抽出ライセンステキストを切り詰める
///
/// 上限を超える場合は先頭に`[WARNING: TRUNCATED]`を付加します。
pub fn truncate_extracted_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(20);
    let mut truncated = String::from(TRUNCATION_PREFIX);
    truncated.extend(text.chars().take(keep));
    truncated
}

/// 日付文字列を日付時刻に変換
///
/// 時刻を含まない書式（例: `%Y-%m-%d`）も受け付け、その場合は0時とします。
pub fn parse_date(value: &str, format: &DateFormat) -> Option<NaiveDateTime> {
    let pattern = format.pattern();
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, pattern).ok().or_else(|| {
        chrono::NaiveDate::parse_from_str(value, pattern)
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    })
}

/// 日付時刻を文字列に変換
pub fn format_date(value: &NaiveDateTime, format: &DateFormat) -> String {
    value.format(format.pattern()).to_string()
}
