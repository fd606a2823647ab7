//! Security Module
//!
//! 入力ワークブックに対するセキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃、巨大入力への対策を提供します。

use std::io::{Cursor, Read, Seek};

use crate::error::{Result, SpreadsheetError};

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_file_count: 10_000,
            max_file_size: 104_857_600,         // 100MB
            max_input_file_size: 2_147_483_648, // 2GB
        }
    }
}

impl SecurityConfig {
    /// デフォルトのセキュリティ設定を作成
    pub fn new() -> Self {
        Self::default()
    }
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、ファイルパスを検証します。
///
/// # 引数
///
/// * `path` - 検証するファイルパス
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> std::result::Result<(), String> {
    // 空のパスは拒否
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Windows形式の`C:\`やUnix形式の`/`で始まるパス）
    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    // `..`を含むパスを拒否（ディレクトリトラバーサル攻撃）
    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    // `\`を含むパスを拒否（Windows形式のパスセパレータ）
    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}

/// 入力全体を読み込み、サイズ上限を検証
///
/// # 戻り値
///
/// * `Ok(Vec<u8>)` - 読み込んだバイト列
/// * `Err(SpreadsheetError::SecurityViolation)` - 上限を超えた場合
pub(crate) fn read_limited<R: Read>(reader: R, config: &SecurityConfig) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    // 上限+1バイトまで読み、超過を検出する
    let bytes_read = reader
        .take(config.max_input_file_size.saturating_add(1))
        .read_to_end(&mut buffer)?;

    if bytes_read as u64 > config.max_input_file_size {
        return Err(SpreadsheetError::SecurityViolation(format!(
            "Input file size exceeds maximum: {} bytes (max: {} bytes)",
            bytes_read, config.max_input_file_size
        )));
    }
    Ok(buffer)
}

/// ZIPコンテナ（XLSX/ODS）の事前検査
///
/// エントリ数、各エントリおよび合計の展開後サイズ、エントリ名を検証します。
/// ZIPシグネチャ（`PK`）で始まらない入力（旧XLS形式など）は検査しません。
pub(crate) fn check_zip_container(bytes: &[u8], config: &SecurityConfig) -> Result<()> {
    if !bytes.starts_with(b"PK") {
        return Ok(());
    }
    check_archive(Cursor::new(bytes), config)
}

fn check_archive<R: Read + Seek>(reader: R, config: &SecurityConfig) -> Result<()> {
    let mut archive = zip::ZipArchive::new(reader)?;

    if archive.len() > config.max_file_count {
        return Err(SpreadsheetError::SecurityViolation(format!(
            "Too many entries in archive: {} (max: {})",
            archive.len(),
            config.max_file_count
        )));
    }

    let mut total: u64 = 0;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        validate_zip_path(entry.name()).map_err(SpreadsheetError::SecurityViolation)?;

        if entry.size() > config.max_file_size {
            return Err(SpreadsheetError::SecurityViolation(format!(
                "Entry '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                entry.name(),
                entry.size(),
                config.max_file_size
            )));
        }
        total = total.saturating_add(entry.size());
        if total > config.max_decompressed_size {
            return Err(SpreadsheetError::SecurityViolation(format!(
                "Decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total, config.max_decompressed_size
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_zip(entries: &[(&str, usize)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, size) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(&vec![b'a'; *size]).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_validate_zip_path_valid() {
        assert!(validate_zip_path("xl/workbook.xml").is_ok());
        assert!(validate_zip_path("content.xml").is_ok());
        assert!(validate_zip_path("META-INF/manifest.xml").is_ok());
    }

    #[test]
    fn test_validate_zip_path_rejected() {
        assert!(validate_zip_path("").is_err());
        assert!(validate_zip_path("/etc/passwd").is_err());
        assert!(validate_zip_path("C:\\Windows\\system32").is_err());
        assert!(validate_zip_path("xl/../../etc/passwd").is_err());
        assert!(validate_zip_path("xl\\workbook.xml").is_err());
    }

    #[test]
    fn test_read_limited() {
        let config = SecurityConfig {
            max_input_file_size: 10,
            ..Default::default()
        };
        assert_eq!(read_limited(&b"0123456789"[..], &config).unwrap().len(), 10);
        let err = read_limited(&b"0123456789A"[..], &config).unwrap_err();
        assert!(matches!(err, SpreadsheetError::SecurityViolation(_)));
    }

    #[test]
    fn test_check_zip_container_ok() {
        let bytes = build_zip(&[("content.xml", 100), ("mimetype", 10)]);
        assert!(check_zip_container(&bytes, &SecurityConfig::default()).is_ok());
    }

    // 非ZIP入力は検査対象外
    #[test]
    fn test_check_non_zip_skipped() {
        assert!(check_zip_container(b"\xD0\xCF\x11\xE0", &SecurityConfig::default()).is_ok());
    }

    #[test]
    fn test_check_zip_limits() {
        let bytes = build_zip(&[("a.xml", 100), ("b.xml", 100), ("c.xml", 100)]);

        let config = SecurityConfig {
            max_file_count: 2,
            ..Default::default()
        };
        assert!(check_zip_container(&bytes, &config).is_err());

        let config = SecurityConfig {
            max_file_size: 50,
            ..Default::default()
        };
        assert!(check_zip_container(&bytes, &config).is_err());

        let config = SecurityConfig {
            max_decompressed_size: 250,
            ..Default::default()
        };
        let err = check_zip_container(&bytes, &config).unwrap_err();
        assert!(err.to_string().contains("Decompressed size"));
    }

    #[test]
    fn test_check_zip_traversal_entry() {
        let bytes = build_zip(&[("../evil.xml", 1)]);
        let err = check_zip_container(&bytes, &SecurityConfig::default()).unwrap_err();
        assert!(matches!(err, SpreadsheetError::SecurityViolation(_)));
    }
}
