//! Snippets Sheet
//!
//! スニペットを1行1件で保持するシート（SPDX 2.1以降）。所属ファイルは
//! ID列で参照するため、ファイルシートより後に読み込む必要があります。

use std::collections::HashMap;

use tracing::debug;

use crate::codec::{licenses_to_string, parse_range, range_bounds, range_to_string};
use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::license::{parse_license_list, AnyLicenseInfo};
use crate::model::{ModelStore, SpdxElement, SpdxSnippet, StartEndPointer};

use super::{Column, Schema, SheetBase, Trailer, PLAIN, REQUIRED, WRAP};

const LABEL: &str = "SPDX Snippet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnippetField {
    Id,
    Name,
    FromFileId,
    ByteRange,
    LineRange,
    LicenseConcluded,
    LicenseInfo,
    LicenseComments,
    Copyright,
    Comment,
}

// IDが空の行は読み込み時にIDを生成して書き戻すため、ID列は必須にしない
static COLUMNS: [Column<SnippetField>; 10] = [
    Column::new(SnippetField::Id, "ID", 25.0, PLAIN),
    Column::new(SnippetField::Name, "Name", 25.0, PLAIN),
    Column::new(SnippetField::FromFileId, "From File ID", 25.0, REQUIRED),
    Column::new(SnippetField::ByteRange, "Byte Range", 40.0, REQUIRED),
    Column::new(SnippetField::LineRange, "Line Range", 40.0, PLAIN),
    Column::new(SnippetField::LicenseConcluded, "License Concluded", 60.0, WRAP),
    Column::new(SnippetField::LicenseInfo, "License Info in Snippet", 60.0, WRAP),
    Column::new(SnippetField::LicenseComments, "License Comments", 60.0, WRAP),
    Column::new(SnippetField::Copyright, "Snippet Copyright Text", 60.0, WRAP),
    Column::new(SnippetField::Comment, "Comment", 60.0, WRAP),
];

static SCHEMA: Schema<SnippetField> = Schema {
    columns: &COLUMNS,
    trailer: Some(Trailer {
        title: "User Defined Columns...",
        width: 40.0,
    }),
};

fn col(field: SnippetField) -> u32 {
    SCHEMA.col(field).unwrap_or(0)
}

/// スニペットシート
///
/// 構築したスニペットはIDでキャッシュします。
pub(crate) struct SnippetSheet<'a> {
    base: SheetBase<'a>,
    cache: HashMap<String, SpdxSnippet>,
}

impl<'a> SnippetSheet<'a> {
    pub fn open(workbook: &'a mut Workbook, name: &str) -> Self {
        Self {
            base: SheetBase::open(workbook, name),
            cache: HashMap::new(),
        }
    }

    pub fn create(workbook: &mut Workbook, name: &str, styled: bool) {
        SCHEMA.create(workbook, name, styled);
    }

    pub fn first_data_row(&self) -> u32 {
        self.base.first_data_row()
    }

    pub fn verify(&self) -> Result<()> {
        if !self.base.exists() {
            return Err(self.base.missing("SPDX Snippets"));
        }
        SCHEMA.verify_header(&self.base, LABEL)?;
        for row in self.base.data_rows() {
            self.validate_row(row)?;
        }
        Ok(())
    }

    fn validate_row(&self, row: u32) -> Result<()> {
        SCHEMA.check_required(&self.base, row, "")?;
        let fail = |message: String| Err(SpreadsheetError::invalid(&self.base.name, row, message));
        if let Some(value) = self.base.text(row, col(SnippetField::LicenseConcluded)) {
            if let Err(e) = AnyLicenseInfo::parse(&value) {
                return fail(format!(
                    "Invalid asserted license string in row {} details: {}",
                    row, e
                ));
            }
        }
        for field in [SnippetField::ByteRange, SnippetField::LineRange] {
            if let Some(value) = self.base.text(row, col(field)) {
                if let Err(message) = check_range(SCHEMA.title(field), &value) {
                    return fail(message);
                }
            }
        }
        Ok(())
    }

    /// スニペットを1行追加
    pub fn add(&mut self, snippet: &SpdxSnippet) {
        let row = self.base.add_row();
        self.base.set(row, col(SnippetField::Id), snippet.id.as_str());
        self.base
            .set_opt(row, Some(col(SnippetField::Name)), snippet.name.as_deref());
        self.base.set(
            row,
            col(SnippetField::FromFileId),
            snippet.snippet_from_file.as_str(),
        );
        self.base.set(
            row,
            col(SnippetField::ByteRange),
            range_to_string(&snippet.byte_range),
        );
        if let Some(range) = &snippet.line_range {
            self.base
                .set(row, col(SnippetField::LineRange), range_to_string(range));
        }
        if let Some(license) = &snippet.license_concluded {
            self.base
                .set(row, col(SnippetField::LicenseConcluded), license.to_string());
        }
        if !snippet.license_info_in_snippet.is_empty() {
            self.base.set(
                row,
                col(SnippetField::LicenseInfo),
                licenses_to_string(&snippet.license_info_in_snippet),
            );
        }
        self.base.set_opt(
            row,
            Some(col(SnippetField::LicenseComments)),
            snippet.license_comments.as_deref(),
        );
        self.base.set_opt(
            row,
            Some(col(SnippetField::Copyright)),
            snippet.copyright_text.as_deref(),
        );
        self.base
            .set_opt(row, Some(col(SnippetField::Comment)), snippet.comment.as_deref());
    }

    /// 1行からスニペットを再構築
    ///
    /// ID列が空の場合は`store`でIDを生成し、セルに書き戻します。
    /// 所属ファイルは`store`に既に存在していなければなりません。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(SpdxSnippet))` - 再構築（またはキャッシュ済み）のスニペット
    /// * `Ok(None)` - 行が存在しない場合（読み込みの終端）
    /// * `Err(SpreadsheetError)` - 検証または所属ファイルの解決に失敗した場合
    pub fn get_snippet<S: ModelStore + ?Sized>(
        &mut self,
        row: u32,
        store: &mut S,
        namespace: &str,
    ) -> Result<Option<SpdxSnippet>> {
        if !self.base.row_exists(row) {
            return Ok(None);
        }
        self.validate_row(row)?;
        let id = match self.base.text(row, col(SnippetField::Id)) {
            Some(id) => id.trim().to_string(),
            None => {
                let id = store.next_id(namespace);
                debug!(row, id = %id, "generated snippet id");
                self.base.set(row, col(SnippetField::Id), id.as_str());
                id
            }
        };
        if let Some(cached) = self.cache.get(&id) {
            return Ok(Some(cached.clone()));
        }

        let license_concluded = match self.base.text(row, col(SnippetField::LicenseConcluded)) {
            Some(value) => AnyLicenseInfo::parse(&value).map_err(|e| {
                SpreadsheetError::Format(format!("Invalid license expression {}: {}", value, e))
            })?,
            None => AnyLicenseInfo::NoAssertion,
        };
        let license_info = match self.base.text(row, col(SnippetField::LicenseInfo)) {
            Some(value) => parse_license_list(&value).map_err(|e| {
                SpreadsheetError::Format(format!(
                    "Invalid license expression in License Infos from File: {}: {}",
                    value, e
                ))
            })?,
            None => vec![AnyLicenseInfo::NoAssertion],
        };

        let from_file_id = self
            .base
            .text(row, col(SnippetField::FromFileId))
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                SpreadsheetError::Format(format!(
                    "Missing required Snippet From File ID for Snippet ID {}",
                    id
                ))
            })?;
        match store.get(namespace, &from_file_id) {
            Some(SpdxElement::File(_)) => {}
            Some(_) => {
                return Err(SpreadsheetError::Format(format!(
                    "Invalid type for ID {}.  Expecting SpdxFile",
                    from_file_id
                )))
            }
            None => {
                return Err(SpreadsheetError::Format(format!(
                    "Snippet from file for snippet ID {} does not exist in the model.  \
                     It must be created before getting the snippet information from the snippet sheet.  \
                     Restore the file information sheet first.",
                    id
                )))
            }
        }

        let byte_range = self.range(row, SnippetField::ByteRange, "byte")?.ok_or_else(|| {
            SpreadsheetError::Format(format!("Missing reqired byte range for Snippet ID {}", id))
        })?;
        let mut snippet = SpdxSnippet::new(id.clone(), from_file_id, byte_range);
        snippet.line_range = self.range(row, SnippetField::LineRange, "line")?;
        snippet.name = self.base.text(row, col(SnippetField::Name));
        snippet.license_concluded = Some(license_concluded);
        snippet.license_info_in_snippet = license_info;
        snippet.copyright_text = Some(
            self.base
                .text(row, col(SnippetField::Copyright))
                .unwrap_or_else(|| "NOASSERTION".to_string()),
        );
        snippet.license_comments = self.base.text(row, col(SnippetField::LicenseComments));
        snippet.comment = self.base.text(row, col(SnippetField::Comment));

        self.cache.insert(id, snippet.clone());
        Ok(Some(snippet))
    }

    fn range(&self, row: u32, field: SnippetField, kind: &str) -> Result<Option<StartEndPointer>> {
        match self.base.text(row, col(field)) {
            Some(value) => parse_range(&value)
                .map(Some)
                .map_err(|_| SpreadsheetError::Format(format!("Invalid {} range: {}", kind, value))),
            None => Ok(None),
        }
    }
}

/// 範囲セルの文法と大小関係を検証
fn check_range(title: &str, value: &str) -> std::result::Result<(), String> {
    match range_bounds(value) {
        None => Err(format!("Invalid range for {}: {}", title, value)),
        Some((start, end)) if start >= end => Err(format!(
            "Invalid range for {}: {}.  End is not greater than or equal to the end.",
            title, value
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InMemoryStore, SpdxFile, SpdxPackage};
    use crate::types::CellValue;

    const NAME: &str = "Snippets";
    const NS: &str = "http://example.com/doc";

    fn sample_snippet() -> SpdxSnippet {
        let mut snippet = SpdxSnippet::new(
            "SPDXRef-snippet1",
            "SPDXRef-file1",
            StartEndPointer { start: 5, end: 23 },
        );
        snippet.name = Some("snippet".to_string());
        snippet.line_range = Some(StartEndPointer { start: 1, end: 3 });
        snippet.license_concluded = Some(AnyLicenseInfo::parse("MIT").unwrap());
        snippet.license_info_in_snippet = vec![AnyLicenseInfo::parse("MIT").unwrap()];
        snippet.license_comments = Some("license comment".to_string());
        snippet.copyright_text = Some("Copyright Example".to_string());
        snippet.comment = Some("comment".to_string());
        snippet
    }

    fn store_with_file() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.put(NS, SpdxFile::new("SPDXRef-file1", "a.c").into());
        store
    }

    fn one_snippet(snippet: &SpdxSnippet) -> Workbook {
        let mut wb = Workbook::new();
        SnippetSheet::create(&mut wb, NAME, true);
        SnippetSheet::open(&mut wb, NAME).add(snippet);
        wb
    }

    #[test]
    fn test_add_and_get() {
        let mut wb = one_snippet(&sample_snippet());
        let mut store = store_with_file();
        let mut sheet = SnippetSheet::open(&mut wb, NAME);
        assert!(sheet.verify().is_ok());
        let first = sheet.first_data_row();
        assert_eq!(
            sheet.get_snippet(first, &mut store, NS).unwrap(),
            Some(sample_snippet())
        );
        assert_eq!(sheet.get_snippet(first + 1, &mut store, NS).unwrap(), None);
    }

    // 空のライセンスと著作権はNOASSERTIONになる
    #[test]
    fn test_defaults() {
        let bare = SpdxSnippet::new(
            "SPDXRef-snippet1",
            "SPDXRef-file1",
            StartEndPointer { start: 1, end: 2 },
        );
        let mut wb = one_snippet(&bare);
        let mut store = store_with_file();
        let snippet = SnippetSheet::open(&mut wb, NAME)
            .get_snippet(1, &mut store, NS)
            .unwrap()
            .unwrap();
        assert_eq!(snippet.license_concluded, Some(AnyLicenseInfo::NoAssertion));
        assert_eq!(snippet.license_info_in_snippet, vec![AnyLicenseInfo::NoAssertion]);
        assert_eq!(snippet.copyright_text.as_deref(), Some("NOASSERTION"));
        assert_eq!(snippet.line_range, None);
    }

    #[test]
    fn test_generated_id_written_back() {
        let mut wb = one_snippet(&sample_snippet());
        wb.sheet_mut(NAME).unwrap().set(1, 0, CellValue::from(""));
        let mut store = store_with_file();
        let snippet = SnippetSheet::open(&mut wb, NAME)
            .get_snippet(1, &mut store, NS)
            .unwrap()
            .unwrap();
        assert!(snippet.id.starts_with("SPDXRef-gnrtd"));
        assert_eq!(
            wb.sheet(NAME).unwrap().get(1, 0).map(|v| v.as_text()),
            Some(snippet.id)
        );
    }

    #[test]
    fn test_owning_file_errors() {
        let mut wb = one_snippet(&sample_snippet());
        let mut empty = InMemoryStore::new();
        let err = SnippetSheet::open(&mut wb, NAME)
            .get_snippet(1, &mut empty, NS)
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Snippet from file for snippet ID SPDXRef-snippet1 does not exist in the model."));

        let mut wrong_type = InMemoryStore::new();
        wrong_type.put(NS, SpdxPackage::new("SPDXRef-file1", "pkg").into());
        let err = SnippetSheet::open(&mut wb, NAME)
            .get_snippet(1, &mut wrong_type, NS)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for ID SPDXRef-file1.  Expecting SpdxFile"
        );
    }

    #[test]
    fn test_verify_ranges() {
        let mut wb = one_snippet(&sample_snippet());
        wb.sheet_mut(NAME).unwrap().set(1, 3, CellValue::from("23:5"));
        let err = SnippetSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert!(err.to_string().ends_with(
            "Invalid range for Byte Range: 23:5.  End is not greater than or equal to the end."
        ));

        wb.sheet_mut(NAME).unwrap().set(1, 3, CellValue::from("5:23"));
        wb.sheet_mut(NAME).unwrap().set(1, 4, CellValue::from("a:b"));
        let err = SnippetSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert!(err.to_string().ends_with("Invalid range for Line Range: a:b"));

        // 符号付きの数値は読み込み時と同じく不正
        wb.sheet_mut(NAME).unwrap().set(1, 4, CellValue::from("+5:23"));
        let err = SnippetSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert!(err.to_string().ends_with("Invalid range for Line Range: +5:23"));
        assert!(parse_range("+5:23").is_err());
    }

    #[test]
    fn test_verify_missing_sheet() {
        let mut wb = Workbook::new();
        assert_eq!(
            SnippetSheet::open(&mut wb, NAME)
                .verify()
                .unwrap_err()
                .to_string(),
            "Worksheet for SPDX Snippets does not exist"
        );
    }
}
