//! Document Info Sheet
//!
//! 文書全体のメタデータ（バージョン、名前空間、作成情報など）を保持するシート。
//! ヘッダーの次の行が唯一のデータ行で、作成者・文書内容・外部文書参照の
//! 3列だけは複数の値を後続行へ縦に並べます。

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::api::DateFormat;
use crate::codec::{checksum_to_string, format_date, parse_date};
use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::license::AnyLicenseInfo;
use crate::model::{
    Checksum, ChecksumAlgorithm, CreationInfo, ExternalDocumentRef, SpdxDocument,
    DEFAULT_DATA_LICENSE,
};
use crate::spreadsheet::{is_supported_version, CURRENT_VERSION};
use crate::types::CellValue;

use super::{Column, Schema, SheetBase, Trailer, PLAIN, REQUIRED, WRAP};

const LABEL: &str = "SPDX Origins";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DocField {
    SpreadsheetVersion,
    SpdxVersion,
    DataLicense,
    SpdxId,
    LicenseListVersion,
    Name,
    Namespace,
    Contents,
    ExternalDocRefs,
    Comment,
    Creator,
    Created,
    CreatorComment,
}

static COLUMNS: [Column<DocField>; 13] = [
    Column::new(DocField::SpreadsheetVersion, "Spreadsheet Version", 20.0, REQUIRED),
    Column::new(DocField::SpdxVersion, "SPDX Version", 16.0, REQUIRED),
    Column::new(DocField::DataLicense, "Data License", 20.0, REQUIRED),
    Column::new(DocField::SpdxId, "SPDX Identifier", 20.0, REQUIRED),
    Column::new(DocField::LicenseListVersion, "License List Version", 16.0, PLAIN),
    Column::new(DocField::Name, "Document Name", 40.0, REQUIRED | WRAP),
    Column::new(DocField::Namespace, "Document Namespace", 80.0, REQUIRED | WRAP),
    Column::new(DocField::Contents, "Document Contents", 50.0, REQUIRED | WRAP),
    Column::new(DocField::ExternalDocRefs, "External Document References", 140.0, WRAP),
    Column::new(DocField::Comment, "Document Comment", 70.0, WRAP),
    Column::new(DocField::Creator, "Creator", 60.0, REQUIRED | WRAP),
    Column::new(DocField::Created, "Created", 20.0, REQUIRED),
    Column::new(DocField::CreatorComment, "Creator Comment", 70.0, WRAP),
];

pub(crate) static SCHEMA: Schema<DocField> = Schema {
    columns: &COLUMNS,
    trailer: Some(Trailer {
        title: "Optional User Defined Columns...",
        width: 60.0,
    }),
};

static EXTERNAL_DOC_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let algorithms: Vec<String> = ChecksumAlgorithm::ALL
        .iter()
        .flat_map(|a| {
            let name = a.as_str();
            [name.to_string(), name.replace('_', "-")]
        })
        .collect();
    let pattern = format!(r"(\S+)\s+(\S+)\s+({}):\s*(\S+)", algorithms.join("|"));
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid external document pattern: {e}"))
});

/// 列番号（全バージョン共通のスキーマ）
fn col(field: DocField) -> u32 {
    SCHEMA.col(field).unwrap_or(0)
}

/// 文書情報シート
pub(crate) struct DocumentSheet<'a> {
    base: SheetBase<'a>,
}

impl<'a> DocumentSheet<'a> {
    pub fn open(workbook: &'a mut Workbook, name: &str) -> Self {
        Self {
            base: SheetBase::open(workbook, name),
        }
    }

    /// シートを作成し、データ行に現行のスプレッドシートバージョンを書き込む
    pub fn create(workbook: &mut Workbook, name: &str, styled: bool) {
        let sheet = SCHEMA.create(workbook, name, styled);
        sheet.set(1, col(DocField::SpreadsheetVersion), CellValue::from(CURRENT_VERSION));
    }

    pub fn exists(&self) -> bool {
        self.base.exists()
    }

    fn data_row(&self) -> u32 {
        self.base.first_data_row()
    }

    fn data_text(&self, field: DocField) -> Option<String> {
        self.base.text(self.data_row(), col(field))
    }

    /// シートを検証
    ///
    /// バージョン、名前空間、ヘッダーの順に確認し、SPDX Version列が空白になるまで
    /// 各行の必須セルと作成日時セルの型を検証します。
    pub fn verify(&self) -> Result<()> {
        if !self.base.exists() {
            return Err(self.base.missing(LABEL));
        }
        let version = self.version().ok_or_else(|| {
            SpreadsheetError::Format(
                "Invalid origins spreadsheet - no spreadsheet version found".to_string(),
            )
        })?;
        if !is_supported_version(&version) {
            return Err(SpreadsheetError::Format(format!(
                "Spreadsheet version {} not supported.",
                version
            )));
        }
        if self.namespace().is_none() {
            return Err(SpreadsheetError::Format("Missing document namespace".to_string()));
        }
        SCHEMA.verify_header(&self.base, LABEL)?;

        let mut row = self.data_row();
        while self.base.text(row, col(DocField::SpdxVersion)).is_some() {
            SCHEMA.check_required(&self.base, row, " in Origins Spreadsheet")?;
            let created = self.base.cell(row, col(DocField::Created));
            if created.and_then(|v| v.as_date()).is_none() {
                return Err(SpreadsheetError::invalid(
                    &self.base.name,
                    row,
                    "Created column in origin spreadsheet is not of type Date",
                ));
            }
            row += 1;
        }
        Ok(())
    }

    /// スプレッドシートバージョン（データ行の先頭セル）
    pub fn version(&self) -> Option<String> {
        self.data_text(DocField::SpreadsheetVersion)
            .map(|v| v.trim().to_string())
    }

    pub fn namespace(&self) -> Option<String> {
        self.data_text(DocField::Namespace)
            .map(|v| v.trim().to_string())
    }

    /// 列の値をデータ行から下方向へ、空白セルが現れるまで読み込む
    fn column_values(&self, field: DocField) -> Vec<String> {
        let col = col(field);
        let mut values = Vec::new();
        let mut row = self.data_row();
        while let Some(value) = self.base.text(row, col) {
            values.push(value);
            row += 1;
        }
        values
    }

    fn set_column_values(&mut self, field: DocField, values: &[String]) {
        let col = col(field);
        let row = self.data_row();
        for (i, value) in values.iter().enumerate() {
            self.base.set(row + i as u32, col, value.as_str());
        }
    }

    pub fn creators(&self) -> Vec<String> {
        self.column_values(DocField::Creator)
    }

    /// 外部文書参照（`id namespace ALGORITHM: value`）
    pub fn external_document_refs(&self) -> Result<Vec<ExternalDocumentRef>> {
        let col = col(DocField::ExternalDocRefs);
        let mut refs = Vec::new();
        let mut row = self.data_row();
        while let Some(value) = self.base.text(row, col) {
            refs.push(parse_external_document_ref(value.trim(), row)?);
            row += 1;
        }
        Ok(refs)
    }

    /// 作成日時をSPDX形式の文字列で取得
    pub fn created(&self, date_format: &DateFormat) -> Option<String> {
        match self.base.cell(self.data_row(), col(DocField::Created))? {
            CellValue::Date(d) => Some(format_date(d, date_format)),
            other if !other.is_blank() => Some(other.as_text()),
            _ => None,
        }
    }

    /// 文書をシートに書き込む
    ///
    /// 作成日時は日付セルとして書き込むため、`date_format`で解析できない
    /// 文字列はエラーになります。
    pub fn add_document(&mut self, doc: &SpdxDocument, date_format: &DateFormat) -> Result<()> {
        let row = self.data_row();
        let created = doc.creation_info.created.trim();
        if created.is_empty() {
            return Err(SpreadsheetError::Format("Missing created date".to_string()));
        }
        let created = parse_date(created, date_format).ok_or_else(|| {
            SpreadsheetError::Format("Invalid created date - unable to parse".to_string())
        })?;

        self.base.set(row, col(DocField::SpreadsheetVersion), CURRENT_VERSION);
        self.base.set(row, col(DocField::SpdxVersion), doc.spec_version.as_str());
        if let AnyLicenseInfo::Listed(id) = &doc.data_license {
            self.base.set(row, col(DocField::DataLicense), id.as_str());
        }
        self.base.set(row, col(DocField::SpdxId), doc.id.as_str());
        self.base.set_opt(
            row,
            Some(col(DocField::LicenseListVersion)),
            doc.creation_info.license_list_version.as_deref(),
        );
        self.base.set(row, col(DocField::Name), doc.name.as_str());
        self.base.set(row, col(DocField::Namespace), doc.namespace.as_str());
        self.base
            .set_opt(row, Some(col(DocField::Comment)), doc.comment.as_deref());
        self.base.set(row, col(DocField::Created), CellValue::Date(created));
        self.base.set_opt(
            row,
            Some(col(DocField::CreatorComment)),
            doc.creation_info.comment.as_deref(),
        );

        self.set_column_values(DocField::Creator, &doc.creation_info.creators);

        let mut contents: Vec<String> = doc.described_ids().iter().map(|s| s.to_string()).collect();
        contents.sort();
        self.set_column_values(DocField::Contents, &contents);

        let refs: Vec<String> = doc
            .external_document_refs
            .iter()
            .map(|r| format!("{} {} {}", r.id, r.document_uri, checksum_to_string(&r.checksum)))
            .collect();
        self.set_column_values(DocField::ExternalDocRefs, &refs);
        Ok(())
    }

    /// シートから文書を再構築（関係・アノテーション・抽出ライセンスは含まない）
    pub fn document(&self, date_format: &DateFormat) -> Result<SpdxDocument> {
        let namespace = self.namespace().ok_or_else(|| {
            SpreadsheetError::Format("Missing document URI in the document sheet".to_string())
        })?;
        let mut doc = SpdxDocument::new(namespace, self.data_text(DocField::Name).unwrap_or_default());
        if let Some(spec_version) = self.data_text(DocField::SpdxVersion) {
            doc.spec_version = spec_version.trim().to_string();
        }
        doc.data_license = data_license(self.data_text(DocField::DataLicense));
        doc.comment = self
            .data_text(DocField::Comment)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        doc.creation_info = CreationInfo {
            creators: self.creators(),
            created: self.created(date_format).unwrap_or_default(),
            comment: self.data_text(DocField::CreatorComment),
            license_list_version: self.data_text(DocField::LicenseListVersion),
        };
        doc.external_document_refs = self.external_document_refs()?;
        Ok(doc)
    }
}

/// データライセンスを解決（空または解析不能な場合は`CC0-1.0`）
fn data_license(value: Option<String>) -> AnyLicenseInfo {
    let default = AnyLicenseInfo::Listed(DEFAULT_DATA_LICENSE.to_string());
    let Some(value) = value else {
        return default;
    };
    match AnyLicenseInfo::parse(value.trim()) {
        Ok(license @ AnyLicenseInfo::Listed(_)) => license,
        _ => {
            warn!(
                data_license = %value,
                "Unable to parse the provided standard license ID.  Using {}",
                DEFAULT_DATA_LICENSE
            );
            default
        }
    }
}

fn parse_external_document_ref(value: &str, row: u32) -> Result<ExternalDocumentRef> {
    let caps = EXTERNAL_DOC_REF_PATTERN.captures(value).ok_or_else(|| {
        SpreadsheetError::Format(format!(
            "Invalid external document reference: {} at row number {}",
            value, row
        ))
    })?;
    let algorithm: ChecksumAlgorithm = caps[3].replace('-', "_").parse().map_err(|_| {
        SpreadsheetError::Format(format!(
            "Invalid checksum algorithm: {} at row number {}",
            &caps[3], row
        ))
    })?;
    Ok(ExternalDocumentRef {
        id: caps[1].to_string(),
        document_uri: caps[2].to_string(),
        checksum: Checksum::new(algorithm, &caps[4]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Relationship, RelationshipType};

    const NAME: &str = "Document Info";

    fn sample_document() -> SpdxDocument {
        let mut doc = SpdxDocument::new("http://example.com/spdx/doc1", "Sample Document");
        doc.comment = Some("A comment".to_string());
        doc.creation_info = CreationInfo {
            creators: vec!["Tool: test".to_string(), "Person: Gary".to_string()],
            created: "2010-01-29T18:30:22Z".to_string(),
            comment: Some("creator comment".to_string()),
            license_list_version: Some("3.20".to_string()),
        };
        doc.relationships
            .push(Relationship::new(RelationshipType::DESCRIBES, "SPDXRef-b"));
        doc.relationships
            .push(Relationship::new(RelationshipType::DESCRIBES, "SPDXRef-a"));
        doc.external_document_refs.push(ExternalDocumentRef {
            id: "DocumentRef-ext".to_string(),
            document_uri: "http://example.com/ext".to_string(),
            checksum: Checksum::new(ChecksumAlgorithm::SHA1, "d6a770ba38583ed4bb4525bd96e50461655d2758"),
        });
        doc
    }

    #[test]
    fn test_add_and_read_document() {
        let mut wb = Workbook::new();
        DocumentSheet::create(&mut wb, NAME, true);
        let doc = sample_document();
        DocumentSheet::open(&mut wb, NAME)
            .add_document(&doc, &DateFormat::Spdx)
            .unwrap();

        let sheet = DocumentSheet::open(&mut wb, NAME);
        assert!(sheet.verify().is_ok());
        assert_eq!(sheet.version().as_deref(), Some(CURRENT_VERSION));
        // 文書内容はソートして縦に並ぶ
        assert_eq!(
            sheet.column_values(DocField::Contents),
            vec!["SPDXRef-a", "SPDXRef-b"]
        );

        let read = sheet.document(&DateFormat::Spdx).unwrap();
        assert_eq!(read.namespace, doc.namespace);
        assert_eq!(read.name, doc.name);
        assert_eq!(read.creation_info, doc.creation_info);
        assert_eq!(read.external_document_refs, doc.external_document_refs);
        assert_eq!(read.comment, doc.comment);
        assert_eq!(read.data_license, doc.data_license);
    }

    #[test]
    fn test_invalid_created_date() {
        let mut wb = Workbook::new();
        DocumentSheet::create(&mut wb, NAME, false);
        let mut doc = sample_document();
        doc.creation_info.created = "yesterday".to_string();
        let err = DocumentSheet::open(&mut wb, NAME)
            .add_document(&doc, &DateFormat::Spdx)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid created date - unable to parse");
    }

    // 作成日時が文字列セルの場合は検証エラー
    #[test]
    fn test_verify_created_not_date() {
        let mut wb = Workbook::new();
        DocumentSheet::create(&mut wb, NAME, false);
        DocumentSheet::open(&mut wb, NAME)
            .add_document(&sample_document(), &DateFormat::Spdx)
            .unwrap();
        wb.sheet_mut(NAME)
            .unwrap()
            .set(1, col(DocField::Created), CellValue::from("2010-01-29"));
        let err = DocumentSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert!(err
            .to_string()
            .contains("Created column in origin spreadsheet is not of type Date"));
    }

    #[test]
    fn test_verify_unsupported_version() {
        let mut wb = Workbook::new();
        DocumentSheet::create(&mut wb, NAME, false);
        wb.sheet_mut(NAME).unwrap().set(1, 0, CellValue::from("1.2"));
        let err = DocumentSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert_eq!(err.to_string(), "Spreadsheet version 1.2 not supported.");
    }

    #[test]
    fn test_verify_missing_sheet_and_namespace() {
        let mut wb = Workbook::new();
        let err = DocumentSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert_eq!(err.to_string(), "Worksheet for SPDX Origins does not exist");

        DocumentSheet::create(&mut wb, NAME, false);
        let err = DocumentSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert_eq!(err.to_string(), "Missing document namespace");
    }

    #[test]
    fn test_data_license_fallback() {
        assert_eq!(
            data_license(None),
            AnyLicenseInfo::Listed(DEFAULT_DATA_LICENSE.to_string())
        );
        assert_eq!(
            data_license(Some("(MIT AND Apache-2.0)".to_string())),
            AnyLicenseInfo::Listed(DEFAULT_DATA_LICENSE.to_string())
        );
        assert_eq!(
            data_license(Some("MIT".to_string())),
            AnyLicenseInfo::Listed("MIT".to_string())
        );
    }

    #[test]
    fn test_parse_external_document_ref() {
        let parsed = parse_external_document_ref(
            "DocumentRef-1 http://example.com/doc SHA3-256: abcdef",
            2,
        )
        .unwrap();
        assert_eq!(parsed.checksum.algorithm, ChecksumAlgorithm::SHA3_256);
        assert_eq!(parsed.document_uri, "http://example.com/doc");

        // コロンの直後に空白がなくてもよい
        let compact = parse_external_document_ref(
            "DocumentRef-1 http://example.com/doc SHA1:d6a770ba38583ed4bb4525bd96e50461655d2758",
            2,
        )
        .unwrap();
        assert_eq!(compact.checksum.algorithm, ChecksumAlgorithm::SHA1);
        assert_eq!(compact.checksum.value, "d6a770ba38583ed4bb4525bd96e50461655d2758");

        let err = parse_external_document_ref("DocumentRef-1 only-two", 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid external document reference: DocumentRef-1 only-two at row number 3"
        );
    }
}
