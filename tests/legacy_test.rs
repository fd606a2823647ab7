//! Legacy Workbook Tests
//!
//! 旧バージョンのスプレッドシートを`rust_xlsxwriter`で直接生成し、
//! 読み込み時の移行（レビュー担当者、Artifact of、File Dependencies）と
//! バージョン判定のエラーを検証します。

use std::io::Cursor;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use spdx_spreadsheet::model::{AnnotationType, ModelStore, RelationshipType};
use spdx_spreadsheet::{
    AnyLicenseInfo, SerializableStore, SpdxSpreadsheet, SpreadsheetStoreBuilder,
    DOCUMENT_INFO_SHEET_NAME,
};

const NS: &str = "http://spdx.org/spdxdocs/legacy-2.1";

const DOCUMENT_HEADERS: &[&str] = &[
    "Spreadsheet Version",
    "SPDX Version",
    "Data License",
    "SPDX Identifier",
    "License List Version",
    "Document Name",
    "Document Namespace",
    "Document Contents",
    "External Document References",
    "Document Comment",
    "Creator",
    "Created",
    "Creator Comment",
    "Optional User Defined Columns...",
];

const PACKAGE_HEADERS_2_1: &[&str] = &[
    "Package Name",
    "SPDX Identifier",
    "Package Version",
    "Package FileName",
    "Package Supplier",
    "Package Originator",
    "Home Page",
    "Package Download Location",
    "Package Checksum",
    "Package Verification Code",
    "Verification Code Excluded Files",
    "Source Info",
    "License Declared",
    "License Concluded",
    "License Info From Files",
    "License Comments",
    "Package Copyright Text",
    "Summary",
    "Description",
    "Files Analyzed",
    "Comments",
];

const FILE_HEADERS_LEGACY: &[&str] = &[
    "File Name",
    "SPDX Identifier",
    "Package Identifier",
    "File Type(s)",
    "File Checksum(s)",
    "License Concluded",
    "License Info in File",
    "License Comments",
    "File Copyright Text",
    "Notice Text",
    "Artifact of Project",
    "Artifact of Homepage",
    "Artifact of URL",
    "Contributors",
    "File Comment",
    "File Dependencies",
];

const EXTRACTED_HEADERS: &[&str] = &[
    "Identifier",
    "Extracted Text",
    "License Name",
    "Cross Reference URLs",
    "Comment",
];

const RELATIONSHIP_HEADERS: &[&str] = &[
    "SPDX Identifier A",
    "Relationship",
    "SPDX Identifier B",
    "Relationship Comment",
];

const ANNOTATION_HEADERS: &[&str] = &[
    "SPDX Identifier being Annotated",
    "Annotation Comment",
    "Annotation Date",
    "Annotator",
    "Annotation Type",
];

const REVIEWER_HEADERS: &[&str] = &["Reviewer", "Review Date", "Reviewer Comment"];

const SNIPPET_HEADERS: &[&str] = &[
    "ID",
    "Name",
    "From File ID",
    "Byte Range",
    "Line Range",
    "License Concluded",
    "License Info in Snippet",
    "License Comments",
    "Snippet Copyright Text",
    "Comment",
];

const EXTERNAL_REF_HEADERS: &[&str] = &["Package ID", "Category", "Type", "Locator", "Comment"];

/// 2010-01-29T18:30:22 のExcelシリアル値
const CREATED_SERIAL: f64 = 40207.0 + 66_622.0 / 86_400.0;
/// 2010-02-10T00:00:00 のExcelシリアル値
const REVIEWED_SERIAL: f64 = 40219.0;

// Helper module for generating legacy workbooks
mod fixtures {
    use super::*;

    fn date_format() -> Format {
        Format::new().set_num_format("yyyy-mm-dd hh:mm:ss")
    }

    /// 1行分の文字列を書き込む（空文字列のセルは書き込まない）
    pub fn write_row(sheet: &mut Worksheet, row: u32, values: &[&str]) -> Result<(), XlsxError> {
        for (col, value) in values.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row, col as u16, *value)?;
            }
        }
        Ok(())
    }

    pub fn add_sheet(
        workbook: &mut Workbook,
        name: &str,
        headers: &[&str],
        rows: &[&[&str]],
    ) -> Result<(), XlsxError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_row(sheet, 0, headers)?;
        for (i, row) in rows.iter().enumerate() {
            write_row(sheet, i as u32 + 1, row)?;
        }
        Ok(())
    }

    /// 文書情報シート（作成日時は日付セル）
    pub fn add_document_sheet(workbook: &mut Workbook, version: &str) -> Result<(), XlsxError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name(DOCUMENT_INFO_SHEET_NAME)?;
        write_row(sheet, 0, DOCUMENT_HEADERS)?;
        write_row(
            sheet,
            1,
            &[
                version,
                "SPDX-2.1",
                "CC0-1.0",
                "SPDXRef-DOCUMENT",
                "",
                "legacy-document",
                NS,
                "SPDXRef-pkg",
                "",
                "Legacy comment",
                "Tool: legacy-tool",
            ],
        )?;
        sheet.write_number_with_format(1, 11, CREATED_SERIAL, &date_format())?;
        sheet.write_string(2, 10, "Person: Legacy Author")?;
        Ok(())
    }

    /// SPDX 2.1形式のワークブック
    ///
    /// Reviewersシートと、Artifact of Project・File Dependencies列を含みます。
    pub fn generate_legacy_2_1() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        add_document_sheet(&mut workbook, "2.1.0")?;
        add_sheet(
            &mut workbook,
            "Package Info",
            PACKAGE_HEADERS_2_1,
            &[&[
                "legacy-pkg",
                "SPDXRef-pkg",
                "2.0",
                "",
                "Organization: Legacy Corp",
                "",
                "",
                "NOASSERTION",
                "SHA1: 85ed0817af83a24ad8da68c2b5094de69833983c",
                "d6a770ba38583ed4bb4525bd96e50461655d2758",
                "",
                "",
                "MIT",
                "MIT",
                "MIT",
                "",
                "Copyright Legacy Corp",
                "",
                "",
                "true",
            ]],
        )?;
        add_sheet(&mut workbook, "Extracted License Info", EXTRACTED_HEADERS, &[])?;
        add_sheet(
            &mut workbook,
            "Per File Info",
            FILE_HEADERS_LEGACY,
            &[
                &[
                    "./src/main.c",
                    "SPDXRef-file",
                    "SPDXRef-pkg",
                    "SOURCE",
                    "SHA1: d6a770ba38583ed4bb4525bd96e50461655d2758",
                    "MIT",
                    "MIT",
                    "",
                    "Copyright Legacy Corp",
                    "",
                    "Jena",
                    "http://jena.apache.org",
                    "",
                    "Alice,Bob",
                ],
                &[
                    "./src/util.c",
                    "",
                    "SPDXRef-pkg",
                    "SOURCE",
                    "SHA1: c2b4e1c22a8b1e5ee58bbbcd6a4a7eb3f1b5b7d1",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "./src/main.c",
                ],
            ],
        )?;
        add_sheet(
            &mut workbook,
            "Relationships",
            RELATIONSHIP_HEADERS,
            &[&["SPDXRef-DOCUMENT", "DESCRIBES", "SPDXRef-pkg"]],
        )?;
        add_sheet(&mut workbook, "Annotations", ANNOTATION_HEADERS, &[])?;
        add_sheet(&mut workbook, "Snippets", SNIPPET_HEADERS, &[])?;
        add_sheet(&mut workbook, "External Refs", EXTERNAL_REF_HEADERS, &[])?;

        let reviewers = workbook.add_worksheet();
        reviewers.set_name("Reviewers")?;
        write_row(reviewers, 0, REVIEWER_HEADERS)?;
        write_row(reviewers, 1, &["Person: Legacy Reviewer", "", "Reviewed in 2010"])?;
        reviewers.write_number_with_format(1, 1, REVIEWED_SERIAL, &date_format())?;

        workbook.save_to_buffer()
    }

    /// 文書情報シートのみを持つワークブック
    pub fn generate_document_only(version: &str) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        add_document_sheet(&mut workbook, version)?;
        workbook.save_to_buffer()
    }
}

#[test]
fn test_open_legacy_workbook() {
    let data = fixtures::generate_legacy_2_1().unwrap();
    let mut spreadsheet = SpdxSpreadsheet::open(Cursor::new(data)).unwrap();
    assert_eq!(spreadsheet.version(), "2.1.0");
    assert_eq!(spreadsheet.document_uri(), Some(NS));
    spreadsheet.verify().unwrap();
}

#[test]
fn test_deserialize_legacy_workbook() {
    let data = fixtures::generate_legacy_2_1().unwrap();
    let mut store = SpreadsheetStoreBuilder::new().build().unwrap();
    let namespace = store.deserialize(Cursor::new(data), false).unwrap();
    assert_eq!(namespace, NS);
    let model = store.store();

    // 文書と作成情報
    let doc = model.document(NS).unwrap();
    assert_eq!(doc.spec_version, "SPDX-2.1");
    assert_eq!(doc.creation_info.created, "2010-01-29T18:30:22Z");
    assert_eq!(
        doc.creation_info.creators,
        vec!["Tool: legacy-tool", "Person: Legacy Author"]
    );
    assert_eq!(doc.described_ids(), vec!["SPDXRef-pkg"]);

    // Reviewersシートは文書のREVIEWアノテーションに移行される
    assert_eq!(doc.annotations.len(), 1);
    let review = &doc.annotations[0];
    assert_eq!(review.annotator, "Person: Legacy Reviewer");
    assert_eq!(review.annotation_type, AnnotationType::REVIEW);
    assert_eq!(review.date, "2010-02-10T00:00:00Z");
    assert_eq!(review.comment, "Reviewed in 2010");

    // パッケージ
    let pkg = model.package(NS, "SPDXRef-pkg").unwrap();
    assert_eq!(pkg.name, "legacy-pkg");
    assert_eq!(pkg.supplier.as_deref(), Some("Organization: Legacy Corp"));
    assert_eq!(pkg.license_declared, Some(AnyLicenseInfo::Listed("MIT".to_string())));
    assert!(pkg.files_analyzed);
    assert!(pkg.external_refs.is_empty());

    // Artifact of Projectはパッケージと GENERATED_FROM 関係に移行される
    let file = model.file(NS, "SPDXRef-file").unwrap();
    assert_eq!(file.contributors, vec!["Alice", "Bob"]);
    assert_eq!(file.relationships.len(), 1);
    assert_eq!(
        file.relationships[0].relationship_type,
        RelationshipType::GENERATED_FROM
    );
    let doap_id = file.relationships[0].related_element_id.clone();
    let doap = model.package(NS, &doap_id).unwrap();
    assert_eq!(doap.name, "Jena");
    assert_eq!(doap.homepage.as_deref(), Some("http://jena.apache.org"));
    assert!(!doap.files_analyzed);

    // ID列が空のファイルにはIDが生成され、File Dependenciesは DEPENDS_ON 関係になる
    let util = model
        .files(NS)
        .into_iter()
        .find(|f| f.name == "./src/util.c")
        .unwrap();
    assert!(util.id.starts_with("SPDXRef-gnrtd"));
    assert_eq!(util.license_concluded, Some(AnyLicenseInfo::None));
    assert_eq!(util.relationships.len(), 1);
    assert_eq!(util.relationships[0].relationship_type, RelationshipType::DEPENDS_ON);
    assert_eq!(util.relationships[0].related_element_id, "SPDXRef-file");

    let mut files = pkg.files.clone();
    files.sort();
    assert_eq!(files, vec!["SPDXRef-file".to_string(), util.id.clone()]);
}

// 旧形式を読み込んだ後の書き出しは現行バージョンになる
#[test]
fn test_legacy_workbook_upgrades_on_write() {
    let data = fixtures::generate_legacy_2_1().unwrap();
    let mut store = SpreadsheetStoreBuilder::new().build().unwrap();
    store.deserialize(Cursor::new(data), false).unwrap();

    let mut upgraded = Vec::new();
    store.serialize(&mut upgraded).unwrap();

    let mut spreadsheet = SpdxSpreadsheet::open(Cursor::new(upgraded.clone())).unwrap();
    assert_eq!(spreadsheet.version(), "2.3.0");
    spreadsheet.verify().unwrap();
    assert!(!spreadsheet.sheet_names().contains(&"Reviewers"));

    let mut reread = SpreadsheetStoreBuilder::new().build().unwrap();
    reread.deserialize(Cursor::new(upgraded), false).unwrap();
    let doc = reread.store().document(NS).unwrap();
    assert_eq!(doc.annotations.len(), 1);
    assert_eq!(reread.store().files(NS).len(), 2);
}

#[test]
fn test_unsupported_version() {
    let data = fixtures::generate_document_only("1.2.0").unwrap();
    let err = SpdxSpreadsheet::open(Cursor::new(data)).unwrap_err();
    assert_eq!(err.to_string(), "Spreadsheet version 1.2.0 not supported.");
}

#[test]
fn test_missing_version() {
    let data = fixtures::generate_document_only("").unwrap();
    let err = SpdxSpreadsheet::open(Cursor::new(data)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The version for the SPDX spreadsheet could not be read."
    );
}

#[test]
fn test_missing_document_sheet() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_name("Package Info").unwrap();
    let data = workbook.save_to_buffer().unwrap();
    let err = SpdxSpreadsheet::open(Cursor::new(data)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid SPDX spreadsheet.  Sheet Document Info does not exist."
    );
}

// 文書情報シートは正しいが他のシートがない場合は検証で失敗する
#[test]
fn test_verify_reports_missing_package_sheet() {
    let data = fixtures::generate_document_only("2.3.0").unwrap();
    let mut spreadsheet = SpdxSpreadsheet::open(Cursor::new(data.clone())).unwrap();
    let err = spreadsheet.verify().unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    let mut store = SpreadsheetStoreBuilder::new().build().unwrap();
    assert!(store.deserialize(Cursor::new(data), false).is_err());
    assert!(store.store().document_namespaces().is_empty());
}

#[test]
fn test_not_a_workbook() {
    let err = SpdxSpreadsheet::open(Cursor::new(b"not a spreadsheet".to_vec())).unwrap_err();
    assert_eq!(err.kind(), spdx_spreadsheet::ErrorKind::Io);
}
