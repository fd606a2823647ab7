//! Spreadsheet Module
//!
//! バージョン判定とワークブック全体の組み立てを担当するモジュール。
//!
//! スプレッドシートバージョンは文書情報シートのデータ行・先頭列から一度だけ読み込み、
//! 各シートアダプタはこのバージョンに対応する列スキーマで開かれます。
//! バージョンの比較は文字列の辞書順で行います。

use std::io::{Read, Write};

use tracing::{debug, error};

use crate::api::SpreadsheetFormat;
use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::output::WorkbookWriter;
use crate::parser::WorkbookParser;
use crate::security::SecurityConfig;
use crate::sheets::annotation::AnnotationSheet;
use crate::sheets::document::DocumentSheet;
use crate::sheets::external_ref::ExternalRefSheet;
use crate::sheets::extracted_license::ExtractedLicenseSheet;
use crate::sheets::file::FileSheet;
use crate::sheets::package::PackageSheet;
use crate::sheets::relationship::RelationshipSheet;
use crate::sheets::reviewer::ReviewerSheet;
use crate::sheets::snippet::SnippetSheet;
use crate::sheets::SheetBase;

/// 現行のスプレッドシートバージョン
pub const CURRENT_VERSION: &str = "2.3.0";
pub const VERSION_2_2_0: &str = "2.2.0";
pub const VERSION_2_1_0: &str = "2.1.0";
pub const VERSION_2_0_0: &str = "2.0.0";
/// バージョンセルが読み込めなかった場合の値
pub const UNKNOWN_VERSION: &str = "UNKNOWN";
/// 読み込み可能なバージョン
pub const SUPPORTED_VERSIONS: &[&str] = &[CURRENT_VERSION, VERSION_2_2_0, VERSION_2_1_0, VERSION_2_0_0];

pub const DOCUMENT_INFO_SHEET_NAME: &str = "Document Info";
pub const PACKAGE_INFO_SHEET_NAME: &str = "Package Info";
pub const EXTRACTED_LICENSE_SHEET_NAME: &str = "Extracted License Info";
pub const PER_FILE_SHEET_NAME: &str = "Per File Info";
pub const RELATIONSHIPS_SHEET_NAME: &str = "Relationships";
pub const ANNOTATIONS_SHEET_NAME: &str = "Annotations";
pub const REVIEWERS_SHEET_NAME: &str = "Reviewers";
pub const SNIPPET_SHEET_NAME: &str = "Snippets";
pub const EXTERNAL_REFS_SHEET_NAME: &str = "External Refs";

/// 自動調整後の列幅の上限
const MAX_AUTO_COLUMN_WIDTH: f64 = 80.0;

/// 要素の行を保持するシート（文書情報シート以外）
const ENTITY_SHEET_NAMES: &[&str] = &[
    PACKAGE_INFO_SHEET_NAME,
    EXTERNAL_REFS_SHEET_NAME,
    EXTRACTED_LICENSE_SHEET_NAME,
    PER_FILE_SHEET_NAME,
    RELATIONSHIPS_SHEET_NAME,
    ANNOTATIONS_SHEET_NAME,
    REVIEWERS_SHEET_NAME,
    SNIPPET_SHEET_NAME,
];

/// バージョン文字列が読み込み可能かを判定
///
/// # 使用例
///
/// ```rust
/// use spdx_spreadsheet::is_supported_version;
///
/// assert!(is_supported_version("2.3.0"));
/// assert!(!is_supported_version("1.2.0"));
/// ```
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

/// SPDXスプレッドシート
///
/// メモリ上のワークブックとそのバージョンを保持し、バージョンに応じた
/// シートアダプタを提供します。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use spdx_spreadsheet::SpdxSpreadsheet;
///
/// # fn main() -> Result<(), spdx_spreadsheet::SpreadsheetError> {
/// let mut spreadsheet = SpdxSpreadsheet::open(File::open("sbom.xlsx")?)?;
/// println!("version {}", spreadsheet.version());
/// spreadsheet.verify()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SpdxSpreadsheet {
    workbook: Workbook,
    version: String,
    document_uri: Option<String>,
}

impl SpdxSpreadsheet {
    /// 現行バージョンの空のスプレッドシートを作成
    ///
    /// 旧形式専用のレビュー担当者シートは作成しません。
    ///
    /// # 引数
    ///
    /// * `styled` - 列幅・折り返しを設定するか
    pub fn create(styled: bool) -> Self {
        let mut workbook = Workbook::new();
        DocumentSheet::create(&mut workbook, DOCUMENT_INFO_SHEET_NAME, styled);
        PackageSheet::create(&mut workbook, PACKAGE_INFO_SHEET_NAME, styled);
        ExternalRefSheet::create(&mut workbook, EXTERNAL_REFS_SHEET_NAME, styled);
        ExtractedLicenseSheet::create(&mut workbook, EXTRACTED_LICENSE_SHEET_NAME, styled);
        FileSheet::create(&mut workbook, PER_FILE_SHEET_NAME, styled);
        RelationshipSheet::create(&mut workbook, RELATIONSHIPS_SHEET_NAME, styled);
        AnnotationSheet::create(&mut workbook, ANNOTATIONS_SHEET_NAME, styled);
        SnippetSheet::create(&mut workbook, SNIPPET_SHEET_NAME, styled);
        Self {
            workbook,
            version: CURRENT_VERSION.to_string(),
            document_uri: None,
        }
    }

    /// 既存のスプレッドシートをデフォルトのセキュリティ設定で開く
    ///
    /// # 戻り値
    ///
    /// * `Ok(SpdxSpreadsheet)` - 文書情報シートの検証まで成功した場合
    /// * `Err(SpreadsheetError)` - 読み込み、バージョン判定、文書情報シートの検証に失敗した場合
    pub fn open<R: Read>(reader: R) -> Result<Self> {
        Self::open_with(reader, &SecurityConfig::default())
    }

    pub(crate) fn open_with<R: Read>(reader: R, security: &SecurityConfig) -> Result<Self> {
        let workbook = WorkbookParser::read(reader, security)?;
        Self::from_workbook(workbook)
    }

    /// 読み込み済みのワークブックからバージョンを判定する
    ///
    /// バージョンが読めない、または未対応の場合は他のシートに触れる前に失敗します。
    pub(crate) fn from_workbook(mut workbook: Workbook) -> Result<Self> {
        let (version, document_uri) = {
            let document = DocumentSheet::open(&mut workbook, DOCUMENT_INFO_SHEET_NAME);
            if !document.exists() {
                return Err(SpreadsheetError::Format(format!(
                    "Invalid SPDX spreadsheet.  Sheet {} does not exist.",
                    DOCUMENT_INFO_SHEET_NAME
                )));
            }
            let version = document
                .version()
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
            if version == UNKNOWN_VERSION {
                return Err(SpreadsheetError::Format(
                    "The version for the SPDX spreadsheet could not be read.".to_string(),
                ));
            }
            if let Err(e) = document.verify() {
                error!(error = %e, "document info sheet verification failed");
                return Err(e);
            }
            (version, document.namespace())
        };
        debug!(version = %version, document_uri = ?document_uri, "spreadsheet opened");
        Ok(Self {
            workbook,
            version,
            document_uri,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// 文書名前空間（開いたスプレッドシートのみ）
    pub fn document_uri(&self) -> Option<&str> {
        self.document_uri.as_deref()
    }

    /// スニペットと外部参照のシートを持つバージョンか
    pub(crate) fn has_snippets_and_external_refs(&self) -> bool {
        VERSION_2_0_0 < self.version.as_str()
    }

    /// ワークブック全体を検証
    ///
    /// 文書、パッケージ、抽出ライセンス、ファイル、レビュー担当者（存在する場合）、
    /// 関係、アノテーション、スニペット、外部参照の順に検証し、最初の失敗を返します。
    pub fn verify(&mut self) -> Result<()> {
        let result = self.verify_sheets();
        if let Err(e) = &result {
            error!(error = %e, version = %self.version, "spreadsheet verification failed");
        }
        result
    }

    fn verify_sheets(&mut self) -> Result<()> {
        self.document_sheet().verify()?;
        self.package_sheet().verify()?;
        self.extracted_license_sheet().verify()?;
        self.file_sheet().verify()?;
        let reviewers = self.reviewer_sheet();
        if reviewers.exists() {
            reviewers.verify()?;
        }
        self.relationship_sheet().verify()?;
        self.annotation_sheet().verify()?;
        if self.has_snippets_and_external_refs() {
            self.snippet_sheet().verify()?;
            self.external_ref_sheet().verify()?;
        }
        Ok(())
    }

    /// 1セルに書き込む文字数の上限を設定（上限を超える文字列は切り詰める）
    pub fn set_max_cell_chars(&mut self, max: usize) {
        self.workbook.set_max_text_chars(max);
    }

    /// 文書情報以外のシートのデータ行をすべて削除
    ///
    /// ヘッダー行と文書情報シートはそのまま残ります。
    pub fn clear(&mut self) {
        for name in ENTITY_SHEET_NAMES {
            let mut base = SheetBase::open(&mut self.workbook, name);
            if base.exists() {
                debug!(sheet = name, rows = base.num_data_rows(), "clearing sheet");
                base.clear();
            }
        }
    }

    /// 折り返しなしの列を内容に合わせて拡幅
    pub fn resize_columns(&mut self) {
        for sheet in self.workbook.sheets_mut() {
            sheet.auto_size_columns(MAX_AUTO_COLUMN_WIDTH);
        }
    }

    /// ワークブックを指定された形式で書き出す
    pub fn write<W: Write>(&self, writer: &mut W, format: SpreadsheetFormat) -> Result<()> {
        WorkbookWriter::from_format(format).write(&self.workbook, writer)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheet_names()
    }

    pub(crate) fn document_sheet(&mut self) -> DocumentSheet<'_> {
        DocumentSheet::open(&mut self.workbook, DOCUMENT_INFO_SHEET_NAME)
    }

    pub(crate) fn package_sheet(&mut self) -> PackageSheet<'_> {
        PackageSheet::open(&mut self.workbook, PACKAGE_INFO_SHEET_NAME, &self.version)
    }

    pub(crate) fn extracted_license_sheet(&mut self) -> ExtractedLicenseSheet<'_> {
        ExtractedLicenseSheet::open(&mut self.workbook, EXTRACTED_LICENSE_SHEET_NAME)
    }

    pub(crate) fn file_sheet(&mut self) -> FileSheet<'_> {
        FileSheet::open(&mut self.workbook, PER_FILE_SHEET_NAME, &self.version)
    }

    pub(crate) fn relationship_sheet(&mut self) -> RelationshipSheet<'_> {
        RelationshipSheet::open(&mut self.workbook, RELATIONSHIPS_SHEET_NAME)
    }

    pub(crate) fn annotation_sheet(&mut self) -> AnnotationSheet<'_> {
        AnnotationSheet::open(&mut self.workbook, ANNOTATIONS_SHEET_NAME)
    }

    pub(crate) fn reviewer_sheet(&mut self) -> ReviewerSheet<'_> {
        ReviewerSheet::open(&mut self.workbook, REVIEWERS_SHEET_NAME)
    }

    pub(crate) fn snippet_sheet(&mut self) -> SnippetSheet<'_> {
        SnippetSheet::open(&mut self.workbook, SNIPPET_SHEET_NAME)
    }

    pub(crate) fn external_ref_sheet(&mut self) -> ExternalRefSheet<'_> {
        ExternalRefSheet::open(&mut self.workbook, EXTERNAL_REFS_SHEET_NAME)
    }
}
