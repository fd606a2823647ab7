//! Package Info Sheet
//!
//! パッケージを1行1件で保持するシート。スキーマはスプレッドシートの
//! バージョンによって4種類あり、読み書きの処理はすべてのバージョンで共通です。

use crate::api::DateFormat;
use crate::codec::{
    checksums_to_string, csv_to_strings, format_date, join_displayed, str_to_checksums,
    strings_to_csv,
};
use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::license::AnyLicenseInfo;
use crate::model::{PackagePurpose, PackageVerificationCode, SpdxPackage};
use crate::spreadsheet::{VERSION_2_0_0, VERSION_2_1_0, VERSION_2_2_0};
use crate::types::CellValue;

use super::{Column, Schema, SheetBase, Trailer, REQUIRED, WRAP};

const LABEL: &str = "SPDX Package Info";
const SUFFIX: &str = " in PackageInfo sheet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PkgField {
    Name,
    SpdxId,
    Version,
    FileName,
    Supplier,
    Originator,
    HomePage,
    DownloadLocation,
    Checksums,
    VerificationCode,
    VerificationExcluded,
    SourceInfo,
    LicenseDeclared,
    LicenseConcluded,
    LicenseInfoFromFiles,
    LicenseComments,
    Copyright,
    Summary,
    Description,
    AttributionText,
    FilesAnalyzed,
    Comment,
    PrimaryPurpose,
    ReleaseDate,
    BuiltDate,
    ValidUntilDate,
}

const R: u8 = REQUIRED | WRAP;

static COLUMNS_2_0: [Column<PkgField>; 19] = [
    Column::new(PkgField::Name, "Package Name", 30.0, R),
    Column::new(PkgField::SpdxId, "SPDX Identifier", 17.0, R),
    Column::new(PkgField::Version, "Package Version", 17.0, WRAP),
    Column::new(PkgField::FileName, "Package FileName", 30.0, WRAP),
    Column::new(PkgField::Supplier, "Package Supplier", 30.0, WRAP),
    Column::new(PkgField::Originator, "Package Originator", 30.0, WRAP),
    Column::new(PkgField::HomePage, "Home Page", 50.0, WRAP),
    Column::new(PkgField::DownloadLocation, "Package Download Location", 50.0, R),
    Column::new(PkgField::Checksums, "Package Checksum", 75.0, R),
    Column::new(PkgField::VerificationCode, "Package Verification Code", 60.0, R),
    Column::new(PkgField::VerificationExcluded, "Verification Code Excluded Files", 40.0, WRAP),
    Column::new(PkgField::SourceInfo, "Source Info", 30.0, WRAP),
    Column::new(PkgField::LicenseDeclared, "License Declared", 40.0, R),
    Column::new(PkgField::LicenseConcluded, "License Concluded", 40.0, R),
    Column::new(PkgField::LicenseInfoFromFiles, "License Info From Files", 90.0, R),
    Column::new(PkgField::LicenseComments, "License Comments", 50.0, WRAP),
    Column::new(PkgField::Copyright, "Package Copyright Text", 50.0, R),
    Column::new(PkgField::Summary, "Summary", 50.0, WRAP),
    Column::new(PkgField::Description, "Description", 80.0, WRAP),
];

static COLUMNS_2_1: [Column<PkgField>; 21] = [
    Column::new(PkgField::Name, "Package Name", 30.0, R),
    Column::new(PkgField::SpdxId, "SPDX Identifier", 17.0, R),
    Column::new(PkgField::Version, "Package Version", 17.0, WRAP),
    Column::new(PkgField::FileName, "Package FileName", 30.0, WRAP),
    Column::new(PkgField::Supplier, "Package Supplier", 30.0, WRAP),
    Column::new(PkgField::Originator, "Package Originator", 30.0, WRAP),
    Column::new(PkgField::HomePage, "Home Page", 50.0, WRAP),
    Column::new(PkgField::DownloadLocation, "Package Download Location", 50.0, R),
    Column::new(PkgField::Checksums, "Package Checksum", 75.0, WRAP),
    Column::new(PkgField::VerificationCode, "Package Verification Code", 60.0, WRAP),
    Column::new(PkgField::VerificationExcluded, "Verification Code Excluded Files", 40.0, WRAP),
    Column::new(PkgField::SourceInfo, "Source Info", 30.0, WRAP),
    Column::new(PkgField::LicenseDeclared, "License Declared", 40.0, R),
    Column::new(PkgField::LicenseConcluded, "License Concluded", 40.0, R),
    Column::new(PkgField::LicenseInfoFromFiles, "License Info From Files", 90.0, WRAP),
    Column::new(PkgField::LicenseComments, "License Comments", 50.0, WRAP),
    Column::new(PkgField::Copyright, "Package Copyright Text", 50.0, R),
    Column::new(PkgField::Summary, "Summary", 50.0, WRAP),
    Column::new(PkgField::Description, "Description", 80.0, WRAP),
    Column::new(PkgField::FilesAnalyzed, "Files Analyzed", 10.0, WRAP),
    Column::new(PkgField::Comment, "Comments", 50.0, WRAP),
];

static COLUMNS_2_2: [Column<PkgField>; 22] = [
    Column::new(PkgField::Name, "Package Name", 30.0, R),
    Column::new(PkgField::SpdxId, "SPDX Identifier", 17.0, R),
    Column::new(PkgField::Version, "Package Version", 17.0, WRAP),
    Column::new(PkgField::FileName, "Package FileName", 30.0, WRAP),
    Column::new(PkgField::Supplier, "Package Supplier", 30.0, WRAP),
    Column::new(PkgField::Originator, "Package Originator", 30.0, WRAP),
    Column::new(PkgField::HomePage, "Home Page", 50.0, WRAP),
    Column::new(PkgField::DownloadLocation, "Package Download Location", 50.0, R),
    Column::new(PkgField::Checksums, "Package Checksum", 75.0, WRAP),
    Column::new(PkgField::VerificationCode, "Package Verification Code", 60.0, WRAP),
    Column::new(PkgField::VerificationExcluded, "Verification Code Excluded Files", 40.0, WRAP),
    Column::new(PkgField::SourceInfo, "Source Info", 30.0, WRAP),
    Column::new(PkgField::LicenseDeclared, "License Declared", 40.0, R),
    Column::new(PkgField::LicenseConcluded, "License Concluded", 40.0, R),
    Column::new(PkgField::LicenseInfoFromFiles, "License Info From Files", 90.0, WRAP),
    Column::new(PkgField::LicenseComments, "License Comments", 50.0, WRAP),
    Column::new(PkgField::Copyright, "Package Copyright Text", 50.0, R),
    Column::new(PkgField::Summary, "Summary", 50.0, WRAP),
    Column::new(PkgField::Description, "Description", 80.0, WRAP),
    Column::new(PkgField::AttributionText, "Attribution Text", 80.0, WRAP),
    Column::new(PkgField::FilesAnalyzed, "Files Analyzed", 10.0, WRAP),
    Column::new(PkgField::Comment, "Comments", 50.0, WRAP),
];

// 2.3ではライセンスと著作権表示が任意になる
static COLUMNS_2_3: [Column<PkgField>; 26] = [
    Column::new(PkgField::Name, "Package Name", 30.0, R),
    Column::new(PkgField::SpdxId, "SPDX Identifier", 17.0, R),
    Column::new(PkgField::Version, "Package Version", 17.0, WRAP),
    Column::new(PkgField::FileName, "Package FileName", 30.0, WRAP),
    Column::new(PkgField::Supplier, "Package Supplier", 30.0, WRAP),
    Column::new(PkgField::Originator, "Package Originator", 30.0, WRAP),
    Column::new(PkgField::HomePage, "Home Page", 50.0, WRAP),
    Column::new(PkgField::DownloadLocation, "Package Download Location", 50.0, R),
    Column::new(PkgField::Checksums, "Package Checksum", 75.0, WRAP),
    Column::new(PkgField::VerificationCode, "Package Verification Code", 60.0, WRAP),
    Column::new(PkgField::VerificationExcluded, "Verification Code Excluded Files", 40.0, WRAP),
    Column::new(PkgField::SourceInfo, "Source Info", 30.0, WRAP),
    Column::new(PkgField::LicenseDeclared, "License Declared", 40.0, WRAP),
    Column::new(PkgField::LicenseConcluded, "License Concluded", 40.0, WRAP),
    Column::new(PkgField::LicenseInfoFromFiles, "License Info From Files", 90.0, WRAP),
    Column::new(PkgField::LicenseComments, "License Comments", 50.0, WRAP),
    Column::new(PkgField::Copyright, "Package Copyright Text", 50.0, WRAP),
    Column::new(PkgField::Summary, "Summary", 50.0, WRAP),
    Column::new(PkgField::Description, "Description", 80.0, WRAP),
    Column::new(PkgField::AttributionText, "Attribution Text", 80.0, WRAP),
    Column::new(PkgField::FilesAnalyzed, "Files Analyzed", 10.0, WRAP),
    Column::new(PkgField::Comment, "Comments", 50.0, WRAP),
    Column::new(PkgField::PrimaryPurpose, "Primary Package Purpose", 30.0, WRAP),
    Column::new(PkgField::ReleaseDate, "Release Date", 25.0, WRAP),
    Column::new(PkgField::BuiltDate, "Built Date", 25.0, WRAP),
    Column::new(PkgField::ValidUntilDate, "Valid Until Date", 25.0, WRAP),
];

const TRAILER: Option<Trailer> = Some(Trailer {
    title: "User Defined Columns...",
    width: 50.0,
});

static SCHEMA_2_0: Schema<PkgField> = Schema {
    columns: &COLUMNS_2_0,
    trailer: TRAILER,
};
static SCHEMA_2_1: Schema<PkgField> = Schema {
    columns: &COLUMNS_2_1,
    trailer: TRAILER,
};
static SCHEMA_2_2: Schema<PkgField> = Schema {
    columns: &COLUMNS_2_2,
    trailer: TRAILER,
};
static SCHEMA_2_3: Schema<PkgField> = Schema {
    columns: &COLUMNS_2_3,
    trailer: TRAILER,
};

/// パッケージシートのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PackageLayout {
    V2d0,
    V2d1,
    V2d2,
    V2d3,
}

impl PackageLayout {
    /// バージョン文字列から選択（文字列の辞書順で比較）
    pub fn for_version(version: &str) -> Self {
        if version <= VERSION_2_0_0 {
            PackageLayout::V2d0
        } else if version <= VERSION_2_1_0 {
            PackageLayout::V2d1
        } else if version <= VERSION_2_2_0 {
            PackageLayout::V2d2
        } else {
            PackageLayout::V2d3
        }
    }

    fn schema(self) -> &'static Schema<PkgField> {
        match self {
            PackageLayout::V2d0 => &SCHEMA_2_0,
            PackageLayout::V2d1 => &SCHEMA_2_1,
            PackageLayout::V2d2 => &SCHEMA_2_2,
            PackageLayout::V2d3 => &SCHEMA_2_3,
        }
    }

    /// 結論ライセンスが空の場合の既定値
    fn default_concluded(self) -> AnyLicenseInfo {
        match self {
            PackageLayout::V2d3 => AnyLicenseInfo::NoAssertion,
            _ => AnyLicenseInfo::None,
        }
    }
}

/// パッケージ情報シート
pub(crate) struct PackageSheet<'a> {
    base: SheetBase<'a>,
    layout: PackageLayout,
}

impl<'a> PackageSheet<'a> {
    pub fn open(workbook: &'a mut Workbook, name: &str, version: &str) -> Self {
        Self {
            base: SheetBase::open(workbook, name),
            layout: PackageLayout::for_version(version),
        }
    }

    /// 最新レイアウトのシートを作成
    pub fn create(workbook: &mut Workbook, name: &str, styled: bool) {
        SCHEMA_2_3.create(workbook, name, styled);
    }

    fn schema(&self) -> &'static Schema<PkgField> {
        self.layout.schema()
    }

    fn col(&self, field: PkgField) -> Option<u32> {
        self.schema().col(field)
    }

    fn text(&self, row: u32, field: PkgField) -> Option<String> {
        self.base.text_opt(row, self.col(field))
    }

    pub fn verify(&self) -> Result<()> {
        if !self.base.exists() {
            return Err(self.base.missing(LABEL));
        }
        self.schema().verify_header(&self.base, LABEL)?;
        for row in self.base.data_rows() {
            self.validate_row(row)?;
        }
        Ok(())
    }

    fn validate_row(&self, row: u32) -> Result<()> {
        self.schema().check_required(&self.base, row, SUFFIX)?;
        let fail = |message: String| Err(SpreadsheetError::invalid(&self.base.name, row, message));

        if let Some(value) = self.text(row, PkgField::LicenseDeclared) {
            if let Err(e) = AnyLicenseInfo::parse(&value) {
                return fail(format!(
                    "Invalid declared license in row {} detail: {}{}",
                    row, e, SUFFIX
                ));
            }
        }
        if let Some(value) = self.text(row, PkgField::LicenseConcluded) {
            if let Err(e) = AnyLicenseInfo::parse(&value) {
                return fail(format!(
                    "Invalid seen license in row {} detail: {}{}",
                    row, e, SUFFIX
                ));
            }
        }
        if let Some(value) = self.text(row, PkgField::LicenseInfoFromFiles) {
            for license in value.split(',') {
                if let Err(e) = AnyLicenseInfo::parse(license) {
                    return fail(format!(
                        "Invalid license information in in files for license {} row {} detail: {}{}",
                        license, row, e, SUFFIX
                    ));
                }
            }
        }
        if let Some(value) = self.text(row, PkgField::Originator) {
            if let Err(e) = verify_agent(&value) {
                return fail(format!("Invalid originator in row {}: {}{}", row, e, SUFFIX));
            }
        }
        if let Some(value) = self.text(row, PkgField::Supplier) {
            if let Err(e) = verify_agent(&value) {
                return fail(format!("Invalid supplier in row {}: {}{}", row, e, SUFFIX));
            }
        }
        if let Some(col) = self.col(PkgField::FilesAnalyzed) {
            match self.base.cell(row, col) {
                Some(CellValue::Bool(_)) | None => {}
                Some(value) if value.is_blank() => {}
                Some(value) => {
                    let text = value.as_text().trim().to_lowercase();
                    if text != "true" && text != "false" {
                        return fail(format!(
                            "Invalid value for files analyzed (expecting 'true' or 'false') in row {}:{}",
                            row, text
                        ));
                    }
                }
            }
        }
        if let Some(value) = self.text(row, PkgField::PrimaryPurpose) {
            if value.trim().parse::<PackagePurpose>().is_err() {
                return fail(format!(
                    "Invalid primary package purpose in row {}: {}{}",
                    row, value, SUFFIX
                ));
            }
        }
        Ok(())
    }

    /// パッケージを1行追加
    ///
    /// 長文のセルはワークブックの文字数上限で切り詰められます。
    pub fn add(&mut self, pkg: &SpdxPackage) {
        let row = self.base.add_row();
        let col = |field| self.col(field);
        let cols = [
            (PkgField::Name, Some(pkg.name.clone())),
            (PkgField::SpdxId, Some(pkg.id.clone())),
            (PkgField::Version, pkg.version.clone()),
            (PkgField::FileName, pkg.file_name.clone()),
            (PkgField::Supplier, pkg.supplier.clone()),
            (PkgField::Originator, pkg.originator.clone()),
            (PkgField::HomePage, pkg.homepage.clone()),
            (PkgField::DownloadLocation, pkg.download_location.clone()),
            (
                PkgField::Checksums,
                Some(checksums_to_string(&pkg.checksums)).filter(|s| !s.is_empty()),
            ),
            (
                PkgField::VerificationCode,
                pkg.verification_code.as_ref().map(|v| v.value.clone()),
            ),
            (
                PkgField::VerificationExcluded,
                pkg.verification_code
                    .as_ref()
                    .map(|v| v.excluded_files.join(", "))
                    .filter(|s| !s.is_empty()),
            ),
            (PkgField::SourceInfo, pkg.source_info.clone()),
            (
                PkgField::LicenseDeclared,
                pkg.license_declared.as_ref().map(|l| l.to_string()),
            ),
            (
                PkgField::LicenseConcluded,
                pkg.license_concluded.as_ref().map(|l| l.to_string()),
            ),
            (
                PkgField::LicenseInfoFromFiles,
                Some(join_displayed(&pkg.license_info_from_files, ",")).filter(|s| !s.is_empty()),
            ),
            (PkgField::LicenseComments, pkg.license_comments.clone()),
            (PkgField::Copyright, pkg.copyright_text.clone()),
            (PkgField::Summary, pkg.summary.clone()),
            (PkgField::Description, pkg.description.clone()),
            (
                PkgField::AttributionText,
                Some(strings_to_csv(&pkg.attribution_text)).filter(|s| !s.is_empty()),
            ),
            (PkgField::FilesAnalyzed, Some(pkg.files_analyzed.to_string())),
            (PkgField::Comment, pkg.comment.clone()),
            (
                PkgField::PrimaryPurpose,
                pkg.primary_purpose.map(|p| p.to_string()),
            ),
            (PkgField::ReleaseDate, pkg.release_date.clone()),
            (PkgField::BuiltDate, pkg.built_date.clone()),
            (PkgField::ValidUntilDate, pkg.valid_until_date.clone()),
        ];
        let cells: Vec<(Option<u32>, Option<String>)> =
            cols.into_iter().map(|(f, v)| (col(f), v)).collect();
        for (col, value) in cells {
            self.base.set_opt(row, col, value.as_deref());
        }
    }

    /// 全データ行のパッケージを読み込む
    pub fn packages(&self, date_format: &DateFormat) -> Result<Vec<SpdxPackage>> {
        let mut packages = Vec::new();
        for row in self.base.data_rows() {
            if let Some(pkg) = self.package(row, date_format)? {
                packages.push(pkg);
            }
        }
        Ok(packages)
    }

    /// 1行からパッケージを再構築
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(SpdxPackage))` - 再構築したパッケージ
    /// * `Ok(None)` - 行が存在しないか、名前が空の場合
    /// * `Err(SpreadsheetError)` - 行の検証に失敗した場合
    pub fn package(&self, row: u32, date_format: &DateFormat) -> Result<Option<SpdxPackage>> {
        if !self.base.row_exists(row) {
            return Ok(None);
        }
        let Some(name) = self.text(row, PkgField::Name) else {
            return Ok(None);
        };
        self.validate_row(row)?;
        let id = self.text(row, PkgField::SpdxId).unwrap_or_default();
        let mut pkg = SpdxPackage::new(id.trim(), name);

        pkg.license_concluded = Some(match self.text(row, PkgField::LicenseConcluded) {
            Some(value) => AnyLicenseInfo::parse(&value)?,
            None => self.layout.default_concluded(),
        });
        pkg.license_declared = match self.text(row, PkgField::LicenseDeclared) {
            Some(value) => Some(AnyLicenseInfo::parse(&value)?),
            None if self.layout == PackageLayout::V2d3 => Some(AnyLicenseInfo::NoAssertion),
            None => None,
        };
        pkg.copyright_text = self.text(row, PkgField::Copyright);
        if let Some(value) = self.text(row, PkgField::Checksums) {
            pkg.checksums = str_to_checksums(&value)?;
        }
        pkg.file_name = self.text(row, PkgField::FileName);
        pkg.source_info = self.text(row, PkgField::SourceInfo);
        if let Some(value) = self.text(row, PkgField::LicenseInfoFromFiles) {
            pkg.license_info_from_files = value
                .split(',')
                .map(|l| AnyLicenseInfo::parse(l.trim()))
                .collect::<Result<_>>()?;
        }
        pkg.license_comments = self.text(row, PkgField::LicenseComments);
        pkg.summary = self.text(row, PkgField::Summary);
        if let Some(value) = self.text(row, PkgField::AttributionText) {
            pkg.attribution_text = csv_to_strings(&value);
        }
        pkg.description = self.text(row, PkgField::Description);
        pkg.download_location = self.text(row, PkgField::DownloadLocation);
        if let Some(value) = self.text(row, PkgField::VerificationCode) {
            let excluded_files = self
                .text(row, PkgField::VerificationExcluded)
                .map(|s| s.split(',').map(|f| f.trim().to_string()).collect())
                .unwrap_or_default();
            pkg.verification_code = Some(PackageVerificationCode {
                value,
                excluded_files,
            });
        }
        // 数値セルのバージョンは表示文字列として扱う
        pkg.version = self.text(row, PkgField::Version);
        pkg.supplier = self.text(row, PkgField::Supplier);
        pkg.originator = self.text(row, PkgField::Originator);
        pkg.homepage = self.text(row, PkgField::HomePage);
        if let Some(col) = self.col(PkgField::FilesAnalyzed) {
            pkg.files_analyzed = match self.base.cell(row, col) {
                Some(CellValue::Bool(b)) => *b,
                Some(value) => value.as_text().trim().to_lowercase() != "false",
                None => true,
            };
        }
        pkg.comment = self.text(row, PkgField::Comment);
        if let Some(value) = self.text(row, PkgField::PrimaryPurpose) {
            pkg.primary_purpose = Some(value.trim().parse()?);
        }
        pkg.release_date = self.date_text(row, PkgField::ReleaseDate, date_format);
        pkg.built_date = self.date_text(row, PkgField::BuiltDate, date_format);
        pkg.valid_until_date = self.date_text(row, PkgField::ValidUntilDate, date_format);
        Ok(Some(pkg))
    }

    /// 文字列または日付セルの値を日付文字列として取得
    fn date_text(&self, row: u32, field: PkgField, date_format: &DateFormat) -> Option<String> {
        let col = self.col(field)?;
        match self.base.cell(row, col)? {
            CellValue::Date(d) => Some(format_date(d, date_format)),
            value if !value.is_blank() => Some(value.as_text()),
            _ => None,
        }
    }
}

/// 供給者・作成者の書式（`Person:` / `Organization:` / `NOASSERTION`）を検証
fn verify_agent(value: &str) -> std::result::Result<(), String> {
    let value = value.trim();
    if value == "NOASSERTION" || value.starts_with("Person:") || value.starts_with("Organization:") {
        Ok(())
    } else {
        Err(format!(
            "{} must start with 'Person:' or 'Organization:', or be NOASSERTION",
            value
        ))
    }
}
