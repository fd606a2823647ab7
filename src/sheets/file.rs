//! Per File Info Sheet
//!
//! ファイルを1行1件で保持するシート。スキーマはバージョンによって3種類です。
//!
//! | レイアウト | 対象バージョン | 必須列 |
//! |------------|----------------|--------|
//! | `Legacy`   | 2.1.0以前      | ファイル名、ファイル種別 |
//! | `V2d2`     | 2.2.0以前      | ファイル名、ID、ファイル種別 |
//! | `V2d3`     | それ以降       | ファイル名、ID、チェックサム |
//!
//! 旧形式のArtifact of Project列とFile Dependencies列は、読み込み時に
//! 関係（`GENERATED_FROM` / `DEPENDS_ON`）へ移行します。書き込みは行いません。

use std::collections::HashMap;

use tracing::debug;

use crate::codec::{
    checksums_to_string, csv_to_strings, join_displayed, licenses_to_string, str_to_checksums,
    strings_to_csv,
};
use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::license::{parse_license_list, AnyLicenseInfo};
use crate::model::{
    ChecksumAlgorithm, FileType, ModelStore, Relationship, RelationshipType, SpdxElement,
    SpdxFile, SpdxPackage,
};
use crate::spreadsheet::{VERSION_2_1_0, VERSION_2_2_0};

use super::{Column, Schema, SheetBase, Trailer, PLAIN, REQUIRED, WRAP};

const LABEL: &str = "SPDX File";

const DOAP_PACKAGE_COMMENT: &str = "This package was converted from a DOAP Project by the same name";
const ARTIFACT_OF_COMMENT: &str = "This relationship replaces an ArtifactOf";
const FILE_DEPENDENCY_COMMENT: &str = "This relationship replaced a file dependency property value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileField {
    Name,
    SpdxId,
    PackageIds,
    FileTypes,
    Checksums,
    LicenseConcluded,
    LicenseInfoInFile,
    LicenseComments,
    Copyright,
    NoticeText,
    ArtifactOfProject,
    ArtifactOfHomepage,
    ArtifactOfUrl,
    Contributors,
    Comment,
    Dependencies,
    AttributionText,
}

const RW: u8 = REQUIRED | WRAP;

// 旧形式ではIDが空の行を許し、読み込み時にIDを生成する
static COLUMNS_LEGACY: [Column<FileField>; 16] = [
    Column::new(FileField::Name, "File Name", 60.0, RW),
    Column::new(FileField::SpdxId, "SPDX Identifier", 25.0, PLAIN),
    Column::new(FileField::PackageIds, "Package Identifier", 25.0, PLAIN),
    Column::new(FileField::FileTypes, "File Type(s)", 30.0, RW),
    Column::new(FileField::Checksums, "File Checksum(s)", 85.0, WRAP),
    Column::new(FileField::LicenseConcluded, "License Concluded", 50.0, WRAP),
    Column::new(FileField::LicenseInfoInFile, "License Info in File", 50.0, WRAP),
    Column::new(FileField::LicenseComments, "License Comments", 60.0, WRAP),
    Column::new(FileField::Copyright, "File Copyright Text", 70.0, WRAP),
    Column::new(FileField::NoticeText, "Notice Text", 70.0, WRAP),
    Column::new(FileField::ArtifactOfProject, "Artifact of Project", 35.0, WRAP),
    Column::new(FileField::ArtifactOfHomepage, "Artifact of Homepage", 60.0, WRAP),
    Column::new(FileField::ArtifactOfUrl, "Artifact of URL", 60.0, WRAP),
    Column::new(FileField::Contributors, "Contributors", 60.0, WRAP),
    Column::new(FileField::Comment, "File Comment", 60.0, WRAP),
    Column::new(FileField::Dependencies, "File Dependencies", 60.0, WRAP),
];

static COLUMNS_2_2: [Column<FileField>; 17] = [
    Column::new(FileField::Name, "File Name", 60.0, RW),
    Column::new(FileField::SpdxId, "SPDX Identifier", 25.0, REQUIRED),
    Column::new(FileField::PackageIds, "Package Identifier", 25.0, PLAIN),
    Column::new(FileField::FileTypes, "File Type(s)", 30.0, RW),
    Column::new(FileField::Checksums, "File Checksum(s)", 85.0, WRAP),
    Column::new(FileField::LicenseConcluded, "License Concluded", 50.0, WRAP),
    Column::new(FileField::LicenseInfoInFile, "License Info in File", 50.0, WRAP),
    Column::new(FileField::LicenseComments, "License Comments", 60.0, WRAP),
    Column::new(FileField::Copyright, "File Copyright Text", 70.0, WRAP),
    Column::new(FileField::NoticeText, "Notice Text", 70.0, WRAP),
    Column::new(FileField::ArtifactOfProject, "Artifact of Project", 35.0, WRAP),
    Column::new(FileField::ArtifactOfHomepage, "Artifact of Homepage", 60.0, WRAP),
    Column::new(FileField::ArtifactOfUrl, "Artifact of URL", 60.0, WRAP),
    Column::new(FileField::Contributors, "Contributors", 60.0, WRAP),
    Column::new(FileField::Comment, "File Comment", 60.0, WRAP),
    Column::new(FileField::Dependencies, "File Dependencies", 60.0, WRAP),
    Column::new(FileField::AttributionText, "Attribution Text", 60.0, WRAP),
];

static COLUMNS_2_3: [Column<FileField>; 17] = [
    Column::new(FileField::Name, "File Name", 60.0, RW),
    Column::new(FileField::SpdxId, "SPDX Identifier", 25.0, REQUIRED),
    Column::new(FileField::PackageIds, "Package Identifier", 25.0, PLAIN),
    Column::new(FileField::FileTypes, "File Type(s)", 30.0, WRAP),
    Column::new(FileField::Checksums, "File Checksum(s)", 85.0, RW),
    Column::new(FileField::LicenseConcluded, "License Concluded", 50.0, WRAP),
    Column::new(FileField::LicenseInfoInFile, "License Info in File", 50.0, WRAP),
    Column::new(FileField::LicenseComments, "License Comments", 60.0, WRAP),
    Column::new(FileField::Copyright, "File Copyright Text", 70.0, WRAP),
    Column::new(FileField::NoticeText, "Notice Text", 70.0, WRAP),
    Column::new(FileField::ArtifactOfProject, "Artifact of Project", 35.0, WRAP),
    Column::new(FileField::ArtifactOfHomepage, "Artifact of Homepage", 60.0, WRAP),
    Column::new(FileField::ArtifactOfUrl, "Artifact of URL", 60.0, WRAP),
    Column::new(FileField::Contributors, "Contributors", 60.0, WRAP),
    Column::new(FileField::Comment, "File Comment", 60.0, WRAP),
    Column::new(FileField::Dependencies, "File Dependencies", 60.0, WRAP),
    Column::new(FileField::AttributionText, "Attribution Text", 60.0, WRAP),
];

const TRAILER: Option<Trailer> = Some(Trailer {
    title: "User Defined Columns...",
    width: 60.0,
});

static SCHEMA_LEGACY: Schema<FileField> = Schema {
    columns: &COLUMNS_LEGACY,
    trailer: TRAILER,
};
static SCHEMA_2_2: Schema<FileField> = Schema {
    columns: &COLUMNS_2_2,
    trailer: TRAILER,
};
static SCHEMA_2_3: Schema<FileField> = Schema {
    columns: &COLUMNS_2_3,
    trailer: TRAILER,
};

/// ファイルシートのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileLayout {
    Legacy,
    V2d2,
    V2d3,
}

impl FileLayout {
    pub fn for_version(version: &str) -> Self {
        if version <= VERSION_2_1_0 {
            FileLayout::Legacy
        } else if version <= VERSION_2_2_0 {
            FileLayout::V2d2
        } else {
            FileLayout::V2d3
        }
    }

    fn schema(self) -> &'static Schema<FileField> {
        match self {
            FileLayout::Legacy => &SCHEMA_LEGACY,
            FileLayout::V2d2 => &SCHEMA_2_2,
            FileLayout::V2d3 => &SCHEMA_2_3,
        }
    }
}

/// ファイル情報シート
///
/// 同じセッション内で同じ行を繰り返し読み込んでも同一のファイルが返るよう、
/// 構築したファイルをファイル名でキャッシュします。
pub(crate) struct FileSheet<'a> {
    base: SheetBase<'a>,
    layout: FileLayout,
    cache: HashMap<String, SpdxFile>,
    /// ID列が空の行に割り当てたID
    generated_ids: HashMap<u32, String>,
}

impl<'a> FileSheet<'a> {
    pub fn open(workbook: &'a mut Workbook, name: &str, version: &str) -> Self {
        Self {
            base: SheetBase::open(workbook, name),
            layout: FileLayout::for_version(version),
            cache: HashMap::new(),
            generated_ids: HashMap::new(),
        }
    }

    /// 最新レイアウトのシートを作成
    pub fn create(workbook: &mut Workbook, name: &str, styled: bool) {
        SCHEMA_2_3.create(workbook, name, styled);
    }

    fn schema(&self) -> &'static Schema<FileField> {
        self.layout.schema()
    }

    fn col(&self, field: FileField) -> Option<u32> {
        self.schema().col(field)
    }

    fn text(&self, row: u32, field: FileField) -> Option<String> {
        self.base.text_opt(row, self.col(field))
    }

    pub fn data_rows(&self) -> std::ops::Range<u32> {
        self.base.data_rows()
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
        self.schema().check_required(&self.base, row, "")?;
        if let Some(value) = self.text(row, FileField::LicenseConcluded) {
            if let Err(e) = AnyLicenseInfo::parse(&value) {
                return Err(SpreadsheetError::invalid(
                    &self.base.name,
                    row,
                    format!("Invalid asserted license string in row {} details: {}", row, e),
                ));
            }
        }
        Ok(())
    }

    /// ファイルを1行追加
    ///
    /// # 引数
    ///
    /// * `file` - 書き込むファイル
    /// * `package_ids` - ファイルを含むパッケージのID（`", "`区切りで書き込む）
    pub fn add(&mut self, file: &SpdxFile, package_ids: &[String]) {
        let row = self.base.add_row();
        let non_empty = |s: String| Some(s).filter(|s| !s.is_empty());
        let cells = [
            (FileField::Name, Some(file.name.clone())),
            (FileField::SpdxId, non_empty(file.id.clone())),
            (FileField::PackageIds, non_empty(package_ids.join(", "))),
            (FileField::FileTypes, non_empty(join_displayed(&file.file_types, ", "))),
            (FileField::Checksums, non_empty(checksums_to_string(&file.checksums))),
            (
                FileField::LicenseConcluded,
                file.license_concluded.as_ref().map(|l| l.to_string()),
            ),
            (
                FileField::LicenseInfoInFile,
                non_empty(licenses_to_string(&file.license_info_in_files)),
            ),
            (
                FileField::LicenseComments,
                file.license_comments.clone().filter(|s| !s.is_empty()),
            ),
            (
                FileField::Copyright,
                file.copyright_text.clone().filter(|s| !s.is_empty()),
            ),
            (
                FileField::NoticeText,
                file.notice_text.clone().filter(|s| !s.is_empty()),
            ),
            (FileField::Contributors, non_empty(strings_to_csv(&file.contributors))),
            (FileField::Comment, file.comment.clone().filter(|s| !s.is_empty())),
            (
                FileField::AttributionText,
                non_empty(strings_to_csv(&file.attribution_text)),
            ),
        ];
        let cells: Vec<(Option<u32>, Option<String>)> = cells
            .into_iter()
            .map(|(field, value)| (self.col(field), value))
            .collect();
        for (col, value) in cells {
            self.base.set_opt(row, col, value.as_deref());
        }
    }

    /// ファイルを含むパッケージのID
    pub fn package_ids(&self, row: u32) -> Vec<String> {
        self.text(row, FileField::PackageIds)
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 1行からファイルを再構築
    ///
    /// 旧形式の列から合成したパッケージは`store`に格納されます。
    ///
    /// # 引数
    ///
    /// * `row` - 行番号
    /// * `store` - ID生成と合成パッケージの格納先
    /// * `namespace` - 文書名前空間
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(SpdxFile))` - 再構築（またはキャッシュ済み）のファイル
    /// * `Ok(None)` - 行が存在しない場合
    /// * `Err(SpreadsheetError)` - 行の検証、チェックサム、ライセンスの解析に失敗した場合
    pub fn get_file_info<S: ModelStore + ?Sized>(
        &mut self,
        row: u32,
        store: &mut S,
        namespace: &str,
    ) -> Result<Option<SpdxFile>> {
        if !self.base.row_exists(row) {
            return Ok(None);
        }
        self.validate_row(row)?;
        let name = self.text(row, FileField::Name).unwrap_or_default();
        if let Some(cached) = self.cache.get(&name) {
            return Ok(Some(cached.clone()));
        }
        let id = self.row_id(row, store, namespace);
        let mut file = SpdxFile::new(id, name.clone());

        if let Some(value) = self.text(row, FileField::Checksums) {
            file.checksums = str_to_checksums(&value).map_err(|e| {
                SpreadsheetError::Format(format!("Error converting file checksums: {}", e))
            })?;
        }
        let sha1_count = file
            .checksums
            .iter()
            .filter(|c| c.algorithm == ChecksumAlgorithm::SHA1)
            .count();
        if sha1_count > 1 {
            return Err(SpreadsheetError::Format(format!("Duplicate SHA1 for file {}", name)));
        }
        if sha1_count == 0 {
            return Err(SpreadsheetError::Format(format!("Missing SHA1 for file {}", name)));
        }

        file.license_concluded = Some(match self.text(row, FileField::LicenseConcluded) {
            Some(value) => AnyLicenseInfo::parse(&value).map_err(|e| {
                SpreadsheetError::Format(format!(
                    "Error getting concluded license for file {}: {}",
                    name, e
                ))
            })?,
            None => match self.layout {
                FileLayout::V2d2 => {
                    return Err(SpreadsheetError::Format(format!(
                        "Missing concluded license for file {}",
                        name
                    )))
                }
                FileLayout::V2d3 => AnyLicenseInfo::NoAssertion,
                FileLayout::Legacy => AnyLicenseInfo::None,
            },
        });
        if let Some(value) = self.text(row, FileField::LicenseInfoInFile) {
            file.license_info_in_files = parse_license_list(&value).map_err(|e| {
                SpreadsheetError::Format(format!(
                    "Error getting license infos from file for file {}: {}",
                    name, e
                ))
            })?;
        }
        file.copyright_text = match (self.text(row, FileField::Copyright), self.layout) {
            (Some(text), _) => Some(text),
            (None, FileLayout::V2d3) => None,
            (None, _) => Some(String::new()),
        };
        if let Some(value) = self.text(row, FileField::FileTypes) {
            file.file_types = parse_file_types(&value)?;
        }
        file.license_comments = self.text(row, FileField::LicenseComments);
        let trimmed = |field| {
            self.text(row, field)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        if let Some(value) = trimmed(FileField::Contributors) {
            file.contributors = csv_to_strings(&value);
        }
        if let Some(value) = trimmed(FileField::AttributionText) {
            file.attribution_text = csv_to_strings(&value);
        }
        file.notice_text = trimmed(FileField::NoticeText);
        file.comment = trimmed(FileField::Comment);

        self.migrate_legacy_artifact_of_to_relationships(row, &mut file, store, namespace);
        self.migrate_file_dependencies_to_relationships(row, &mut file, store, namespace)?;

        self.cache.insert(name, file.clone());
        Ok(Some(file))
    }

    /// 行のID（空の場合は生成し、同じ行には同じIDを返す）
    fn row_id<S: ModelStore + ?Sized>(&mut self, row: u32, store: &mut S, namespace: &str) -> String {
        if let Some(id) = self.text(row, FileField::SpdxId) {
            return id.trim().to_string();
        }
        self.generated_ids
            .entry(row)
            .or_insert_with(|| store.next_id(namespace))
            .clone()
    }

    /// Artifact of Project列の各プロジェクトからパッケージを合成し、
    /// ファイルからの`GENERATED_FROM`関係に置き換える
    fn migrate_legacy_artifact_of_to_relationships<S: ModelStore + ?Sized>(
        &self,
        row: u32,
        file: &mut SpdxFile,
        store: &mut S,
        namespace: &str,
    ) {
        let Some(projects) = self.text(row, FileField::ArtifactOfProject) else {
            return;
        };
        let homepages = self
            .text(row, FileField::ArtifactOfHomepage)
            .map(|h| csv_to_strings(&h))
            .unwrap_or_default();
        for (i, project) in csv_to_strings(&projects).into_iter().enumerate() {
            let mut id = format!("SPDXRef-FromDoap-{}", i);
            let reusable = match store.get(namespace, &id) {
                None => true,
                Some(SpdxElement::Package(pkg)) => pkg.name == project,
                Some(_) => false,
            };
            if !reusable {
                id = store.next_id(namespace);
            }
            let mut pkg = SpdxPackage::new(id.clone(), project);
            pkg.license_concluded = Some(AnyLicenseInfo::NoAssertion);
            pkg.license_declared = Some(AnyLicenseInfo::NoAssertion);
            pkg.copyright_text = Some("NOASSERTION".to_string());
            pkg.download_location = Some("NOASSERTION".to_string());
            pkg.files_analyzed = false;
            pkg.homepage = homepages.get(i).cloned();
            pkg.comment = Some(DOAP_PACKAGE_COMMENT.to_string());
            debug!(file = %file.name, package = %id, "artifact-of project converted to package");
            store.put(namespace, pkg.into());
            file.relationships.push(
                Relationship::new(RelationshipType::GENERATED_FROM, id)
                    .with_comment(ARTIFACT_OF_COMMENT),
            );
        }
    }

    /// File Dependencies列のファイル名を解決し、`DEPENDS_ON`関係に置き換える
    fn migrate_file_dependencies_to_relationships<S: ModelStore + ?Sized>(
        &mut self,
        row: u32,
        file: &mut SpdxFile,
        store: &mut S,
        namespace: &str,
    ) -> Result<()> {
        let Some(dependencies) = self.text(row, FileField::Dependencies) else {
            return Ok(());
        };
        for dependency in csv_to_strings(&dependencies) {
            let dependency = dependency.trim();
            let id = self.find_file_id_by_name(dependency, store, namespace)?;
            file.relationships.push(
                Relationship::new(RelationshipType::DEPENDS_ON, id)
                    .with_comment(FILE_DEPENDENCY_COMMENT),
            );
        }
        Ok(())
    }

    /// ファイル名からIDを解決（キャッシュ、次にシート全体を検索）
    fn find_file_id_by_name<S: ModelStore + ?Sized>(
        &mut self,
        name: &str,
        store: &mut S,
        namespace: &str,
    ) -> Result<String> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.id.clone());
        }
        let found = self.base.data_rows().find(|&row| {
            self.text(row, FileField::Name)
                .map(|n| n.trim() == name)
                .unwrap_or(false)
        });
        match found {
            Some(row) => Ok(self.row_id(row, store, namespace)),
            None => Err(SpreadsheetError::Format(format!(
                "Could not find dependant file in the spreadsheet: {}",
                name
            ))),
        }
    }
}

/// `", "`区切りのファイル種別を解析
fn parse_file_types(value: &str) -> Result<Vec<FileType>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<FileType>()
                .map_err(|_| SpreadsheetError::Format(format!("Unrecognized file type {}", t)))
        })
        .collect()
}
