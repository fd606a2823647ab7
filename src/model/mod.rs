//! SPDX Document Model Module
//!
//! スプレッドシートと相互変換するSPDX文書モデル（値型）を定義するモジュール。
//!
//! - 関係（Relationship）とアノテーションは主語となる要素が所有します
//! - 関係の目的語は要素IDで参照します
//! - パッケージは所有するファイルのIDを`files`に保持します
//! - 文書が「記述する」要素は`DESCRIBES`関係から導出します

mod enums;
mod reference_types;
mod store;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::license::AnyLicenseInfo;

pub use enums::{
    AnnotationType, ChecksumAlgorithm, FileType, PackagePurpose, ReferenceCategory,
    RelationshipType,
};
pub use reference_types::{
    listed_reference_name, listed_reference_uri, LISTED_REFERENCE_TYPE_PREFIX, NO_REFERENCE_TYPE,
};
pub use store::{InMemoryStore, ModelStore};

/// 文書自身のSPDX識別子
pub const SPDX_DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";
/// 関係の目的語として解決不要な特殊ID
pub const NONE_ELEMENT_ID: &str = "NONE";
/// 関係の目的語として解決不要な特殊ID
pub const NOASSERTION_ELEMENT_ID: &str = "NOASSERTION";
/// 既定のデータライセンス
pub const DEFAULT_DATA_LICENSE: &str = "CC0-1.0";

/// チェックサム
///
/// 並び順はアルゴリズム名の文字列順、次に値の順です。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub value: String,
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }
}

impl Ord for Checksum {
    fn cmp(&self, other: &Self) -> Ordering {
        self.algorithm
            .as_str()
            .cmp(other.algorithm.as_str())
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for Checksum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// パッケージ検証コード
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageVerificationCode {
    pub value: String,
    pub excluded_files: Vec<String>,
}

/// `start:end`形式の範囲（`start < end`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StartEndPointer {
    pub start: u64,
    pub end: u64,
}

/// パッケージから外部の識別体系への参照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub category: ReferenceCategory,
    /// 参照タイプのURI
    pub reference_type: Option<String>,
    pub locator: String,
    pub comment: Option<String>,
}

/// 外部SPDX文書への参照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDocumentRef {
    /// `DocumentRef-`で始まるID
    pub id: String,
    pub document_uri: String,
    pub checksum: Checksum,
}

/// 抽出（非標準）ライセンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLicenseInfo {
    pub license_id: String,
    pub extracted_text: String,
    pub name: Option<String>,
    pub see_also: Vec<String>,
    pub comment: Option<String>,
}

impl ExtractedLicenseInfo {
    pub fn new(license_id: impl Into<String>, extracted_text: impl Into<String>) -> Self {
        Self {
            license_id: license_id.into(),
            extracted_text: extracted_text.into(),
            name: None,
            see_also: Vec::new(),
            comment: None,
        }
    }
}

/// 要素間の関係（主語は所有する要素）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship_type: RelationshipType,
    pub related_element_id: String,
    pub comment: Option<String>,
}

impl Relationship {
    pub fn new(relationship_type: RelationshipType, related_element_id: impl Into<String>) -> Self {
        Self {
            relationship_type,
            related_element_id: related_element_id.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// アノテーション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub annotator: String,
    pub annotation_type: AnnotationType,
    /// SPDX形式の日付文字列
    pub date: String,
    pub comment: String,
}

/// 作成情報
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreationInfo {
    pub creators: Vec<String>,
    /// SPDX形式の日付文字列
    pub created: String,
    pub comment: Option<String>,
    pub license_list_version: Option<String>,
}

/// SPDX文書
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpdxDocument {
    pub namespace: String,
    pub id: String,
    pub name: String,
    pub spec_version: String,
    pub data_license: AnyLicenseInfo,
    pub comment: Option<String>,
    pub creation_info: CreationInfo,
    pub external_document_refs: Vec<ExternalDocumentRef>,
    pub extracted_licenses: Vec<ExtractedLicenseInfo>,
    pub relationships: Vec<Relationship>,
    pub annotations: Vec<Annotation>,
}

impl SpdxDocument {
    /// 空の文書を生成
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: SPDX_DOCUMENT_ID.to_string(),
            name: name.into(),
            spec_version: "SPDX-2.3".to_string(),
            data_license: AnyLicenseInfo::Listed(DEFAULT_DATA_LICENSE.to_string()),
            comment: None,
            creation_info: CreationInfo::default(),
            external_document_refs: Vec::new(),
            extracted_licenses: Vec::new(),
            relationships: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// `DESCRIBES`関係の目的語ID
    pub fn described_ids(&self) -> Vec<&str> {
        self.relationships
            .iter()
            .filter(|r| r.relationship_type == RelationshipType::DESCRIBES)
            .map(|r| r.related_element_id.as_str())
            .collect()
    }

    pub fn extracted_license(&self, license_id: &str) -> Option<&ExtractedLicenseInfo> {
        self.extracted_licenses
            .iter()
            .find(|l| l.license_id == license_id)
    }
}

/// パッケージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpdxPackage {
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub file_name: Option<String>,
    pub supplier: Option<String>,
    pub originator: Option<String>,
    pub homepage: Option<String>,
    pub download_location: Option<String>,
    pub checksums: Vec<Checksum>,
    pub verification_code: Option<PackageVerificationCode>,
    pub source_info: Option<String>,
    pub license_declared: Option<AnyLicenseInfo>,
    pub license_concluded: Option<AnyLicenseInfo>,
    pub license_info_from_files: Vec<AnyLicenseInfo>,
    pub license_comments: Option<String>,
    pub copyright_text: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub attribution_text: Vec<String>,
    pub files_analyzed: bool,
    pub comment: Option<String>,
    pub primary_purpose: Option<PackagePurpose>,
    pub release_date: Option<String>,
    pub built_date: Option<String>,
    pub valid_until_date: Option<String>,
    pub external_refs: Vec<ExternalRef>,
    /// 所有するファイルのID
    pub files: Vec<String>,
    pub relationships: Vec<Relationship>,
    pub annotations: Vec<Annotation>,
}

impl SpdxPackage {
    /// 必須項目のみを持つパッケージを生成（`files_analyzed`は`true`）
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: None,
            file_name: None,
            supplier: None,
            originator: None,
            homepage: None,
            download_location: None,
            checksums: Vec::new(),
            verification_code: None,
            source_info: None,
            license_declared: None,
            license_concluded: None,
            license_info_from_files: Vec::new(),
            license_comments: None,
            copyright_text: None,
            summary: None,
            description: None,
            attribution_text: Vec::new(),
            files_analyzed: true,
            comment: None,
            primary_purpose: None,
            release_date: None,
            built_date: None,
            valid_until_date: None,
            external_refs: Vec::new(),
            files: Vec::new(),
            relationships: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn has_file(&self, file_id: &str) -> bool {
        self.files.iter().any(|f| f == file_id)
    }
}

/// ファイル
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpdxFile {
    pub id: String,
    pub name: String,
    pub checksums: Vec<Checksum>,
    pub file_types: Vec<FileType>,
    pub license_concluded: Option<AnyLicenseInfo>,
    pub license_info_in_files: Vec<AnyLicenseInfo>,
    pub license_comments: Option<String>,
    pub copyright_text: Option<String>,
    pub notice_text: Option<String>,
    pub contributors: Vec<String>,
    pub attribution_text: Vec<String>,
    pub comment: Option<String>,
    pub relationships: Vec<Relationship>,
    pub annotations: Vec<Annotation>,
}

impl SpdxFile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// SHA1チェックサムの値
    pub fn sha1(&self) -> Option<&str> {
        self.checksums
            .iter()
            .find(|c| c.algorithm == ChecksumAlgorithm::SHA1)
            .map(|c| c.value.as_str())
    }
}

/// スニペット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpdxSnippet {
    pub id: String,
    pub name: Option<String>,
    /// 所属するファイルのID
    pub snippet_from_file: String,
    pub byte_range: StartEndPointer,
    pub line_range: Option<StartEndPointer>,
    pub license_concluded: Option<AnyLicenseInfo>,
    pub license_info_in_snippet: Vec<AnyLicenseInfo>,
    pub license_comments: Option<String>,
    pub copyright_text: Option<String>,
    pub comment: Option<String>,
    pub relationships: Vec<Relationship>,
    pub annotations: Vec<Annotation>,
}

impl SpdxSnippet {
    pub fn new(
        id: impl Into<String>,
        snippet_from_file: impl Into<String>,
        byte_range: StartEndPointer,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            snippet_from_file: snippet_from_file.into(),
            byte_range,
            line_range: None,
            license_concluded: None,
            license_info_in_snippet: Vec::new(),
            license_comments: None,
            copyright_text: None,
            comment: None,
            relationships: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// 要素の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Document,
    Package,
    File,
    Snippet,
}

/// モデルストアに格納される要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpdxElement {
    Document(SpdxDocument),
    Package(SpdxPackage),
    File(SpdxFile),
    Snippet(SpdxSnippet),
}

impl SpdxElement {
    pub fn id(&self) -> &str {
        match self {
            SpdxElement::Document(d) => &d.id,
            SpdxElement::Package(p) => &p.id,
            SpdxElement::File(f) => &f.id,
            SpdxElement::Snippet(s) => &s.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            SpdxElement::Document(_) => ElementKind::Document,
            SpdxElement::Package(_) => ElementKind::Package,
            SpdxElement::File(_) => ElementKind::File,
            SpdxElement::Snippet(_) => ElementKind::Snippet,
        }
    }

    pub fn relationships(&self) -> &[Relationship] {
        match self {
            SpdxElement::Document(d) => &d.relationships,
            SpdxElement::Package(p) => &p.relationships,
            SpdxElement::File(f) => &f.relationships,
            SpdxElement::Snippet(s) => &s.relationships,
        }
    }

    pub fn relationships_mut(&mut self) -> &mut Vec<Relationship> {
        match self {
            SpdxElement::Document(d) => &mut d.relationships,
            SpdxElement::Package(p) => &mut p.relationships,
            SpdxElement::File(f) => &mut f.relationships,
            SpdxElement::Snippet(s) => &mut s.relationships,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            SpdxElement::Document(d) => &d.annotations,
            SpdxElement::Package(p) => &p.annotations,
            SpdxElement::File(f) => &f.annotations,
            SpdxElement::Snippet(s) => &s.annotations,
        }
    }

    pub fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        match self {
            SpdxElement::Document(d) => &mut d.annotations,
            SpdxElement::Package(p) => &mut p.annotations,
            SpdxElement::File(f) => &mut f.annotations,
            SpdxElement::Snippet(s) => &mut s.annotations,
        }
    }
}

impl From<SpdxDocument> for SpdxElement {
    fn from(doc: SpdxDocument) -> Self {
        SpdxElement::Document(doc)
    }
}

impl From<SpdxPackage> for SpdxElement {
    fn from(pkg: SpdxPackage) -> Self {
        SpdxElement::Package(pkg)
    }
}

impl From<SpdxFile> for SpdxElement {
    fn from(file: SpdxFile) -> Self {
        SpdxElement::File(file)
    }
}

impl From<SpdxSnippet> for SpdxElement {
    fn from(snippet: SpdxSnippet) -> Self {
        SpdxElement::Snippet(snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // チェックサムはアルゴリズム名の文字列順に並ぶ
    #[test]
    fn test_checksum_ordering() {
        let mut checksums = vec![
            Checksum::new(ChecksumAlgorithm::SHA256, "a"),
            Checksum::new(ChecksumAlgorithm::ADLER32, "b"),
            Checksum::new(ChecksumAlgorithm::MD5, "c"),
        ];
        checksums.sort();
        let order: Vec<_> = checksums.iter().map(|c| c.algorithm).collect();
        assert_eq!(
            order,
            vec![
                ChecksumAlgorithm::ADLER32,
                ChecksumAlgorithm::MD5,
                ChecksumAlgorithm::SHA256
            ]
        );
    }

    #[test]
    fn test_described_ids() {
        let mut doc = SpdxDocument::new("http://example.com/doc", "doc");
        doc.relationships
            .push(Relationship::new(RelationshipType::DESCRIBES, "SPDXRef-1"));
        doc.relationships
            .push(Relationship::new(RelationshipType::AMENDS, "SPDXRef-2"));
        assert_eq!(doc.described_ids(), vec!["SPDXRef-1"]);
        assert_eq!(doc.id, SPDX_DOCUMENT_ID);
    }

    #[test]
    fn test_element_accessors() {
        let mut element = SpdxElement::from(SpdxFile::new("SPDXRef-f", "a.c"));
        assert_eq!(element.kind(), ElementKind::File);
        element
            .relationships_mut()
            .push(Relationship::new(RelationshipType::OTHER, "NONE"));
        assert_eq!(element.relationships().len(), 1);
        assert_eq!(element.id(), "SPDXRef-f");
    }

    #[test]
    fn test_package_defaults() {
        let pkg = SpdxPackage::new("SPDXRef-p", "pkg");
        assert!(pkg.files_analyzed);
        assert!(!pkg.has_file("SPDXRef-f"));
    }

    // モデルはserdeでJSONに変換できる
    #[test]
    fn test_serde_json() {
        let mut pkg = SpdxPackage::new("SPDXRef-p", "pkg");
        pkg.license_concluded = Some(AnyLicenseInfo::NoAssertion);
        pkg.checksums = vec![Checksum::new(ChecksumAlgorithm::SHA1, "abc")];

        let json = serde_json::to_value(&pkg).unwrap();
        assert_eq!(json["id"], "SPDXRef-p");
        assert_eq!(json["checksums"][0]["algorithm"], "SHA1");

        let back: SpdxPackage = serde_json::from_value(json).unwrap();
        assert_eq!(back, pkg);
    }
}
