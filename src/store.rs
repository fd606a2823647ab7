//! Store Module
//!
//! モデルストアとスプレッドシートの間で文書全体を書き出し・読み込むオーケストレーター。
//!
//! 読み込みの順序は参照の解決順そのもので、入れ替えると参照先の要素が
//! 見つからずに失敗します。
//!
//! 1. 文書情報（レビュー担当者シートは文書のアノテーションへ移行）
//! 2. 抽出ライセンス
//! 3. パッケージ（外部参照を含む）
//! 4. ファイル（所有パッケージへ登録）
//! 5. スニペット（所属ファイルを解決）
//! 6. アノテーション
//! 7. 関係

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};

use tracing::{debug, info, instrument, warn};

use crate::builder::StoreConfig;
use crate::error::{Result, SpreadsheetError};
use crate::model::{
    Annotation, InMemoryStore, ModelStore, Relationship, RelationshipType, SpdxElement,
    NOASSERTION_ELEMENT_ID, NONE_ELEMENT_ID, SPDX_DOCUMENT_ID,
};
use crate::spreadsheet::SpdxSpreadsheet;

/// 文書をバイト列として書き出し・読み込みできるストア
pub trait SerializableStore {
    /// ストア内の唯一の文書をスプレッドシートとして書き出す
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 書き出しに成功した場合
    /// * `Err(SpreadsheetError)` - 文書が0件または複数ある場合、書き出しに失敗した場合
    fn serialize<W: Write>(&self, writer: W) -> Result<()>;

    /// スプレッドシートを読み込み、ストアに文書を格納する
    ///
    /// # 引数
    ///
    /// * `reader` - ワークブックのバイト列
    /// * `overwrite` - 同じ名前空間の文書が既に存在する場合に置き換えるか
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 読み込んだ文書の名前空間
    /// * `Err(SpreadsheetError)` - 検証、参照の解決、既存文書との衝突で失敗した場合
    fn deserialize<R: Read>(&mut self, reader: R, overwrite: bool) -> Result<String>;
}

/// スプレッドシートストア
///
/// `SpreadsheetStoreBuilder`で構築します。モデルストアは既定で[`InMemoryStore`]です。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use spdx_spreadsheet::model::ModelStore;
/// use spdx_spreadsheet::{SerializableStore, SpreadsheetStoreBuilder};
///
/// # fn main() -> Result<(), spdx_spreadsheet::SpreadsheetError> {
/// let mut store = SpreadsheetStoreBuilder::new().build()?;
/// let namespace = store.deserialize(File::open("sbom.xlsx")?, false)?;
/// println!("{} packages", store.store().packages(&namespace).len());
///
/// store.serialize(File::create("copy.xlsx")?)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SpreadsheetStore<S: ModelStore = InMemoryStore> {
    config: StoreConfig,
    store: S,
}

impl<S: ModelStore> SpreadsheetStore<S> {
    pub(crate) fn new(config: StoreConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// 指定した名前空間の文書をスプレッドシートとして書き出す
    ///
    /// # 引数
    ///
    /// * `namespace` - 書き出す文書の名前空間
    /// * `writer` - 出力先
    #[instrument(skip(self, writer))]
    pub fn serialize_document<W: Write>(&self, namespace: &str, mut writer: W) -> Result<()> {
        let doc = self.store.document(namespace).ok_or_else(|| {
            SpreadsheetError::Format(format!("No SPDX document found for namespace {}", namespace))
        })?;
        info!("serializing SPDX document");
        let config = &self.config;
        let mut spreadsheet = SpdxSpreadsheet::create(config.style_columns);
        spreadsheet.set_max_cell_chars(config.max_cell_chars);
        spreadsheet
            .document_sheet()
            .add_document(doc, &config.date_format)?;

        let mut file_packages: HashMap<&str, Vec<String>> = HashMap::new();
        let mut relationships: BTreeMap<&str, Vec<&Relationship>> = BTreeMap::new();
        let mut annotations: BTreeMap<&str, Vec<&Annotation>> = BTreeMap::new();

        let mut packages = self.store.packages(namespace);
        packages.sort_by(|a, b| a.id.cmp(&b.id));
        {
            let mut sheet = spreadsheet.package_sheet();
            for pkg in &packages {
                sheet.add(pkg);
                for file_id in &pkg.files {
                    file_packages
                        .entry(file_id.as_str())
                        .or_default()
                        .push(pkg.id.clone());
                }
                for relationship in &pkg.relationships {
                    // 所有ファイルへのCONTAINSはファイルシートのパッケージ列で表現済み
                    if relationship.relationship_type == RelationshipType::CONTAINS
                        && pkg.has_file(&relationship.related_element_id)
                    {
                        continue;
                    }
                    relationships.entry(&pkg.id).or_default().push(relationship);
                }
                annotations
                    .entry(&pkg.id)
                    .or_default()
                    .extend(pkg.annotations.iter());
            }
        }
        {
            let mut sheet = spreadsheet.external_ref_sheet();
            for pkg in &packages {
                for external_ref in &pkg.external_refs {
                    sheet.add(&pkg.id, external_ref, namespace);
                }
            }
        }
        spreadsheet
            .extracted_license_sheet()
            .add_all(&doc.extracted_licenses);

        let mut files = self.store.files(namespace);
        files.sort_by(|a, b| a.id.cmp(&b.id));
        {
            let mut sheet = spreadsheet.file_sheet();
            for file in &files {
                let owners = file_packages
                    .get(file.id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                sheet.add(file, owners);
                relationships
                    .entry(&file.id)
                    .or_default()
                    .extend(file.relationships.iter());
                annotations
                    .entry(&file.id)
                    .or_default()
                    .extend(file.annotations.iter());
            }
        }

        let mut snippets = self.store.snippets(namespace);
        snippets.sort_by(|a, b| a.id.cmp(&b.id));
        {
            let mut sheet = spreadsheet.snippet_sheet();
            for snippet in &snippets {
                sheet.add(snippet);
                relationships
                    .entry(&snippet.id)
                    .or_default()
                    .extend(snippet.relationships.iter());
                annotations
                    .entry(&snippet.id)
                    .or_default()
                    .extend(snippet.annotations.iter());
            }
        }

        relationships
            .entry(&doc.id)
            .or_default()
            .extend(doc.relationships.iter());
        annotations
            .entry(&doc.id)
            .or_default()
            .extend(doc.annotations.iter());

        {
            let mut sheet = spreadsheet.relationship_sheet();
            for (element_id, rels) in &relationships {
                for relationship in rels {
                    sheet.add(relationship, element_id);
                }
            }
        }
        {
            let mut sheet = spreadsheet.annotation_sheet();
            for (element_id, anns) in &annotations {
                for annotation in anns {
                    sheet.add(annotation, element_id);
                }
            }
        }

        if config.style_columns {
            spreadsheet.resize_columns();
        }
        spreadsheet.write(&mut writer, config.format)?;
        writer.flush()?;
        info!(
            packages = packages.len(),
            files = files.len(),
            snippets = snippets.len(),
            "SPDX document serialized"
        );
        Ok(())
    }

    /// 文書とその要素をストアに読み込み、パッケージ・ファイル・スニペットの件数を返す
    fn load_document(
        &mut self,
        spreadsheet: &mut SpdxSpreadsheet,
        namespace: &str,
    ) -> Result<(usize, usize, usize)> {
        let date_format = self.config.date_format.clone();
        let mut doc = spreadsheet.document_sheet().document(&date_format)?;
        doc.annotations
            .extend(spreadsheet.reviewer_sheet().review_annotations(&date_format));
        // ライセンス式が参照するため、他の要素より先に読み込む
        doc.extracted_licenses = spreadsheet.extracted_license_sheet().licenses();
        self.store.put(namespace, doc.into());

        let mut packages = spreadsheet.package_sheet().packages(&date_format)?;
        if spreadsheet.has_snippets_and_external_refs() {
            let sheet = spreadsheet.external_ref_sheet();
            for pkg in &mut packages {
                pkg.external_refs = sheet.external_refs_for(&pkg.id, namespace)?;
            }
        }
        let num_packages = packages.len();
        for pkg in packages {
            self.store.put(namespace, pkg.into());
        }

        let num_files = self.load_files(spreadsheet, namespace)?;
        let num_snippets = if spreadsheet.has_snippets_and_external_refs() {
            self.load_snippets(spreadsheet, namespace)?
        } else {
            0
        };
        self.load_annotations(spreadsheet, namespace)?;
        self.load_relationships(spreadsheet, namespace)?;
        Ok((num_packages, num_files, num_snippets))
    }

    /// 関係シートの各行を主語の要素に追加する
    fn load_relationships(&mut self, spreadsheet: &mut SpdxSpreadsheet, namespace: &str) -> Result<()> {
        let sheet = spreadsheet.relationship_sheet();
        let mut row = sheet.first_data_row();
        while let Some(element_id) = sheet.element_id(row) {
            let Some(relationship) = sheet.relationship(row)? else {
                break;
            };
            row += 1;
            let element_id = element_id.trim();
            let element = self.store.get(namespace, element_id).ok_or_else(|| {
                SpreadsheetError::Format(format!(
                    "Missing SPDX element for relationship: {}",
                    element_id
                ))
            })?;
            if let SpdxElement::Package(pkg) = element {
                if relationship.relationship_type == RelationshipType::CONTAINS
                    && pkg.has_file(&relationship.related_element_id)
                {
                    debug!(
                        package = element_id,
                        file = %relationship.related_element_id,
                        "Skipping duplicate hasFile relationship"
                    );
                    continue;
                }
            }
            let related = relationship.related_element_id.as_str();
            let resolvable = related == NONE_ELEMENT_ID
                || related == NOASSERTION_ELEMENT_ID
                || related.contains(':')
                || self.store.exists(namespace, related);
            if !resolvable {
                return Err(SpreadsheetError::Format(format!(
                    "No element found for relationship with related ID {}",
                    related
                )));
            }
            if let Some(element) = self.store.get_mut(namespace, element_id) {
                element.relationships_mut().push(relationship);
            }
        }
        Ok(())
    }

    /// アノテーションシートの各行を対象の要素に追加する
    fn load_annotations(&mut self, spreadsheet: &mut SpdxSpreadsheet, namespace: &str) -> Result<()> {
        let date_format = &self.config.date_format;
        let sheet = spreadsheet.annotation_sheet();
        let mut row = sheet.first_data_row();
        while let Some(element_id) = sheet.element_id(row) {
            let Some(annotation) = sheet.annotation(row, date_format)? else {
                break;
            };
            let element_id = element_id.trim();
            let element = self.store.get_mut(namespace, element_id).ok_or_else(|| {
                SpreadsheetError::Format(format!(
                    "Missing SPDX element for annotation: {}",
                    element_id
                ))
            })?;
            element.annotations_mut().push(annotation);
            row += 1;
        }
        Ok(())
    }

    fn load_files(&mut self, spreadsheet: &mut SpdxSpreadsheet, namespace: &str) -> Result<usize> {
        let mut sheet = spreadsheet.file_sheet();
        let mut count = 0;
        for row in sheet.data_rows() {
            let Some(file) = sheet.get_file_info(row, &mut self.store, namespace)? else {
                continue;
            };
            for package_id in sheet.package_ids(row) {
                match self.store.package_mut(namespace, &package_id) {
                    Some(pkg) => {
                        if !pkg.has_file(&file.id) {
                            pkg.files.push(file.id.clone());
                        }
                    }
                    None => warn!(
                        file = %file.name,
                        package = %package_id,
                        "Can not add file {} to package {}",
                        file.name,
                        package_id
                    ),
                }
            }
            self.store.put(namespace, file.into());
            count += 1;
        }
        Ok(count)
    }

    fn load_snippets(&mut self, spreadsheet: &mut SpdxSpreadsheet, namespace: &str) -> Result<usize> {
        let mut sheet = spreadsheet.snippet_sheet();
        let mut row = sheet.first_data_row();
        let mut count = 0;
        while let Some(snippet) = sheet.get_snippet(row, &mut self.store, namespace)? {
            self.store.put(namespace, snippet.into());
            row += 1;
            count += 1;
        }
        Ok(count)
    }
}

impl<S: ModelStore> SerializableStore for SpreadsheetStore<S> {
    fn serialize<W: Write>(&self, writer: W) -> Result<()> {
        let namespaces = self.store.document_namespaces();
        match namespaces.as_slice() {
            [namespace] => self.serialize_document(namespace, writer),
            [] => Err(SpreadsheetError::Format(
                "No SPDX documents to serialize".to_string(),
            )),
            _ => Err(SpreadsheetError::Format(
                "Ambiguous document to stream - spreadsheet store should only contain one SPDX document"
                    .to_string(),
            )),
        }
    }

    #[instrument(skip(self, reader))]
    fn deserialize<R: Read>(&mut self, reader: R, overwrite: bool) -> Result<String> {
        let mut spreadsheet = SpdxSpreadsheet::open_with(reader, &self.config.security)?;
        spreadsheet.verify()?;
        let namespace = spreadsheet
            .document_uri()
            .map(String::from)
            .ok_or_else(|| SpreadsheetError::Format("Missing document namespace".to_string()))?;
        info!(namespace = %namespace, version = %spreadsheet.version(), "deserializing SPDX spreadsheet");

        if self.store.exists(&namespace, SPDX_DOCUMENT_ID) {
            if !overwrite {
                return Err(SpreadsheetError::Format(format!(
                    "Document {} already exists.",
                    namespace
                )));
            }
            debug!(namespace = %namespace, "clearing existing document");
            self.store.clear(&namespace);
        }

        // 途中で失敗した場合は読み込み途中の要素を残さない
        let (num_packages, num_files, num_snippets) =
            match self.load_document(&mut spreadsheet, &namespace) {
                Ok(counts) => counts,
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "discarding partially loaded document");
                    self.store.clear(&namespace);
                    return Err(e);
                }
            };

        info!(
            namespace = %namespace,
            packages = num_packages,
            files = num_files,
            snippets = num_snippets,
            "SPDX spreadsheet deserialized"
        );
        Ok(namespace)
    }
}
