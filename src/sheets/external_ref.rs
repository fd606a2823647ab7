//! External Refs Sheet
//!
//! パッケージの外部参照を1行1件で保持します（SPDX 2.1以降）。
//!
//! Type列は参照タイプURIの短縮表記です。
//!
//! - 登録済みタイプは登録名（例: `cpe23Type`）
//! - 文書名前空間配下のタイプは`#`以降のローカル名
//! - それ以外はURIそのもの

use tracing::warn;

use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::model::{
    listed_reference_name, listed_reference_uri, ExternalRef, ReferenceCategory,
    NO_REFERENCE_TYPE,
};

use super::{Column, Schema, SheetBase, Trailer, REQUIRED, WRAP};

const LABEL: &str = "External Refs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefField {
    PackageId,
    Category,
    Type,
    Locator,
    Comment,
}

static COLUMNS: [Column<RefField>; 5] = [
    Column::new(RefField::PackageId, "Package ID", 25.0, REQUIRED),
    Column::new(RefField::Category, "Category", 25.0, REQUIRED),
    Column::new(RefField::Type, "Type", 40.0, REQUIRED | WRAP),
    Column::new(RefField::Locator, "Locator", 60.0, REQUIRED | WRAP),
    Column::new(RefField::Comment, "Comment", 40.0, WRAP),
];

static SCHEMA: Schema<RefField> = Schema {
    columns: &COLUMNS,
    trailer: Some(Trailer {
        title: "User Defined ...",
        width: 40.0,
    }),
};

fn col(field: RefField) -> u32 {
    SCHEMA.col(field).unwrap_or(0)
}

/// 外部参照シート
pub(crate) struct ExternalRefSheet<'a> {
    base: SheetBase<'a>,
}

impl<'a> ExternalRefSheet<'a> {
    pub fn open(workbook: &'a mut Workbook, name: &str) -> Self {
        Self {
            base: SheetBase::open(workbook, name),
        }
    }

    pub fn create(workbook: &mut Workbook, name: &str, styled: bool) {
        SCHEMA.create(workbook, name, styled);
    }

    pub fn verify(&self) -> Result<()> {
        if !self.base.exists() {
            return Err(self.base.missing(LABEL));
        }
        SCHEMA.verify_header(&self.base, LABEL)?;
        for row in self.base.data_rows() {
            SCHEMA.check_required(&self.base, row, "")?;
        }
        Ok(())
    }

    /// 外部参照を1行追加
    ///
    /// # 引数
    ///
    /// * `package_id` - 参照を持つパッケージのID
    /// * `external_ref` - 書き込む外部参照
    /// * `document_uri` - 文書名前空間（Type列の短縮に使用）
    pub fn add(&mut self, package_id: &str, external_ref: &ExternalRef, document_uri: &str) {
        let row = self.base.add_row();
        self.base.set(row, col(RefField::PackageId), package_id);
        self.base
            .set(row, col(RefField::Category), external_ref.category.as_str());
        self.base.set(
            row,
            col(RefField::Type),
            type_to_cell(external_ref.reference_type.as_deref(), document_uri),
        );
        self.base
            .set(row, col(RefField::Locator), external_ref.locator.as_str());
        self.base.set_opt(
            row,
            Some(col(RefField::Comment)),
            external_ref.comment.as_deref(),
        );
    }

    /// パッケージIDに一致する全行の外部参照を取得
    ///
    /// Package IDの比較は前後の空白を除いて行います。
    pub fn external_refs_for(&self, package_id: &str, document_uri: &str) -> Result<Vec<ExternalRef>> {
        let mut refs = Vec::new();
        for row in self.base.data_rows() {
            let matches = self
                .base
                .text(row, col(RefField::PackageId))
                .map(|id| id.trim() == package_id)
                .unwrap_or(false);
            if matches {
                refs.push(self.external_ref(row, document_uri)?);
            }
        }
        Ok(refs)
    }

    fn external_ref(&self, row: u32, document_uri: &str) -> Result<ExternalRef> {
        let raw_category = self
            .base
            .text(row, col(RefField::Category))
            .unwrap_or_default();
        // 旧形式はハイフン区切り（PACKAGE-MANAGER）
        let category = raw_category
            .trim()
            .replace('-', "_")
            .parse::<ReferenceCategory>()
            .map_err(|_| {
                SpreadsheetError::Format(format!("Invalid reference category: {}", raw_category))
            })?;
        let reference_type = self
            .base
            .text(row, col(RefField::Type))
            .and_then(|t| cell_to_type(t.trim(), document_uri));
        Ok(ExternalRef {
            category,
            reference_type,
            locator: self
                .base
                .text(row, col(RefField::Locator))
                .unwrap_or_default(),
            comment: self.base.text(row, col(RefField::Comment)),
        })
    }
}

fn type_to_cell(reference_type: Option<&str>, document_uri: &str) -> String {
    let Some(uri) = reference_type else {
        return NO_REFERENCE_TYPE.to_string();
    };
    if let Some(name) = listed_reference_name(uri) {
        return name.to_string();
    }
    let local_prefix = format!("{}#", document_uri);
    uri.strip_prefix(&local_prefix).unwrap_or(uri).to_string()
}

fn cell_to_type(value: &str, document_uri: &str) -> Option<String> {
    if value.is_empty() || value == NO_REFERENCE_TYPE {
        return None;
    }
    if let Some(uri) = listed_reference_uri(value) {
        return Some(uri);
    }
    if !value.contains(':') && !value.contains('/') {
        warn!(
            reference_type = value,
            "unlisted external reference type resolved against the document namespace"
        );
        return Some(format!("{}#{}", document_uri, value));
    }
    Some(value.to_string())
}
