//! Extracted License Info Sheet

use std::cmp::Ordering;

use crate::codec::{truncate_extracted_text, MAX_EXTRACTED_TEXT_SIZE};
use crate::error::Result;
use crate::grid::Workbook;
use crate::model::ExtractedLicenseInfo;

use super::{Column, Schema, SheetBase, Trailer, PLAIN, REQUIRED, WRAP};

const LABEL: &str = "non-standard Licenses";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LicField {
    Id,
    Text,
    Name,
    CrossRefUrls,
    Comment,
}

static COLUMNS: [Column<LicField>; 5] = [
    Column::new(LicField::Id, "Identifier", 15.0, REQUIRED),
    Column::new(LicField::Text, "Extracted Text", 120.0, REQUIRED),
    Column::new(LicField::Name, "License Name", 50.0, PLAIN),
    Column::new(LicField::CrossRefUrls, "Cross Reference URLs", 80.0, WRAP),
    Column::new(LicField::Comment, "Comment", 80.0, WRAP),
];

static SCHEMA: Schema<LicField> = Schema {
    columns: &COLUMNS,
    trailer: Some(Trailer {
        title: "User Defined Columns...",
        width: 50.0,
    }),
};

fn col(field: LicField) -> u32 {
    SCHEMA.col(field).unwrap_or(0)
}

/// 抽出ライセンスシート
pub(crate) struct ExtractedLicenseSheet<'a> {
    base: SheetBase<'a>,
}

impl<'a> ExtractedLicenseSheet<'a> {
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

    /// ライセンスを名前順（大文字小文字を区別しない、名前なしが先頭）、
    /// 次にID順で書き込む
    pub fn add_all(&mut self, licenses: &[ExtractedLicenseInfo]) {
        let mut sorted: Vec<&ExtractedLicenseInfo> = licenses.iter().collect();
        sorted.sort_by(|a, b| compare_licenses(a, b));
        for license in sorted {
            self.add(license);
        }
    }

    /// ライセンスを1行追加
    ///
    /// 抽出テキストが上限を超える場合は切り詰め、警告の接頭辞を付けます。
    pub fn add(&mut self, license: &ExtractedLicenseInfo) {
        let max = MAX_EXTRACTED_TEXT_SIZE.min(self.base.max_chars());
        let row = self.base.add_row();
        self.base.set(row, col(LicField::Id), license.license_id.as_str());
        self.base.set(
            row,
            col(LicField::Text),
            truncate_extracted_text(&license.extracted_text, max),
        );
        self.base
            .set_opt(row, Some(col(LicField::Name)), license.name.as_deref());
        if !license.see_also.is_empty() {
            self.base
                .set(row, col(LicField::CrossRefUrls), license.see_also.join(", "));
        }
        self.base
            .set_opt(row, Some(col(LicField::Comment)), license.comment.as_deref());
    }

    /// 全データ行のライセンス
    pub fn licenses(&self) -> Vec<ExtractedLicenseInfo> {
        self.base
            .data_rows()
            .filter_map(|row| self.license(row))
            .collect()
    }

    fn license(&self, row: u32) -> Option<ExtractedLicenseInfo> {
        let id = self.base.text(row, col(LicField::Id))?;
        let text = self.base.text(row, col(LicField::Text)).unwrap_or_default();
        let mut license = ExtractedLicenseInfo::new(id.trim(), text);
        license.name = self.base.text(row, col(LicField::Name));
        license.see_also = self
            .base
            .text(row, col(LicField::CrossRefUrls))
            .map(|urls| {
                urls.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        license.comment = self.base.text(row, col(LicField::Comment));
        Some(license)
    }
}

fn compare_licenses(a: &ExtractedLicenseInfo, b: &ExtractedLicenseInfo) -> Ordering {
    let name_order = match (&a.name, &b.name) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
    };
    name_order.then_with(|| {
        a.license_id
            .to_lowercase()
            .cmp(&b.license_id.to_lowercase())
    })
}
