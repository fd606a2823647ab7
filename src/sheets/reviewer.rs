//! Reviewers Sheet
//!
//! SPDX 2.0より前のワークブックにのみ存在するレビュー担当者シート。
//! 書き込み時には作成せず、読み込み時に`REVIEW`アノテーションへ移行します。

use chrono::{NaiveDateTime, Utc};

use crate::api::DateFormat;
use crate::codec::format_date;
use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::model::{Annotation, AnnotationType};
use crate::types::{serial_to_datetime, CellValue};

use super::{Column, Schema, SheetBase, REQUIRED, WRAP};

const LABEL: &str = "SPDX Reviewers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReviewField {
    Reviewer,
    Date,
    Comment,
}

static COLUMNS: [Column<ReviewField>; 3] = [
    Column::new(ReviewField::Reviewer, "Reviewer", 60.0, REQUIRED | WRAP),
    Column::new(ReviewField::Date, "Review Date", 20.0, REQUIRED),
    Column::new(ReviewField::Comment, "Reviewer Comment", 120.0, WRAP),
];

static SCHEMA: Schema<ReviewField> = Schema {
    columns: &COLUMNS,
    trailer: None,
};

fn col(field: ReviewField) -> u32 {
    SCHEMA.col(field).unwrap_or(0)
}

pub(crate) struct ReviewerSheet<'a> {
    base: SheetBase<'a>,
}

impl<'a> ReviewerSheet<'a> {
    pub fn open(workbook: &'a mut Workbook, name: &str) -> Self {
        Self {
            base: SheetBase::open(workbook, name),
        }
    }

    #[cfg(test)]
    pub fn create(workbook: &mut Workbook, name: &str, styled: bool) {
        SCHEMA.create(workbook, name, styled);
    }

    pub fn exists(&self) -> bool {
        self.base.exists()
    }

    pub fn verify(&self) -> Result<()> {
        if !self.base.exists() {
            return Err(self.base.missing(LABEL));
        }
        SCHEMA.verify_header(&self.base, LABEL)?;
        for row in self.base.data_rows() {
            SCHEMA.check_required(&self.base, row, " in reviewer sheet")?;
            if review_date(self.base.cell(row, col(ReviewField::Date))).is_none() {
                return Err(SpreadsheetError::invalid(
                    &self.base.name,
                    row,
                    format!(
                        "Timestamp cell is not a numeric type for row {} in Reviewer sheet",
                        row
                    ),
                ));
            }
        }
        Ok(())
    }

    /// 各行を`REVIEW`アノテーションに変換
    ///
    /// レビュー担当者が空の行で終了します。日付セルがない行は現在時刻を使用します。
    ///
    /// # 引数
    ///
    /// * `date_format` - アノテーション日付の書式
    ///
    /// # 戻り値
    ///
    /// シートの行順のアノテーション
    pub fn review_annotations(&self, date_format: &DateFormat) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        let mut row = self.base.first_data_row();
        while let Some(reviewer) = self.base.text(row, col(ReviewField::Reviewer)) {
            let date = review_date(self.base.cell(row, col(ReviewField::Date)))
                .unwrap_or_else(|| Utc::now().naive_utc());
            annotations.push(Annotation {
                annotator: reviewer,
                annotation_type: AnnotationType::REVIEW,
                date: format_date(&date, date_format),
                comment: self
                    .base
                    .text(row, col(ReviewField::Comment))
                    .unwrap_or_default(),
            });
            row += 1;
        }
        annotations
    }
}

fn review_date(cell: Option<&CellValue>) -> Option<NaiveDateTime> {
    match cell? {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(serial) => serial_to_datetime(*serial),
        _ => None,
    }
}
