//! Annotations Sheet
//!
//! 要素ごとのアノテーションを1行1件で保持します。注釈日時は文字列として
//! 書き込みますが、読み込み時は日付セルも受け付けます。

use crate::api::DateFormat;
use crate::codec::format_date;
use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::model::{Annotation, AnnotationType};
use crate::types::CellValue;

use super::{Column, Schema, SheetBase, Trailer, REQUIRED, WRAP};

const LABEL: &str = "Annotation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnnField {
    ElementId,
    Comment,
    Date,
    Annotator,
    Type,
}

static COLUMNS: [Column<AnnField>; 5] = [
    Column::new(AnnField::ElementId, "SPDX Identifier being Annotated", 25.0, REQUIRED),
    Column::new(AnnField::Comment, "Annotation Comment", 70.0, REQUIRED | WRAP),
    Column::new(AnnField::Date, "Annotation Date", 25.0, REQUIRED),
    Column::new(AnnField::Annotator, "Annotator", 60.0, REQUIRED | WRAP),
    Column::new(AnnField::Type, "Annotation Type", 20.0, REQUIRED),
];

static SCHEMA: Schema<AnnField> = Schema {
    columns: &COLUMNS,
    trailer: Some(Trailer {
        title: "Optional User Defined Columns...",
        width: 50.0,
    }),
};

fn col(field: AnnField) -> u32 {
    SCHEMA.col(field).unwrap_or(0)
}

/// アノテーションシート
pub(crate) struct AnnotationSheet<'a> {
    base: SheetBase<'a>,
}

impl<'a> AnnotationSheet<'a> {
    pub fn open(workbook: &'a mut Workbook, name: &str) -> Self {
        Self {
            base: SheetBase::open(workbook, name),
        }
    }

    pub fn create(workbook: &mut Workbook, name: &str, styled: bool) {
        SCHEMA.create(workbook, name, styled);
    }

    pub fn first_data_row(&self) -> u32 {
        self.base.first_data_row()
    }

    pub fn verify(&self) -> Result<()> {
        if !self.base.exists() {
            return Err(self.base.missing("Annotations"));
        }
        SCHEMA.verify_header(&self.base, LABEL)?;
        for row in self.base.data_rows() {
            SCHEMA.check_required(&self.base, row, " in annotation sheet")?;
            if let Some(value) = self.base.text(row, col(AnnField::Type)) {
                if value.trim().parse::<AnnotationType>().is_err() {
                    return Err(SpreadsheetError::invalid(
                        &self.base.name,
                        row,
                        format!("Invalid annotation type in row {}: {}", row, value),
                    ));
                }
            }
        }
        Ok(())
    }

    /// アノテーションを1行追加
    ///
    /// # 引数
    ///
    /// * `annotation` - 書き込むアノテーション
    /// * `element_id` - 注釈対象の要素ID
    pub fn add(&mut self, annotation: &Annotation, element_id: &str) {
        let row = self.base.add_row();
        self.base.set(row, col(AnnField::ElementId), element_id);
        self.base
            .set(row, col(AnnField::Comment), annotation.comment.as_str());
        self.base.set(row, col(AnnField::Date), annotation.date.as_str());
        self.base
            .set(row, col(AnnField::Annotator), annotation.annotator.as_str());
        self.base
            .set(row, col(AnnField::Type), annotation.annotation_type.as_str());
    }

    pub fn element_id(&self, row: u32) -> Option<String> {
        self.base.text(row, col(AnnField::ElementId))
    }

    /// 1行からアノテーションを再構築（行が存在しない場合は`None`）
    pub fn annotation(&self, row: u32, date_format: &DateFormat) -> Result<Option<Annotation>> {
        if !self.base.row_exists(row) {
            return Ok(None);
        }
        let missing = |what: &str| SpreadsheetError::Format(format!("Missing required {}", what));
        let comment = self
            .base
            .cell(row, col(AnnField::Comment))
            .map(|v| v.as_text())
            .ok_or_else(|| missing("annotation comment"))?;
        let date = match self.base.cell(row, col(AnnField::Date)) {
            Some(CellValue::Date(d)) => format_date(d, date_format),
            Some(value) if !value.is_blank() => value.as_text(),
            _ => return Err(missing("annotation date")),
        };
        let annotator = self
            .base
            .cell(row, col(AnnField::Annotator))
            .map(|v| v.as_text())
            .ok_or_else(|| missing("annotator"))?;
        let annotation_type = self
            .base
            .cell(row, col(AnnField::Type))
            .ok_or_else(|| missing("spreadsheet type"))?
            .as_text()
            .trim()
            .parse::<AnnotationType>()
            .map_err(|_| SpreadsheetError::Format("Invalid annotation type".to_string()))?;
        Ok(Some(Annotation {
            annotator,
            annotation_type,
            date,
            comment,
        }))
    }
}
