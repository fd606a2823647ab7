//! Relationships Sheet

use crate::error::{Result, SpreadsheetError};
use crate::grid::Workbook;
use crate::model::{Relationship, RelationshipType};

use super::{Column, Schema, SheetBase, Trailer, REQUIRED, WRAP};

const LABEL: &str = "Relationship";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelField {
    ElementId,
    Type,
    RelatedId,
    Comment,
}

static COLUMNS: [Column<RelField>; 4] = [
    Column::new(RelField::ElementId, "SPDX Identifier A", 20.0, REQUIRED),
    Column::new(RelField::Type, "Relationship", 25.0, REQUIRED),
    Column::new(RelField::RelatedId, "SPDX Identifier B", 20.0, REQUIRED),
    Column::new(RelField::Comment, "Relationship Comment", 70.0, WRAP),
];

static SCHEMA: Schema<RelField> = Schema {
    columns: &COLUMNS,
    trailer: Some(Trailer {
        title: "Optional User Defined Columns...",
        width: 50.0,
    }),
};

fn col(field: RelField) -> u32 {
    SCHEMA.col(field).unwrap_or(0)
}

pub(crate) struct RelationshipSheet<'a> {
    base: SheetBase<'a>,
}

impl<'a> RelationshipSheet<'a> {
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
            return Err(self.base.missing("Relationships"));
        }
        SCHEMA.verify_header(&self.base, LABEL)?;
        for row in self.base.data_rows() {
            SCHEMA.check_required(&self.base, row, " in relationships sheet")?;
            if let Some(value) = self.base.text(row, col(RelField::Type)) {
                if value.trim().parse::<RelationshipType>().is_err() {
                    return Err(SpreadsheetError::invalid(
                        &self.base.name,
                        row,
                        format!("Invalid relationship type in row {}: {}", row, value),
                    ));
                }
            }
        }
        Ok(())
    }

    /// 関係を1行追加（`element_id`は関係の主語）
    pub fn add(&mut self, relationship: &Relationship, element_id: &str) {
        let row = self.base.add_row();
        self.base.set(row, col(RelField::ElementId), element_id);
        self.base
            .set(row, col(RelField::Type), relationship.relationship_type.as_str());
        self.base.set(
            row,
            col(RelField::RelatedId),
            relationship.related_element_id.as_str(),
        );
        self.base.set_opt(
            row,
            Some(col(RelField::Comment)),
            relationship.comment.as_deref(),
        );
    }

    /// 主語の要素ID（行が存在しない場合は`None`）
    pub fn element_id(&self, row: u32) -> Option<String> {
        self.base.text(row, col(RelField::ElementId))
    }

    pub fn relationship(&self, row: u32) -> Result<Option<Relationship>> {
        if !self.base.row_exists(row) {
            return Ok(None);
        }
        let relationship_type = match self.base.text(row, col(RelField::Type)) {
            Some(value) => value.trim().parse::<RelationshipType>().map_err(|_| {
                SpreadsheetError::Format(format!("Invalid relationship type: {}", value.trim()))
            })?,
            None => {
                return Err(SpreadsheetError::Format(
                    "Missing relationship type".to_string(),
                ))
            }
        };
        let related_id = self
            .base
            .text(row, col(RelField::RelatedId))
            .ok_or_else(|| {
                SpreadsheetError::Format("No related element ID for relationship".to_string())
            })?;
        Ok(Some(Relationship {
            relationship_type,
            related_element_id: related_id.trim().to_string(),
            comment: self.base.text(row, col(RelField::Comment)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    const NAME: &str = "Relationships";

    #[test]
    fn test_add_and_get() {
        let mut wb = Workbook::new();
        RelationshipSheet::create(&mut wb, NAME, true);
        {
            let mut sheet = RelationshipSheet::open(&mut wb, NAME);
            sheet.add(
                &Relationship::new(RelationshipType::CONTAINS, "SPDXRef-file")
                    .with_comment("pkg contains file"),
                "SPDXRef-pkg",
            );
            sheet.add(
                &Relationship::new(RelationshipType::DESCRIBES, "SPDXRef-pkg"),
                "SPDXRef-DOCUMENT",
            );
        }
        let sheet = RelationshipSheet::open(&mut wb, NAME);
        assert!(sheet.verify().is_ok());
        assert_eq!(sheet.element_id(1).as_deref(), Some("SPDXRef-pkg"));
        let rel = sheet.relationship(1).unwrap().unwrap();
        assert_eq!(rel.relationship_type, RelationshipType::CONTAINS);
        assert_eq!(rel.comment.as_deref(), Some("pkg contains file"));
        assert_eq!(
            sheet.relationship(2).unwrap().unwrap().comment,
            None
        );
        // 行が存在しなければ終端
        assert!(sheet.relationship(3).unwrap().is_none());
    }

    #[test]
    fn test_invalid_type() {
        let mut wb = Workbook::new();
        RelationshipSheet::create(&mut wb, NAME, false);
        RelationshipSheet::open(&mut wb, NAME).add(
            &Relationship::new(RelationshipType::OTHER, "SPDXRef-b"),
            "SPDXRef-a",
        );
        wb.sheet_mut(NAME)
            .unwrap()
            .set(1, 1, CellValue::from("IS_FRIEND_OF"));
        let sheet = RelationshipSheet::open(&mut wb, NAME);
        let err = sheet.verify().unwrap_err();
        assert!(err
            .to_string()
            .ends_with("Invalid relationship type in row 1: IS_FRIEND_OF"));
        let err = sheet.relationship(1).unwrap_err();
        assert_eq!(err.to_string(), "Invalid relationship type: IS_FRIEND_OF");
    }

    #[test]
    fn test_missing_required_cell() {
        let mut wb = Workbook::new();
        RelationshipSheet::create(&mut wb, NAME, false);
        wb.sheet_mut(NAME)
            .unwrap()
            .set(1, 0, CellValue::from("SPDXRef-a"));
        let err = RelationshipSheet::open(&mut wb, NAME).verify().unwrap_err();
        assert!(err
            .to_string()
            .ends_with("Required cell Relationship missing for row 1 in relationships sheet"));
    }
}
