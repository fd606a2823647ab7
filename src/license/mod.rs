//! License Expression Module
//!
//! SPDXライセンス式の内部表現と、文字列との相互変換を提供するモジュール。
//!
//! - `tokens`: 字句解析
//! - `parser`: 再帰下降による構文解析
//!
//! 書式化の規則: 集合（`AND` / `OR`）は常に括弧で囲むため、
//! `parse(format(x)) == x`が成り立ちます。

mod parser;
mod tokens;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpreadsheetError};

use parser::LicenseParser;

/// ライセンス情報（ライセンス式の構文木）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnyLicenseInfo {
    /// `NONE`
    None,
    /// `NOASSERTION`
    NoAssertion,
    /// SPDXライセンスリストのID（例: `MIT`）
    Listed(String),
    /// `+`付きのID（例: `GPL-2.0+`）。値には`+`を含まない
    OrLater(String),
    /// 抽出ライセンスへの参照（`LicenseRef-`）
    ExtractedRef(String),
    /// `<license> WITH <exception>`
    WithException {
        license: Box<AnyLicenseInfo>,
        exception: String,
    },
    /// `AND`集合
    Conjunctive(Vec<AnyLicenseInfo>),
    /// `OR`集合
    Disjunctive(Vec<AnyLicenseInfo>),
}

impl AnyLicenseInfo {
    /// ライセンス式をパース
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use spdx_spreadsheet::AnyLicenseInfo;
    ///
    /// let license = AnyLicenseInfo::parse("(LicenseRef-3 OR LGPL-2.0-only)").unwrap();
    /// assert_eq!(license.to_string(), "(LicenseRef-3 OR LGPL-2.0-only)");
    /// ```
    pub fn parse(expression: &str) -> Result<Self> {
        LicenseParser::parse(expression)
    }

    /// 式中で参照されている抽出ライセンスIDを列挙
    pub fn extracted_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            AnyLicenseInfo::ExtractedRef(id) => refs.push(id),
            AnyLicenseInfo::WithException { license, .. } => license.collect_refs(refs),
            AnyLicenseInfo::Conjunctive(members) | AnyLicenseInfo::Disjunctive(members) => {
                for member in members {
                    member.collect_refs(refs);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for AnyLicenseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyLicenseInfo::None => write!(f, "NONE"),
            AnyLicenseInfo::NoAssertion => write!(f, "NOASSERTION"),
            AnyLicenseInfo::Listed(id) | AnyLicenseInfo::ExtractedRef(id) => write!(f, "{}", id),
            AnyLicenseInfo::OrLater(id) => write!(f, "{}+", id),
            AnyLicenseInfo::WithException { license, exception } => {
                write!(f, "{} WITH {}", license, exception)
            }
            AnyLicenseInfo::Conjunctive(members) => write_set(f, members, "AND"),
            AnyLicenseInfo::Disjunctive(members) => write_set(f, members, "OR"),
        }
    }
}

fn write_set(f: &mut fmt::Formatter<'_>, members: &[AnyLicenseInfo], op: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", member)?;
    }
    write!(f, ")")
}

impl FromStr for AnyLicenseInfo {
    type Err = SpreadsheetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// カンマ区切りのライセンス式リストをパース
///
/// 空文字列は空のリストになります。
pub fn parse_license_list(value: &str) -> Result<Vec<AnyLicenseInfo>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AnyLicenseInfo::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_display_sets_parenthesized() {
        let license = AnyLicenseInfo::Conjunctive(vec![
            AnyLicenseInfo::Listed("A".into()),
            AnyLicenseInfo::Disjunctive(vec![
                AnyLicenseInfo::Listed("B".into()),
                AnyLicenseInfo::OrLater("C".into()),
            ]),
        ]);
        assert_eq!(license.to_string(), "(A AND (B OR C+))");
        assert_eq!(AnyLicenseInfo::parse(&license.to_string()).unwrap(), license);
    }

    #[test]
    fn test_scenario_expression() {
        let text = "(LicenseRef-3 OR LGPL-2.0-only)";
        let license: AnyLicenseInfo = text.parse().unwrap();
        assert_eq!(license.to_string(), text);
        assert_eq!(license.extracted_refs(), vec!["LicenseRef-3"]);
    }

    #[test]
    fn test_parse_license_list() {
        let list = parse_license_list("MIT, LicenseRef-1,GPL-2.0+").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2], AnyLicenseInfo::OrLater("GPL-2.0".into()));
        assert!(parse_license_list("").unwrap().is_empty());
        assert!(parse_license_list("MIT, (bad").is_err());
    }

    fn arb_license() -> impl Strategy<Value = AnyLicenseInfo> {
        let leaf = prop_oneof![
            Just(AnyLicenseInfo::NoAssertion),
            "[A-Z][A-Za-z0-9.]{0,6}".prop_map(AnyLicenseInfo::Listed),
            "[A-Z][A-Za-z0-9.]{0,6}".prop_map(AnyLicenseInfo::OrLater),
            "[0-9a-z]{1,4}".prop_map(|s| AnyLicenseInfo::ExtractedRef(format!("LicenseRef-{}", s))),
            ("[A-Z][a-z]{0,6}", "[A-Z][a-z]{0,6}").prop_map(|(l, e)| {
                AnyLicenseInfo::WithException {
                    license: Box::new(AnyLicenseInfo::Listed(format!("L{}", l))),
                    exception: format!("E{}", e),
                }
            }),
        ];
        // 演算子と衝突するIDを避けるため、先頭に固定の文字を付けている
        let leaf = leaf.prop_map(|l| match l {
            AnyLicenseInfo::Listed(id) => AnyLicenseInfo::Listed(format!("X{}", id)),
            AnyLicenseInfo::OrLater(id) => AnyLicenseInfo::OrLater(format!("Y{}", id)),
            other => other,
        });
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 2..4).prop_map(AnyLicenseInfo::Conjunctive),
                prop::collection::vec(inner, 2..4).prop_map(AnyLicenseInfo::Disjunctive),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_format_parse_round_trip(license in arb_license()) {
            let text = license.to_string();
            prop_assert_eq!(AnyLicenseInfo::parse(&text).unwrap(), license);
        }
    }
}
