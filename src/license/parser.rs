//! LicenseParser Module
//!
//! SPDXライセンス式の構文解析を提供します。
//!
//! 文法（優先順位は `WITH` > `AND` > `OR`）:
//!
//! ```text
//! or_expr   := and_expr ("OR" and_expr)*
//! and_expr  := with_expr ("AND" with_expr)*
//! with_expr := primary ("WITH" identifier)?
//! primary   := "(" or_expr ")" | identifier
//! ```

use crate::error::{Result, SpreadsheetError};

use super::tokens::{tokenize, LicenseToken};
use super::AnyLicenseInfo;

/// 再帰下降パーサー
pub(crate) struct LicenseParser {
    /// 元の式（エラーメッセージ用）
    expression: String,

    /// トークン列
    tokens: Vec<LicenseToken>,

    /// 現在位置
    pos: usize,
}

impl LicenseParser {
    /// ライセンス式をパース
    ///
    /// # 引数
    ///
    /// * `expression` - ライセンス式文字列
    ///
    /// # 戻り値
    ///
    /// * `Ok(AnyLicenseInfo)` - パース成功
    /// * `Err(SpreadsheetError)` - 構文エラー
    pub fn parse(expression: &str) -> Result<AnyLicenseInfo> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(SpreadsheetError::Format(
                "Empty license expression".to_string(),
            ));
        }
        let mut parser = Self {
            expression: expression.to_string(),
            tokens,
            pos: 0,
        };
        let result = parser.parse_or()?;
        if parser.pos < parser.tokens.len() {
            return Err(parser.error("unexpected trailing tokens"));
        }
        Ok(result)
    }

    fn peek(&self) -> Option<&LicenseToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<LicenseToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: &str) -> SpreadsheetError {
        SpreadsheetError::Format(format!(
            "Invalid license expression '{}': {}",
            self.expression, message
        ))
    }

    fn parse_or(&mut self) -> Result<AnyLicenseInfo> {
        let mut members = vec![self.parse_and()?];
        while self.peek() == Some(&LicenseToken::Or) {
            self.pos += 1;
            members.push(self.parse_and()?);
        }
        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(AnyLicenseInfo::Disjunctive(members))
        }
    }

    fn parse_and(&mut self) -> Result<AnyLicenseInfo> {
        let mut members = vec![self.parse_with()?];
        while self.peek() == Some(&LicenseToken::And) {
            self.pos += 1;
            members.push(self.parse_with()?);
        }
        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(AnyLicenseInfo::Conjunctive(members))
        }
    }

    fn parse_with(&mut self) -> Result<AnyLicenseInfo> {
        let license = self.parse_primary()?;
        if self.peek() != Some(&LicenseToken::With) {
            return Ok(license);
        }
        self.pos += 1;
        if !matches!(
            license,
            AnyLicenseInfo::Listed(_) | AnyLicenseInfo::OrLater(_) | AnyLicenseInfo::ExtractedRef(_)
        ) {
            return Err(self.error("WITH must follow a simple license"));
        }
        match self.next() {
            Some(LicenseToken::Identifier(exception)) => Ok(AnyLicenseInfo::WithException {
                license: Box::new(license),
                exception,
            }),
            _ => Err(self.error("missing exception after WITH")),
        }
    }

    fn parse_primary(&mut self) -> Result<AnyLicenseInfo> {
        match self.next() {
            Some(LicenseToken::LeftParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(LicenseToken::RightParen) => Ok(inner),
                    _ => Err(self.error("missing closing parenthesis")),
                }
            }
            Some(LicenseToken::Identifier(id)) => Ok(simple_license(&id)),
            Some(token) if token.is_operator() => Err(self.error("operator without operand")),
            Some(_) => Err(self.error("unexpected closing parenthesis")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// 単一のIDをライセンスに変換
fn simple_license(id: &str) -> AnyLicenseInfo {
    if id.eq_ignore_ascii_case("NONE") {
        AnyLicenseInfo::None
    } else if id.eq_ignore_ascii_case("NOASSERTION") {
        AnyLicenseInfo::NoAssertion
    } else if is_extracted_ref(id) {
        AnyLicenseInfo::ExtractedRef(id.to_string())
    } else if let Some(base) = id.strip_suffix('+') {
        AnyLicenseInfo::OrLater(base.to_string())
    } else {
        AnyLicenseInfo::Listed(id.to_string())
    }
}

/// `LicenseRef-`または`DocumentRef-x:LicenseRef-`で始まるIDか
pub(crate) fn is_extracted_ref(id: &str) -> bool {
    if id.starts_with("LicenseRef-") {
        return true;
    }
    match id.split_once(':') {
        Some((doc, license)) => doc.starts_with("DocumentRef-") && license.starts_with("LicenseRef-"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(id: &str) -> AnyLicenseInfo {
        AnyLicenseInfo::Listed(id.to_string())
    }

    #[test]
    fn test_parse_single() {
        assert_eq!(LicenseParser::parse("MIT").unwrap(), listed("MIT"));
        assert_eq!(LicenseParser::parse("NOASSERTION").unwrap(), AnyLicenseInfo::NoAssertion);
        assert_eq!(LicenseParser::parse("NONE").unwrap(), AnyLicenseInfo::None);
        assert_eq!(
            LicenseParser::parse("GPL-2.0+").unwrap(),
            AnyLicenseInfo::OrLater("GPL-2.0".to_string())
        );
        assert_eq!(
            LicenseParser::parse("LicenseRef-3").unwrap(),
            AnyLicenseInfo::ExtractedRef("LicenseRef-3".to_string())
        );
    }

    // ANDはORより優先される
    #[test]
    fn test_precedence() {
        let parsed = LicenseParser::parse("A OR B AND C").unwrap();
        assert_eq!(
            parsed,
            AnyLicenseInfo::Disjunctive(vec![
                listed("A"),
                AnyLicenseInfo::Conjunctive(vec![listed("B"), listed("C")]),
            ])
        );
    }

    // 同じ演算子の連続は1つの集合になる
    #[test]
    fn test_flatten_chain() {
        let parsed = LicenseParser::parse("A AND B AND C").unwrap();
        assert_eq!(
            parsed,
            AnyLicenseInfo::Conjunctive(vec![listed("A"), listed("B"), listed("C")])
        );
    }

    #[test]
    fn test_with_exception() {
        let parsed = LicenseParser::parse("GPL-2.0-only WITH Classpath-exception-2.0 OR MIT").unwrap();
        assert_eq!(
            parsed,
            AnyLicenseInfo::Disjunctive(vec![
                AnyLicenseInfo::WithException {
                    license: Box::new(listed("GPL-2.0-only")),
                    exception: "Classpath-exception-2.0".to_string(),
                },
                listed("MIT"),
            ])
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(LicenseParser::parse("").is_err());
        assert!(LicenseParser::parse("(MIT").is_err());
        assert!(LicenseParser::parse("MIT)").is_err());
        assert!(LicenseParser::parse("MIT AND").is_err());
        assert!(LicenseParser::parse("AND MIT").is_err());
        assert!(LicenseParser::parse("MIT WITH").is_err());
        assert!(LicenseParser::parse("(A OR B) WITH C").is_err());
        assert!(LicenseParser::parse("MIT GPL").is_err());
    }

    #[test]
    fn test_is_extracted_ref() {
        assert!(is_extracted_ref("LicenseRef-1"));
        assert!(is_extracted_ref("DocumentRef-doc:LicenseRef-1"));
        assert!(!is_extracted_ref("DocumentRef-doc:MIT"));
        assert!(!is_extracted_ref("MIT"));
    }
}
