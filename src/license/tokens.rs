//! LicenseToken Module
//!
//! SPDXライセンス式のトークン定義と字句解析を提供します。

use crate::error::{Result, SpreadsheetError};

/// ライセンス式のトークン
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LicenseToken {
    /// 開き括弧
    LeftParen,

    /// 閉じ括弧
    RightParen,

    /// `AND`演算子（大文字小文字を区別しない）
    And,

    /// `OR`演算子（大文字小文字を区別しない）
    Or,

    /// `WITH`演算子（大文字小文字を区別しない）
    With,

    /// ライセンスID・例外ID（例: "MIT", "GPL-2.0+", "LicenseRef-1"）
    Identifier(String),
}

impl LicenseToken {
    /// トークンが二項演算子かどうかを判定
    pub fn is_operator(&self) -> bool {
        matches!(self, LicenseToken::And | LicenseToken::Or | LicenseToken::With)
    }
}

/// IDとして許可する文字かどうか
fn is_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '+' | ':' | '_')
}

/// ライセンス式をトークン列に分解
///
/// # 引数
///
/// * `expression` - ライセンス式文字列
///
/// # 戻り値
///
/// * `Ok(Vec<LicenseToken>)` - トークン列
/// * `Err(SpreadsheetError)` - IDに使用できない文字が含まれる場合
pub(crate) fn tokenize(expression: &str) -> Result<Vec<LicenseToken>> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, tokens: &mut Vec<LicenseToken>| {
        if current.is_empty() {
            return;
        }
        let word = std::mem::take(current);
        let token = if word.eq_ignore_ascii_case("AND") {
            LicenseToken::And
        } else if word.eq_ignore_ascii_case("OR") {
            LicenseToken::Or
        } else if word.eq_ignore_ascii_case("WITH") {
            LicenseToken::With
        } else {
            LicenseToken::Identifier(word)
        };
        tokens.push(token);
    };

    for ch in expression.chars() {
        match ch {
            '(' => {
                flush(&mut current, &mut tokens);
                tokens.push(LicenseToken::LeftParen);
            }
            ')' => {
                flush(&mut current, &mut tokens);
                tokens.push(LicenseToken::RightParen);
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c if is_id_char(c) => current.push(c),
            c => {
                return Err(SpreadsheetError::Format(format!(
                    "Invalid character '{}' in license expression: {}",
                    c, expression
                )))
            }
        }
    }
    flush(&mut current, &mut tokens);

    Ok(tokens)
}
