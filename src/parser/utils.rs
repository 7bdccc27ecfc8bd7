//! 令牌到 AST 的辅助转换

use crate::ast::BinaryOp;
use crate::error::{MilaResult, SourceLocation, syntax_error};
use crate::lexer::Token;

/// 二元运算符令牌映射
pub fn binary_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Div => BinaryOp::Div,
        Token::Mod => BinaryOp::Mod,
        Token::Eq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Le => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::Ge => BinaryOp::Ge,
        Token::And => BinaryOp::And,
        Token::Or => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

/// 数字字面量求值：十进制、&八进制、$十六进制，范围为 32 位无符号
pub fn number_value(text: &str, loc: SourceLocation) -> MilaResult<i64> {
    let (digits, radix) = if let Some(rest) = text.strip_prefix('&') {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix('$') {
        (rest, 16)
    } else {
        (text, 10)
    };
    u32::from_str_radix(digits, radix)
        .map(i64::from)
        .map_err(|_| syntax_error(loc, format!("malformed numeric literal '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOC: SourceLocation = SourceLocation { line: 1, column: 1 };

    #[test]
    fn test_number_radixes() {
        assert_eq!(number_value("42", LOC).unwrap(), 42);
        assert_eq!(number_value("&17", LOC).unwrap(), 15);
        assert_eq!(number_value("$1F", LOC).unwrap(), 31);
        assert_eq!(number_value("$ff", LOC).unwrap(), 255);
    }

    #[test]
    fn test_malformed_numbers() {
        for text in ["12ab", "&8", "$", "&", "99999999999", "1_000"] {
            let err = number_value(text, LOC).unwrap_err();
            assert!(err.is_syntax(), "{} should be rejected", text);
        }
    }
}
