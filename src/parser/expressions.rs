//! 表达式解析
//!
//! 优先级由低到高：逻辑(and/or) → 关系 → 加减 → 乘除模 → 一元 → 原子。
//! 每一层都是左结合：先解析一个更高层的操作数，再折叠同层运算符。

use crate::ast::*;
use crate::error::MilaResult;
use crate::lexer::{Token, TokenSource};
use super::Parser;
use super::utils::{binary_op, number_value};

/// 解析表达式（入口点）
pub fn parse_expression<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<Expr> {
    parse_logical(parser, ctx)
}

/// 折叠一层左结合二元运算
fn fold_binary<S: TokenSource>(
    parser: &mut Parser<S>,
    ctx: &Function,
    ops: &[BinaryOp],
    operand: fn(&mut Parser<S>, &Function) -> MilaResult<Expr>,
) -> MilaResult<Expr> {
    let mut left = operand(parser, ctx)?;
    while let Some(op) = binary_op(&parser.current.token).filter(|op| ops.contains(op)) {
        parser.advance()?;
        let right = operand(parser, ctx)?;
        left = Expr::binary(left, op, right);
    }
    Ok(left)
}

/// 解析 and / or
pub fn parse_logical<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<Expr> {
    fold_binary(parser, ctx, &[BinaryOp::And, BinaryOp::Or], parse_relational)
}

/// 解析关系运算
pub fn parse_relational<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<Expr> {
    fold_binary(
        parser,
        ctx,
        &[BinaryOp::Eq, BinaryOp::Ne, BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge],
        parse_additive,
    )
}

pub fn parse_additive<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<Expr> {
    fold_binary(parser, ctx, &[BinaryOp::Add, BinaryOp::Sub], parse_multiplicative)
}

pub fn parse_multiplicative<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<Expr> {
    fold_binary(parser, ctx, &[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Mod], parse_factor)
}

/// 解析原子与一元运算
pub fn parse_factor<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<Expr> {
    match parser.current.token.clone() {
        Token::Number(text) => {
            let loc = parser.current_loc();
            parser.advance()?;
            Ok(Expr::Literal(number_value(&text, loc)?))
        }
        Token::LParen => {
            parser.advance()?;
            let expr = parse_expression(parser, ctx)?;
            if !parser.check(&Token::RParen) {
                return Err(parser.error("unbalanced parentheses"));
            }
            parser.advance()?;
            Ok(expr)
        }
        Token::Minus => {
            parser.advance()?;
            Ok(Expr::unary(UnaryOp::Minus, parse_factor(parser, ctx)?))
        }
        Token::Plus => {
            parser.advance()?;
            Ok(Expr::unary(UnaryOp::Plus, parse_factor(parser, ctx)?))
        }
        Token::Identifier(name) => {
            if parser.check_peek(&Token::LParen) {
                return Ok(Expr::Call(parse_call(parser, ctx)?));
            }
            parser.advance()?;
            Ok(resolve_identifier(ctx, name))
        }
        _ => Err(parser.expected("expression")),
    }
}

/// 按 变量 → 常量 → 参数 的顺序解析标识符；常量直接替换为字面量
fn resolve_identifier(ctx: &Function, name: String) -> Expr {
    if ctx.variables.contains(&name) {
        return Expr::Variable(name);
    }
    if let Some(value) = ctx.constants.get(&name) {
        return Expr::Literal(*value);
    }
    if !ctx.has_param(&name) {
        // 交给代码生成阶段报告未定义符号
        tracing::trace!(%name, function = %ctx.signature.name, "unresolved identifier");
    }
    Expr::Variable(name)
}

/// 解析调用：ident '(' [arg {',' arg}] ')'
pub fn parse_call<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<CallExpr> {
    let callee = parser.expect_identifier()?;
    let args = parse_arguments(parser, ctx)?;
    Ok(CallExpr { callee, args })
}

pub fn parse_arguments<S: TokenSource>(parser: &mut Parser<S>, ctx: &Function) -> MilaResult<Vec<Expr>> {
    parser.expect(&Token::LParen)?;
    let mut args = Vec::new();
    while !parser.check(&Token::RParen) && !parser.check(&Token::Eof) {
        if let Token::StringLiteral(text) = &parser.current.token {
            args.push(Expr::StringLiteral(text.clone()));
            parser.advance()?;
        } else {
            args.push(parse_expression(parser, ctx)?);
        }
        if parser.check(&Token::Comma) {
            parser.advance()?;
        } else {
            break;
        }
    }
    parser.expect(&Token::RParen)?;
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Function {
        let mut f = Function::new(Signature {
            name: "f".to_string(),
            return_type: ReturnType::Integer,
            params: vec!["p".to_string()],
        });
        f.variables.insert("x".to_string());
        f.constants.insert("A".to_string(), 2);
        f
    }

    fn parse_str(source: &str) -> Expr {
        let ctx = context();
        let mut parser = Parser::from_source(source).unwrap();
        parse_expression(&mut parser, &ctx).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_str("2 + 3 * (4 - 2)").to_string(), "(2 + (3 * (4 - 2)))");
        assert_eq!(parse_str("1 - 2 - 3").to_string(), "((1 - 2) - 3)");
        assert_eq!(parse_str("x < 1 and p = 2").to_string(), "((x < 1) and (p = 2))");
    }

    #[test]
    fn test_hex_mod_and_logic() {
        assert_eq!(
            parse_str("$1 mod 3 = 5 and 1 = 1").to_string(),
            "(((1 mod 3) = 5) and (1 = 1))"
        );
    }

    #[test]
    fn test_constant_substitution() {
        assert_eq!(parse_str("A + x"), Expr::binary(Expr::Literal(2), BinaryOp::Add, Expr::Variable("x".to_string())));
    }

    #[test]
    fn test_call_in_expression() {
        let expr = parse_str("-3 + 2 * g(x, 4 * (-2))");
        assert_eq!(expr.to_string(), "((-3) + (2 * g(x, (4 * (-2)))))");
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let ctx = context();
        let mut parser = Parser::from_source("(1 + 2 ;").unwrap();
        let err = parse_expression(&mut parser, &ctx).unwrap_err();
        assert!(err.to_string().contains("unbalanced parentheses"));
    }
}
