//! 语句解析

use crate::ast::*;
use crate::error::MilaResult;
use crate::lexer::{Token, TokenSource};
use super::Parser;
use super::declarations::{parse_constant_declarations, parse_variable_declarations};
use super::expressions::{parse_arguments, parse_expression};

/// [const-decls] [var-decls] begin {statement {';'}} end
pub fn parse_block<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Block> {
    let mut statements = Vec::new();
    if parser.check(&Token::Const) {
        statements.extend(parse_constant_declarations(parser, ctx)?);
    }
    if parser.check(&Token::Var) {
        statements.extend(parse_variable_declarations(parser, ctx)?);
    }
    parser.expect(&Token::Begin)?;
    while !parser.check(&Token::End) && !parser.check(&Token::Eof) {
        statements.push(parse_statement(parser, ctx)?);
        parser.skip_semicolons()?;
    }
    parser.expect(&Token::End)?;
    Ok(Block { statements })
}

/// 按当前令牌分派语句
pub fn parse_statement<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Stmt> {
    match parser.current.token {
        Token::Identifier(_) => {
            if parser.check_peek(&Token::Assign) {
                parse_assignment(parser, ctx)
            } else if parser.check_peek(&Token::LParen) {
                parse_procedure_call(parser, ctx)
            } else {
                Err(parser.expected("assignment or procedure call"))
            }
        }
        Token::If => parse_if_statement(parser, ctx),
        Token::Const | Token::Var | Token::Begin => Ok(Stmt::Block(parse_block(parser, ctx)?)),
        Token::While => parse_while_statement(parser, ctx),
        Token::For => parse_for_statement(parser, ctx),
        Token::Break => {
            parser.advance()?;
            Ok(Stmt::Break)
        }
        Token::Exit => {
            parser.advance()?;
            Ok(Stmt::Exit)
        }
        _ => Err(parser.expected("statement")),
    }
}

pub fn parse_assignment<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Stmt> {
    let target = parser.expect_identifier()?;
    parser.expect(&Token::Assign)?;
    let value = parse_expression(parser, ctx)?;
    Ok(Stmt::Assign(Assignment { target, value }))
}

pub fn parse_procedure_call<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Stmt> {
    let callee = parser.expect_identifier()?;
    let args = parse_arguments(parser, ctx)?;
    Ok(Stmt::Call(CallExpr { callee, args }))
}

pub fn parse_if_statement<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Stmt> {
    parser.expect(&Token::If)?;
    let condition = parse_expression(parser, ctx)?;
    parser.expect(&Token::Then)?;
    let then_branch = Box::new(parse_statement(parser, ctx)?);
    parser.skip_separator()?;

    let mut else_branch = None;
    if parser.check(&Token::Else) {
        parser.advance()?;
        else_branch = Some(Box::new(parse_statement(parser, ctx)?));
        parser.skip_separator()?;
    }

    Ok(Stmt::If(IfStmt {
        condition,
        then_branch,
        else_branch,
    }))
}

pub fn parse_while_statement<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Stmt> {
    parser.expect(&Token::While)?;
    let condition = parse_expression(parser, ctx)?;
    parser.expect(&Token::Do)?;
    let body = Box::new(parse_statement(parser, ctx)?);
    parser.skip_separator()?;
    Ok(Stmt::While(WhileStmt { condition, body }))
}

/// for v := A (to|downto) B do body
///
/// 在此处脱糖为 `v := A; while v <> B do begin body; inc(v) end`，
/// downto 使用 dec。代码生成器不再看到 for。
pub fn parse_for_statement<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Stmt> {
    parser.expect(&Token::For)?;
    let variable = parser.expect_identifier()?;
    parser.expect(&Token::Assign)?;
    let initial = parse_expression(parser, ctx)?;

    let upto = match parser.current.token {
        Token::To => true,
        Token::Downto => false,
        _ => return Err(parser.expected("'to' or 'downto'")),
    };
    parser.advance()?;

    let target = parse_expression(parser, ctx)?;
    parser.expect(&Token::Do)?;
    // 循环体接受任意语句而不只是 begin...end 块，与 while 一致
    let body = parse_statement(parser, ctx)?;
    parser.skip_semicolons()?;

    Ok(desugar_for(variable, initial, upto, target, body))
}

fn desugar_for(variable: String, initial: Expr, upto: bool, target: Expr, body: Stmt) -> Stmt {
    let step = Stmt::Call(CallExpr {
        callee: if upto { "inc" } else { "dec" }.to_string(),
        args: vec![Expr::Variable(variable.clone())],
    });
    let body = match body {
        Stmt::Block(mut block) => {
            block.statements.push(step);
            block
        }
        other => Block {
            statements: vec![other, step],
        },
    };
    let condition = Expr::binary(Expr::Variable(variable.clone()), BinaryOp::Ne, target);

    Stmt::Block(Block {
        statements: vec![
            Stmt::Assign(Assignment {
                target: variable,
                value: initial,
            }),
            Stmt::While(WhileStmt {
                condition,
                body: Box::new(Stmt::Block(body)),
            }),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Function {
        let mut f = Function::new(Signature {
            name: "main".to_string(),
            return_type: ReturnType::Void,
            params: Vec::new(),
        });
        f.variables.insert("x".to_string());
        f.variables.insert("a".to_string());
        f
    }

    fn statement(source: &str) -> Stmt {
        let mut ctx = context();
        let mut parser = Parser::from_source(source).unwrap();
        parse_statement(&mut parser, &mut ctx).unwrap()
    }

    #[test]
    fn test_assignment() {
        match statement("x := -3 + 2 * a;") {
            Stmt::Assign(a) => assert_eq!(a.to_string(), "x := ((-3) + (2 * a))"),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_procedure_call() {
        match statement("gcdi(1 + 3, 4 * (- 2));") {
            Stmt::Call(call) => {
                assert_eq!(call.callee, "gcdi");
                assert_eq!(call.args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_string_argument() {
        assert_eq!(
            statement("write('hi');"),
            Stmt::Call(CallExpr {
                callee: "write".to_string(),
                args: vec![Expr::StringLiteral("hi".to_string())],
            })
        );
    }

    #[test]
    fn test_if_else_with_separator() {
        match statement("if x = 1 then x := 2; else x := 3;") {
            Stmt::If(i) => {
                assert_eq!(i.condition.to_string(), "(x = 1)");
                assert!(i.else_branch.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_for_desugars_to_while() {
        let expected = Stmt::Block(Block {
            statements: vec![
                Stmt::Assign(Assignment {
                    target: "x".to_string(),
                    value: Expr::Literal(10),
                }),
                Stmt::While(WhileStmt {
                    condition: Expr::binary(Expr::Variable("x".to_string()), BinaryOp::Ne, Expr::Literal(1)),
                    body: Box::new(Stmt::Block(Block {
                        statements: vec![
                            Stmt::Call(CallExpr {
                                callee: "writeln".to_string(),
                                args: vec![Expr::Variable("x".to_string())],
                            }),
                            Stmt::Call(CallExpr {
                                callee: "dec".to_string(),
                                args: vec![Expr::Variable("x".to_string())],
                            }),
                        ],
                    })),
                }),
            ],
        });
        assert_eq!(statement("for x := 10 downto 1 do begin writeln(x); end;"), expected);
    }

    #[test]
    fn test_for_requires_direction() {
        let mut ctx = context();
        let mut parser = Parser::from_source("for x := 1 until 3 do begin end").unwrap();
        let err = parse_statement(&mut parser, &mut ctx).unwrap_err();
        assert!(err.to_string().contains("'to' or 'downto'"));
    }

    #[test]
    fn test_identifier_without_assignment_or_call() {
        let mut ctx = context();
        let mut parser = Parser::from_source("x + 1;").unwrap();
        assert!(parse_statement(&mut parser, &mut ctx).unwrap_err().is_syntax());
    }
}
