//! 程序、函数签名与常量/变量声明解析

use crate::ast::*;
use crate::error::MilaResult;
use crate::lexer::{Token, TokenSource};
use super::Parser;
use super::statements::parse_block;
use super::utils::number_value;

/// program ident ';' {function-decl} main-block
pub fn parse_program<S: TokenSource>(parser: &mut Parser<S>) -> MilaResult<Program> {
    parser.expect(&Token::Program)?;
    let name = parser.expect_identifier()?;
    parser.expect(&Token::Semicolon)?;

    let mut functions = Vec::new();
    while parser.check(&Token::Function) || parser.check(&Token::Procedure) {
        functions.push(parse_function_declaration(parser)?);
    }

    if !parser.check(&Token::Const) && !parser.check(&Token::Var) && !parser.check(&Token::Begin) {
        return Err(parser.expected("the main block"));
    }
    let mut main = Function::new(Signature {
        name: "main".to_string(),
        return_type: ReturnType::Void,
        params: Vec::new(),
    });
    let body = parse_function_body(parser, &mut main)?;
    main.body = Some(body);

    if !parser.check(&Token::Eof) {
        return Err(parser.expected("end of input"));
    }
    functions.push(main);

    Ok(Program { name, functions })
}

/// 函数/过程声明；forward 声明没有函数体
pub fn parse_function_declaration<S: TokenSource>(parser: &mut Parser<S>) -> MilaResult<Function> {
    let signature = parse_signature(parser)?;
    let mut function = Function::new(signature);
    if parser.check(&Token::Forward) {
        parser.advance()?;
        parser.expect(&Token::Semicolon)?;
    } else {
        let body = parse_function_body(parser, &mut function)?;
        function.body = Some(body);
    }
    Ok(function)
}

/// (function|procedure) ident '(' {ident ':' integer [';']} ')' [':' integer] ';'
pub fn parse_signature<S: TokenSource>(parser: &mut Parser<S>) -> MilaResult<Signature> {
    let is_function = match parser.current.token {
        Token::Function => true,
        Token::Procedure => false,
        _ => return Err(parser.expected("function or procedure")),
    };
    parser.advance()?;
    let name = parser.expect_identifier()?;
    parser.expect(&Token::LParen)?;

    let mut params = Vec::new();
    while !parser.check(&Token::RParen) && !parser.check(&Token::Eof) {
        params.push(parser.expect_identifier()?);
        parser.expect(&Token::Colon)?;
        parser.expect(&Token::Integer)?;
        if parser.check(&Token::Semicolon) {
            parser.advance()?;
        }
    }
    parser.expect(&Token::RParen)?;

    let return_type = if is_function {
        parser.expect(&Token::Colon)?;
        parser.expect(&Token::Integer)?;
        ReturnType::Integer
    } else {
        ReturnType::Void
    };
    parser.expect(&Token::Semicolon)?;

    Ok(Signature { name, return_type, params })
}

/// 函数体；有返回值的函数把自身名字登记为变量（返回值累加器）
pub fn parse_function_body<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Block> {
    if ctx.signature.return_type != ReturnType::Void {
        ctx.variables.insert(ctx.signature.name.clone());
    }
    let body = parse_block(parser, ctx)?;
    parser.skip_separator()?;
    Ok(body)
}

/// const ident '=' number ';' ...
pub fn parse_constant_declarations<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Vec<Stmt>> {
    parser.expect(&Token::Const)?;
    let mut declarations = Vec::new();
    while !parser.check(&Token::Var) && !parser.check(&Token::Begin) && !parser.check(&Token::Eof) {
        let name = parser.expect_identifier()?;
        parser.expect(&Token::Eq)?;
        let literal = parser.expect(&Token::Number(String::new()))?;
        let value = match &literal.token {
            Token::Number(text) => number_value(text, literal.loc)?,
            _ => return Err(parser.expected("number")),
        };
        // 重复声明时后者覆盖前者
        ctx.constants.insert(name.clone(), value);
        declarations.push(Stmt::ConstDecl { name, value });
        parser.expect(&Token::Semicolon)?;
    }
    Ok(declarations)
}

/// var ident {',' ident} ':' integer ';' ...
pub fn parse_variable_declarations<S: TokenSource>(parser: &mut Parser<S>, ctx: &mut Function) -> MilaResult<Vec<Stmt>> {
    parser.expect(&Token::Var)?;
    let mut declarations = Vec::new();
    while !parser.check(&Token::Var) && !parser.check(&Token::Begin) && !parser.check(&Token::Eof) {
        let mut names = Vec::new();
        while !parser.check(&Token::Colon) && !parser.check(&Token::Eof) {
            names.push(parser.expect_identifier()?);
            if parser.check(&Token::Comma) {
                parser.advance()?;
            }
        }
        parser.expect(&Token::Colon)?;
        parser.expect(&Token::Integer)?;
        parser.expect(&Token::Semicolon)?;
        for name in names {
            ctx.variables.insert(name.clone());
            declarations.push(Stmt::VarDecl(name));
        }
    }
    Ok(declarations)
}
