//! Mila 语法分析器
//!
//! 递归下降分析，向前看一个令牌（current + peek）。
//! 分析的同时建立当前函数的符号表（变量、常量、参数），
//! 标识符在被读到的那一刻按符号表解析。
//! 当前函数作为显式参数在各个产生式之间传递。

mod declarations;
mod expressions;
mod statements;
mod utils;

use crate::ast::{Expr, Function, Program};
use crate::error::{MilaError, MilaResult, SourceLocation, syntax_error};
use crate::lexer::{Lexer, Token, TokenSource, TokenWithLocation};

/// 语法分析器
pub struct Parser<S: TokenSource> {
    source: S,
    /// 当前令牌
    pub current: TokenWithLocation,
    /// 下一个令牌
    pub peek: TokenWithLocation,
}

impl<'a> Parser<Lexer<'a>> {
    /// 直接从源码创建语法分析器
    pub fn from_source(source: &'a str) -> MilaResult<Self> {
        Parser::new(Lexer::new(source))
    }
}

impl<S: TokenSource> Parser<S> {
    /// 创建语法分析器并填充 current 与 peek
    pub fn new(mut source: S) -> MilaResult<Self> {
        let current = source.next_token()?;
        let peek = source.next_token()?;
        if current.token == Token::Eof || peek.token == Token::Eof {
            return Err(syntax_error(current.loc, "program is too short"));
        }
        Ok(Self { source, current, peek })
    }

    /// 解析整个程序
    pub fn parse(&mut self) -> MilaResult<Program> {
        let program = declarations::parse_program(self)?;
        tracing::debug!(
            program = %program.name,
            functions = program.functions.len(),
            "parsed program"
        );
        Ok(program)
    }

    /// 在给定函数上下文中解析单个表达式
    pub fn parse_expression(&mut self, context: &Function) -> MilaResult<Expr> {
        expressions::parse_expression(self, context)
    }

    /// 前进一个令牌，返回原来的当前令牌
    fn advance(&mut self) -> MilaResult<TokenWithLocation> {
        let next = self.source.next_token()?;
        let previous = std::mem::replace(&mut self.current, std::mem::replace(&mut self.peek, next));
        Ok(previous)
    }

    fn check(&self, token: &Token) -> bool {
        self.current.token.same_kind(token)
    }

    fn check_peek(&self, token: &Token) -> bool {
        self.peek.token.same_kind(token)
    }

    fn current_loc(&self) -> SourceLocation {
        self.current.loc
    }

    /// 断言当前令牌类别并前进
    fn expect(&mut self, expected: &Token) -> MilaResult<TokenWithLocation> {
        if self.check(expected) {
            self.advance()
        } else {
            Err(self.expected(expected.kind_name()))
        }
    }

    fn expect_identifier(&mut self) -> MilaResult<String> {
        match self.expect(&Token::Identifier(String::new()))?.token {
            Token::Identifier(name) => Ok(name),
            _ => Err(self.expected("identifier")),
        }
    }

    /// 若当前为 ';' 或 '.' 则跳过一个
    fn skip_separator(&mut self) -> MilaResult<()> {
        if self.check(&Token::Semicolon) || self.check(&Token::Dot) {
            self.advance()?;
        }
        Ok(())
    }

    fn skip_semicolons(&mut self) -> MilaResult<()> {
        while self.check(&Token::Semicolon) {
            self.advance()?;
        }
        Ok(())
    }

    fn expected(&self, expected: &str) -> MilaError {
        syntax_error(
            self.current.loc,
            format!("expected {} but got {}", expected, self.current.token),
        )
    }

    fn error(&self, message: &str) -> MilaError {
        syntax_error(self.current.loc, message)
    }
}

/// 解析源码生成 AST
pub fn parse(source: &str) -> MilaResult<Program> {
    let mut parser = Parser::from_source(source)?;
    parser.parse()
}
