use std::fmt;

use logos::Logos;
use crate::error::{MilaResult, SourceLocation, lexer_error};

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub enum Token {
    // 关键字
    #[token("program")]
    Program,
    #[token("begin")]
    Begin,
    #[token("end")]
    End,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("function")]
    Function,
    #[token("procedure")]
    Procedure,
    #[token("forward")]
    Forward,
    #[token("integer")]
    Integer,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("break")]
    Break,
    #[token("exit")]
    Exit,
    #[token("for")]
    For,
    #[token("to")]
    To,
    #[token("downto")]
    Downto,
    #[token("div")]
    Div,
    #[token("mod")]
    Mod,
    #[token("and")]
    And,
    #[token("or")]
    Or,

    // 标识符
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // 数字字面量保留原始文本，由语法分析器按进制转换
    // 十进制 123，八进制 &17，十六进制 $1F
    #[regex(r"[0-9][0-9a-zA-Z_]*|&[0-9a-zA-Z_]*|\$[0-9a-zA-Z_]*", |lex| lex.slice().to_string())]
    Number(String),

    #[regex(r"'[^'\n]*'", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    StringLiteral(String),

    // 运算符
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("=")]
    Eq,
    #[token("<>")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token(":=")]
    Assign,

    // 分隔符
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // 换行（用于跟踪行号）
    #[token("\n")]
    Newline,

    /// 输入结束，由 Lexer 追加，logos 不会产生
    Eof,
}

impl Token {
    /// 令牌类别名称，用于诊断信息
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Program => "program",
            Token::Begin => "begin",
            Token::End => "end",
            Token::Const => "const",
            Token::Var => "var",
            Token::Function => "function",
            Token::Procedure => "procedure",
            Token::Forward => "forward",
            Token::Integer => "integer",
            Token::If => "if",
            Token::Then => "then",
            Token::Else => "else",
            Token::While => "while",
            Token::Do => "do",
            Token::Break => "break",
            Token::Exit => "exit",
            Token::For => "for",
            Token::To => "to",
            Token::Downto => "downto",
            Token::Div => "div",
            Token::Mod => "mod",
            Token::And => "and",
            Token::Or => "or",
            Token::Identifier(_) => "identifier",
            Token::Number(_) => "number",
            Token::StringLiteral(_) => "string literal",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Eq => "=",
            Token::NotEq => "<>",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Assign => ":=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Newline => "newline",
            Token::Eof => "eof",
        }
    }

    /// 比较令牌类别，忽略携带的文本
    pub fn same_kind(&self, other: &Token) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Number(text) => write!(f, "number '{}'", text),
            Token::StringLiteral(text) => write!(f, "string literal '{}'", text),
            other => write!(f, "'{}'", other.kind_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLocation {
    pub token: Token,
    pub loc: SourceLocation,
}

/// 语法分析器的令牌来源：按需拉取，耗尽后重复返回 Eof
pub trait TokenSource {
    fn next_token(&mut self) -> MilaResult<TokenWithLocation>;
}

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            line: 1,
            line_start: 0,
        }
    }

    fn location(&self, offset: usize) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: offset - self.line_start + 1,
        }
    }

    pub fn tokenize(&mut self) -> MilaResult<Vec<TokenWithLocation>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tracing::debug!(count = tokens.len(), "tokenized source");
        Ok(tokens)
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> MilaResult<TokenWithLocation> {
        loop {
            match self.inner.next() {
                Some(Ok(Token::Newline)) => {
                    // 不保留换行token
                    self.line += 1;
                    self.line_start = self.inner.span().end;
                }
                Some(Ok(token)) => {
                    let loc = self.location(self.inner.span().start);
                    return Ok(TokenWithLocation { token, loc });
                }
                Some(Err(())) => {
                    let span = self.inner.span();
                    let loc = self.location(span.start);
                    return Err(lexer_error(
                        loc.line,
                        loc.column,
                        format!("Unexpected character: '{}'", &self.source[span]),
                    ));
                }
                None => {
                    return Ok(TokenWithLocation {
                        token: Token::Eof,
                        loc: self.location(self.source.len()),
                    });
                }
            }
        }
    }
}

/// 预先切分好的令牌序列
pub struct TokenBuffer {
    tokens: Vec<TokenWithLocation>,
    pos: usize,
}

impl TokenBuffer {
    pub fn new(tokens: Vec<TokenWithLocation>) -> Self {
        Self { tokens, pos: 0 }
    }
}

impl TokenSource for TokenBuffer {
    fn next_token(&mut self) -> MilaResult<TokenWithLocation> {
        if let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            return Ok(token.clone());
        }
        let loc = self
            .tokens
            .last()
            .map(|t| t.loc)
            .unwrap_or(SourceLocation { line: 1, column: 1 });
        Ok(TokenWithLocation { token: Token::Eof, loc })
    }
}

pub fn lex(source: &str) -> MilaResult<Vec<TokenWithLocation>> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}
