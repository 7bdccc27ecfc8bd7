use thiserror::Error;
use std::fmt;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MilaError {
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer { line: usize, column: usize, message: String },

    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax { line: usize, column: usize, message: String },

    #[error("Semantic error: {0}")]
    Semantic(String),

    #[error("Code generation error: {0}")]
    CodeGen(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type MilaResult<T> = Result<T, MilaError>;

impl MilaError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, MilaError::Syntax { .. })
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, MilaError::Semantic(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub fn lexer_error(line: usize, column: usize, message: impl Into<String>) -> MilaError {
    MilaError::Lexer {
        line,
        column,
        message: message.into(),
    }
}

pub fn syntax_error(loc: SourceLocation, message: impl Into<String>) -> MilaError {
    MilaError::Syntax {
        line: loc.line,
        column: loc.column,
        message: message.into(),
    }
}

pub fn semantic_error(message: impl Into<String>) -> MilaError {
    MilaError::Semantic(message.into())
}

pub fn codegen_error(message: impl Into<String>) -> MilaError {
    MilaError::CodeGen(message.into())
}

pub fn io_error(message: impl Into<String>) -> MilaError {
    MilaError::Io(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let loc = SourceLocation { line: 4, column: 2 };
        assert_eq!(
            syntax_error(loc, "expected then but got 'do'").to_string(),
            "Syntax error at line 4, column 2: expected then but got 'do'"
        );
        assert_eq!(
            io_error("failed to read 'a.mila': not found").to_string(),
            "IO error: failed to read 'a.mila': not found"
        );
        assert!(semantic_error("undefined symbol 'x'").is_semantic());
        assert!(!io_error("x").is_syntax());
    }
}
