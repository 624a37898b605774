pub mod validator;

use thiserror::Error;
use crate::lexer::Token;

pub use validator::SyntaxValidator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("syntax error quote not closed")]
    UnclosedQuote,
    #[error("syntax error near unexpected token `{0}'")]
    UnexpectedToken(String),
    #[error("{0}: is a directory")]
    IsDirectory(String),
}

impl SyntaxError {
    /// Exit status recorded for `$?` when a line is rejected.
    pub fn status(&self) -> i32 {
        match self {
            SyntaxError::IsDirectory(_) => 126,
            _ => 2,
        }
    }
}

pub fn validate(line: &str, tokens: &[Token]) -> Result<(), SyntaxError> {
    SyntaxValidator::new(line, tokens).validate()
}
