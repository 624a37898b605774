mod lexer;
pub mod quote;
pub mod token;

pub use lexer::{is_blank, Lexer};
pub use quote::QuoteState;
pub use token::{Token, TokenKind};

pub fn tokenize(line: &str) -> Vec<Token> {
    Lexer::new(line).tokenize()
}
