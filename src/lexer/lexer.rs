use log::debug;
use super::quote::QuoteState;
use super::token::{Token, TokenKind};

/// Space plus the C0 controls from tab to carriage return.
pub fn is_blank(ch: char) -> bool {
    ch == ' ' || ('\t'..='\r').contains(&ch)
}

fn is_redirect_char(ch: char) -> bool {
    ch == '<' || ch == '>'
}

fn is_operator_char(ch: char) -> bool {
    is_redirect_char(ch) || ch == '|'
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    /// Split the line into words and operators, then classify them.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        classify(&mut tokens);
        debug!("tokens: {:?}", tokens.iter().map(|t| (t.kind, t.text.as_str())).collect::<Vec<_>>());
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn skip_blanks(&mut self) {
        while let Some(ch) = self.peek() {
            if !is_blank(ch) {
                break;
            }
            self.bump(ch);
        }
    }

    /// Scan one raw token. Classification is left to `classify`, every token
    /// starts out as an argument.
    fn next_token(&mut self) -> Option<Token> {
        self.skip_blanks();
        let start = self.pos;
        let first = self.peek()?;

        if first == '|' {
            self.bump(first);
        } else if is_redirect_char(first) {
            // A run of `<`/`>` is one token; the validator rejects long runs.
            while let Some(ch) = self.peek() {
                if !is_redirect_char(ch) {
                    break;
                }
                self.bump(ch);
            }
        } else {
            let mut quotes = QuoteState::new();
            while let Some(ch) = self.peek() {
                if quotes.is_closed() && (is_blank(ch) || is_operator_char(ch)) {
                    break;
                }
                quotes.update(ch);
                self.bump(ch);
            }
        }

        let text = &self.input[start..self.pos];
        Some(Token::new(TokenKind::Argument, text))
    }
}

/// Positional classification pass over freshly scanned tokens.
fn classify(tokens: &mut [Token]) {
    let mut prev: Option<TokenKind> = None;
    let mut has_command = false;

    for token in tokens.iter_mut() {
        if matches!(prev, None | Some(TokenKind::Pipe)) {
            has_command = false;
        }

        token.kind = if token.text == "|" {
            TokenKind::Pipe
        } else if token.text.starts_with(is_redirect_char) {
            TokenKind::from_redirect(&token.text)
        } else if prev.is_some_and(TokenKind::is_file_redirect) {
            TokenKind::FdMarker
        } else if prev == Some(TokenKind::HereDoc) {
            TokenKind::Delimiter
        } else if !has_command {
            has_command = true;
            TokenKind::Command
        } else {
            TokenKind::Argument
        };
        prev = Some(token.kind);
    }
}
