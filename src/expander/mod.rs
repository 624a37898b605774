mod word;

use log::debug;
use crate::lexer::{Token, TokenKind};
use crate::state::ShellState;
use word::{Fields, Measure, Mode, Scanner};

pub use word::IFS;

/// Rewrites token text: `$NAME` and `$?` substitution, quote removal, and
/// word splitting of unquoted expansions.
///
/// The token sequence is rebuilt rather than edited in place, so one token
/// may turn into zero, one or many tokens at the same position.
pub struct Expander<'a> {
    state: &'a ShellState,
}

struct Expansion {
    fields: Vec<String>,
    quoted: bool,
}

impl<'a> Expander<'a> {
    pub fn new(state: &'a ShellState) -> Self {
        Expander { state }
    }

    pub fn expand(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            self.expand_token(token, &mut out);
        }
        reclassify_segments(&mut out);
        out
    }

    /// Expand one here-document body line. Quotes are ordinary text there.
    pub fn expand_heredoc_line(&self, line: &str) -> String {
        if !line.contains('$') {
            return line.to_string();
        }
        let mut out = String::with_capacity(line.len());
        Scanner::new(self.state, Mode::HereDoc).scan(line, &mut out);
        out
    }

    fn expand_token(&self, mut token: Token, out: &mut Vec<Token>) {
        if token.kind.is_operator() || !token.needs_expansion() {
            out.push(token);
            return;
        }

        match token.kind {
            TokenKind::Delimiter => {
                let expansion = self.expand_word(&token.text, Mode::Delimiter);
                token.text = expansion.fields.into_iter().next().unwrap_or_default();
                token.quoted = expansion.quoted;
                out.push(token);
            }
            TokenKind::FdMarker => {
                let expansion = self.expand_word(&token.text, Mode::Word);
                if expansion.fields.len() == 1 {
                    token.quoted = expansion.quoted;
                    token.text = expansion.fields.into_iter().next().unwrap_or_default();
                } else {
                    debug!("ambiguous redirect target {:?} -> {:?}", token.text, expansion.fields);
                    token.ambiguous = true;
                }
                out.push(token);
            }
            _ => {
                let expansion = self.expand_word(&token.text, Mode::Word);
                debug!("expanded {:?} -> {:?}", token.text, expansion.fields);
                for (i, field) in expansion.fields.into_iter().enumerate() {
                    let mut piece = Token::new(
                        if i == 0 { token.kind } else { TokenKind::Argument },
                        field,
                    );
                    piece.quoted = expansion.quoted;
                    out.push(piece);
                }
            }
        }
    }

    fn expand_word(&self, text: &str, mode: Mode) -> Expansion {
        let scanner = Scanner::new(self.state, mode);
        let mut measure = Measure::default();
        scanner.scan(text, &mut measure);

        let mut fields = Fields::for_measure(&measure);
        scanner.scan(text, &mut fields);
        let quoted = fields.quoted;
        Expansion {
            fields: fields.finish(),
            quoted,
        }
    }
}

/// Make sure every segment whose command word survived expansion has
/// exactly one `Command` token.
fn reclassify_segments(tokens: &mut [Token]) {
    let mut has_command = false;
    for token in tokens.iter_mut() {
        match token.kind {
            TokenKind::Pipe => has_command = false,
            TokenKind::Command if has_command => token.kind = TokenKind::Argument,
            TokenKind::Command => has_command = true,
            TokenKind::Argument if !has_command => {
                token.kind = TokenKind::Command;
                has_command = true;
            }
            _ => {}
        }
    }
}
