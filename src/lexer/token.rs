#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Command,       // first word of a segment
    Argument,
    Pipe,          // |
    RedirectIn,    // <
    RedirectOut,   // >
    AppendOut,     // >>
    RedirectInOut, // <>
    RedirectOutIn, // ><
    HereDoc,       // <<
    FdMarker,      // target of a file redirection
    Delimiter,     // here-document delimiter
    Invalid,       // unrecognised redirection spelling
}

impl TokenKind {
    /// Redirections whose target is a file (everything but `<<`).
    pub fn is_file_redirect(self) -> bool {
        matches!(
            self,
            TokenKind::RedirectIn
                | TokenKind::RedirectOut
                | TokenKind::AppendOut
                | TokenKind::RedirectInOut
                | TokenKind::RedirectOutIn
        )
    }

    pub fn is_redirect(self) -> bool {
        self.is_file_redirect() || self == TokenKind::HereDoc
    }

    pub fn is_operator(self) -> bool {
        self.is_redirect() || matches!(self, TokenKind::Pipe | TokenKind::Invalid)
    }

    pub fn is_word(self) -> bool {
        matches!(self, TokenKind::Command | TokenKind::Argument)
    }

    pub fn from_redirect(op: &str) -> TokenKind {
        match op {
            ">" => TokenKind::RedirectOut,
            "<" => TokenKind::RedirectIn,
            ">>" => TokenKind::AppendOut,
            "<<" => TokenKind::HereDoc,
            "<>" => TokenKind::RedirectInOut,
            "><" => TokenKind::RedirectOutIn,
            _ => TokenKind::Invalid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub quoted: bool,    // quote removal happened during expansion
    pub ambiguous: bool, // redirection target expanded to != 1 word
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
            quoted: false,
            ambiguous: false,
        }
    }

    /// Whether the raw text still needs the expander: a `$` or a quote.
    pub fn needs_expansion(&self) -> bool {
        self.text.contains(['$', '\'', '"'])
    }
}
