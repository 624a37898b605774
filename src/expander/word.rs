use crate::lexer::QuoteState;
use crate::state::ShellState;

/// Field separators for word splitting of unquoted expansions.
pub const IFS: [char; 3] = [' ', '\t', '\n'];

/// Receives the pieces of a scanned word, in order.
pub(crate) trait Sink {
    fn literal(&mut self, ch: char);
    /// A quote character consumed as a delimiter.
    fn quote(&mut self);
    fn expansion(&mut self, value: &str, quoted: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Command words, arguments and redirection targets.
    Word,
    /// Here-document delimiters: quote removal only.
    Delimiter,
    /// Here-document body lines: `$` expansion only, quotes are text.
    HereDoc,
}

pub(crate) struct Scanner<'a> {
    state: &'a ShellState,
    mode: Mode,
}

impl<'a> Scanner<'a> {
    pub fn new(state: &'a ShellState, mode: Mode) -> Self {
        Scanner { state, mode }
    }

    pub fn scan<S: Sink>(&self, text: &str, sink: &mut S) {
        let chars: Vec<char> = text.chars().collect();
        let mut quotes = QuoteState::new();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if self.mode != Mode::HereDoc && (ch == '\'' || ch == '"') && quotes.update(ch) {
                sink.quote();
                i += 1;
            } else if ch == '$' && self.mode != Mode::Delimiter && !quotes.in_single() {
                i += self.dollar(&chars[i + 1..], quotes.in_double(), sink);
            } else {
                sink.literal(ch);
                i += 1;
            }
        }
    }

    /// Handle a `$` followed by `rest`; returns the number of chars consumed.
    fn dollar<S: Sink>(&self, rest: &[char], in_double: bool, sink: &mut S) -> usize {
        let quoted = in_double || self.mode == Mode::HereDoc;
        match rest.first() {
            Some('?') => {
                sink.expansion(&self.state.last_status.to_string(), quoted);
                2
            }
            // no positional parameters
            Some(c) if c.is_ascii_digit() => 2,
            Some(c) if c.is_ascii_alphabetic() || *c == '_' => {
                let len = rest
                    .iter()
                    .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                    .count();
                let name: String = rest[..len].iter().collect();
                sink.expansion(self.state.env.get(&name).unwrap_or(""), quoted);
                1 + len
            }
            Some('\'' | '"') if !in_double && self.mode == Mode::Word => 1,
            _ => {
                sink.literal('$');
                1
            }
        }
    }
}

/// Byte length of the expanded text, computed by the same scan, and whether
/// the word has any delimiter quotes.
#[derive(Debug, Default)]
pub(crate) struct Measure {
    pub len: usize,
    pub quoted: bool,
}

impl Sink for Measure {
    fn literal(&mut self, ch: char) {
        self.len += ch.len_utf8();
    }

    fn quote(&mut self) {
        self.quoted = true;
    }

    fn expansion(&mut self, value: &str, _quoted: bool) {
        self.len += value.len();
    }
}

/// Builds the final words. Unquoted expansions split on `IFS` only when the
/// word has no quotes at all; otherwise the word stays whole.
#[derive(Debug, Default)]
pub(crate) struct Fields {
    fields: Vec<String>,
    current: String,
    started: bool,
    whole: bool,
    pub quoted: bool,
}

impl Fields {
    /// Sized from a `Measure` of the same text.
    pub fn for_measure(measure: &Measure) -> Self {
        Fields {
            current: String::with_capacity(measure.len),
            whole: measure.quoted,
            ..Default::default()
        }
    }

    pub fn finish(mut self) -> Vec<String> {
        if self.started {
            self.fields.push(self.current);
        }
        self.fields
    }
}

impl Sink for Fields {
    fn literal(&mut self, ch: char) {
        self.current.push(ch);
        self.started = true;
    }

    fn quote(&mut self) {
        self.started = true;
        self.quoted = true;
    }

    fn expansion(&mut self, value: &str, quoted: bool) {
        if quoted || self.whole {
            self.current.push_str(value);
            self.started = true;
            return;
        }
        for ch in value.chars() {
            if IFS.contains(&ch) {
                if self.started {
                    self.fields.push(std::mem::take(&mut self.current));
                    self.started = false;
                }
            } else {
                self.current.push(ch);
                self.started = true;
            }
        }
    }
}

impl Sink for String {
    fn literal(&mut self, ch: char) {
        self.push(ch);
    }

    fn quote(&mut self) {}

    fn expansion(&mut self, value: &str, _quoted: bool) {
        self.push_str(value);
    }
}
