/// Open/closed status of single and double quotes during a left-to-right scan.
///
/// A quote character only toggles its own flag, and only when the other kind
/// is not already open: `"` inside `'...'` is literal and vice versa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteState {
    single: bool,
    double: bool,
    single_first: bool,
}

impl QuoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next character. Returns `true` when the character opened or
    /// closed a quote (i.e. it acted as a delimiter, not as text).
    pub fn update(&mut self, ch: char) -> bool {
        match ch {
            '\'' if !(self.double && !self.single_first) => {
                self.single = !self.single;
                self.single_first = self.single;
                true
            }
            '"' if !(self.single && self.single_first) => {
                self.double = !self.double;
                if self.double {
                    self.single_first = false;
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        !self.single && !self.double
    }

    pub fn in_single(&self) -> bool {
        self.single && !self.double
    }

    pub fn in_double(&self) -> bool {
        self.double && !self.single
    }

    pub fn both_open(&self) -> bool {
        self.single && self.double
    }
}
