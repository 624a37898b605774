use crate::lexer::{is_blank, QuoteState, Token, TokenKind};
use super::SyntaxError;

type Check = Result<(), SyntaxError>;

/// Rejects malformed lines before anything is expanded or forked.
///
/// Checks run in a fixed order and stop at the first failure. The validator
/// only borrows the line and its tokens, so running it twice gives the same
/// answer.
pub struct SyntaxValidator<'a> {
    line: &'a str,
    tokens: &'a [Token],
}

impl<'a> SyntaxValidator<'a> {
    pub fn new(line: &'a str, tokens: &'a [Token]) -> Self {
        Self { line, tokens }
    }

    pub fn validate(&self) -> Check {
        self.check_quotes()?;
        self.check_leading_pipe()?;
        self.check_leading_redirect()?;
        self.check_redirect_has_target()?;
        self.check_pipes()?;
        self.check_redirect_adjacency()?;
        self.check_operator_runs()?;
        self.check_directory_command()?;
        self.check_pipe_brackets()
    }

    fn check_quotes(&self) -> Check {
        let mut quotes = QuoteState::new();
        for ch in self.line.chars() {
            quotes.update(ch);
        }
        if quotes.is_closed() {
            Ok(())
        } else {
            Err(SyntaxError::UnclosedQuote)
        }
    }

    fn check_leading_pipe(&self) -> Check {
        let line = self.line.trim_start_matches(is_blank);
        if line.starts_with("||") {
            Err(unexpected("||"))
        } else if line.starts_with('|') {
            Err(unexpected("|"))
        } else {
            Ok(())
        }
    }

    fn check_leading_redirect(&self) -> Check {
        let Some(first) = self.tokens.first() else {
            return Ok(());
        };
        if first.kind == TokenKind::Invalid {
            return Err(unexpected(&offending(first)));
        }
        if !first.kind.is_redirect() {
            return Ok(());
        }
        match self.tokens.get(1) {
            None => Err(unexpected("newline")),
            Some(next) if next.kind.is_operator() => Err(unexpected(&offending(next))),
            Some(_) => Ok(()),
        }
    }

    fn check_redirect_has_target(&self) -> Check {
        match self.tokens.last() {
            Some(last) if last.kind.is_redirect() => Err(unexpected("newline")),
            _ => Ok(()),
        }
    }

    fn check_pipes(&self) -> Check {
        for (i, token) in self.tokens.iter().enumerate() {
            if token.kind != TokenKind::Pipe {
                continue;
            }
            match self.tokens.get(i + 1) {
                None => return Err(unexpected("|")),
                Some(next) if next.kind == TokenKind::Pipe => return Err(unexpected("|")),
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn check_redirect_adjacency(&self) -> Check {
        for pair in self.tokens.windows(2) {
            if pair[0].kind.is_redirect() && pair[1].kind.is_operator() {
                return Err(unexpected(&offending(&pair[1])));
            }
        }
        Ok(())
    }

    fn check_operator_runs(&self) -> Check {
        for token in self.tokens {
            if token.kind.is_operator() && token.text.chars().filter(|c| matches!(c, '<' | '>')).count() > 2 {
                return Err(unexpected(&offending(token)));
            }
        }
        Ok(())
    }

    fn check_directory_command(&self) -> Check {
        for token in self.tokens {
            if token.kind == TokenKind::Command && !token.text.is_empty() && token.text.chars().all(|c| c == '/') {
                return Err(SyntaxError::IsDirectory(token.text.clone()));
            }
        }
        Ok(())
    }

    fn check_pipe_brackets(&self) -> Check {
        let chars: Vec<char> = self.line.chars().collect();
        let mut quotes = QuoteState::new();
        for (i, &ch) in chars.iter().enumerate() {
            quotes.update(ch);
            if ch == '|'
                && quotes.is_closed()
                && i > 0
                && chars[i - 1] == '>'
                && chars.get(i + 1) == Some(&'<')
            {
                return Err(unexpected("|"));
            }
        }
        Ok(())
    }
}

fn unexpected(text: &str) -> SyntaxError {
    SyntaxError::UnexpectedToken(text.to_string())
}

/// Text reported for an operator token. For over-long `<`/`>` runs this is
/// the part past the longest valid spelling, like `>>>` reporting `>`.
fn offending(token: &Token) -> String {
    if token.kind == TokenKind::Invalid && token.text.len() > 2 {
        let end = token.text.len().min(4);
        token.text[2..end].to_string()
    } else {
        token.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn check(line: &str) -> Check {
        let tokens = tokenize(line);
        SyntaxValidator::new(line, &tokens).validate()
    }

    fn near(text: &str) -> Check {
        Err(SyntaxError::UnexpectedToken(text.to_string()))
    }

    #[test]
    fn test_accepts_valid_lines() {
        for line in [
            "echo hello",
            "ls -l | grep foo | wc -l",
            "cat < in > out",
            "<in cat",
            "cat << EOF",
            "echo 'a | b' \"c > d\"",
            "",
            "   ",
        ] {
            assert_eq!(check(line), Ok(()), "line: {}", line);
        }
    }

    #[test]
    fn test_unclosed_quotes() {
        assert_eq!(check("echo \"unterminated"), Err(SyntaxError::UnclosedQuote));
        assert_eq!(check("echo 'it"), Err(SyntaxError::UnclosedQuote));
        assert_eq!(check("echo \"it's\""), Ok(()));
    }

    #[test]
    fn test_leading_pipe() {
        assert_eq!(check("| ls"), near("|"));
        assert_eq!(check("  || ls"), near("||"));
    }

    #[test]
    fn test_leading_redirect_without_target() {
        assert_eq!(check(">"), near("newline"));
        assert_eq!(check("< | ls"), near("|"));
    }

    #[test]
    fn test_trailing_redirect() {
        assert_eq!(check("echo hi >"), near("newline"));
        assert_eq!(check("cat <<"), near("newline"));
    }

    #[test]
    fn test_pipe_adjacency() {
        assert_eq!(check("ls | | wc"), near("|"));
        assert_eq!(check("ls || wc"), near("|"));
        assert_eq!(check("ls |"), near("|"));
    }

    #[test]
    fn test_redirect_adjacency() {
        assert_eq!(check("echo > > f"), near(">"));
        assert_eq!(check("echo > << f"), near("<<"));
        assert_eq!(check("cat < | wc"), near("|"));
        assert_eq!(check("cat << > f"), near(">"));
    }

    #[test]
    fn test_operator_runs() {
        assert_eq!(check("echo >>> f"), near(">"));
        assert_eq!(check("cat <<<< f"), near("<<"));
        assert_eq!(check(">>> f"), near(">"));
    }

    #[test]
    fn test_slash_command_is_directory() {
        let err = check("/").unwrap_err();
        assert_eq!(err, SyntaxError::IsDirectory("/".to_string()));
        assert_eq!(err.status(), 126);
        assert_eq!(check("ls /"), Ok(()));
    }

    #[test]
    fn test_pipe_between_brackets() {
        let line = "echo >|< f";
        let tokens = tokenize(line);
        let validator = SyntaxValidator::new(line, &tokens);
        assert!(validator.check_pipe_brackets().is_err());
        assert!(SyntaxValidator::new("echo '>|<'", &tokenize("echo '>|<'"))
            .check_pipe_brackets()
            .is_ok());
    }

    #[test]
    fn test_validation_is_idempotent() {
        for line in ["echo hi | wc", "ls | | wc", "echo 'x", "cat <<"] {
            let tokens = tokenize(line);
            let validator = SyntaxValidator::new(line, &tokens);
            assert_eq!(validator.validate(), validator.validate(), "line: {}", line);
        }
    }

    #[test]
    fn test_syntax_error_messages() {
        assert_eq!(SyntaxError::UnclosedQuote.to_string(), "syntax error quote not closed");
        assert_eq!(
            SyntaxError::UnexpectedToken("|".into()).to_string(),
            "syntax error near unexpected token `|'"
        );
        assert_eq!(SyntaxError::UnclosedQuote.status(), 2);
    }
}
