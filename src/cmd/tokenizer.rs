//! Splits the argument part of a command message into parameters.
//!
//! Parameters are separated by whitespace. A parameter that contains
//! whitespace must be enclosed in quote characters; inside quotes the escape
//! character makes the next character literal:
//!
//! ```text
//! a "b c" "say \"hi\""   =>   ["a", "b c", "say \"hi\""]
//! ```

use std::str::Chars;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("Expected closing {0}.")]
    ExpectedClosingQuote(char),

    #[error("Expected whitespace after closing {0}.")]
    ExpectedWhitespaceAfterQuote(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SkippingWhitespace,
    ReadingUnescaped,
    ReadingQuoted,
    JustEscaped,
    EndOfQuotedToken,
    /// Input exhausted or an error was already reported.
    Done,
}

/// Lazy single-pass iterator over the parameters of `input`.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    chars: Chars<'a>,
    escape: char,
    quote: char,
    state: State,
}

/// Tokenizes `input` with `escape` and `quote` as the special characters.
pub fn tokenize(input: &str, escape: char, quote: char) -> Tokens<'_> {
    Tokens {
        chars: input.chars(),
        escape,
        quote,
        state: State::SkippingWhitespace,
    }
}

/// Mismo juego de caracteres que el protocolo de comandos: `\` y `"`.
pub fn tokenize_default(input: &str) -> Tokens<'_> {
    tokenize(input, '\\', '"')
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\n' | '\t' | '\x0C' | '\x0B')
}

impl<'a> Tokens<'a> {
    fn fail(&mut self, err: TokenizeError) -> Option<Result<String, TokenizeError>> {
        self.state = State::Done;
        Some(Err(err))
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<String, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut token = String::new();

        loop {
            if self.state == State::Done {
                return None;
            }

            let Some(c) = self.chars.next() else {
                let state = std::mem::replace(&mut self.state, State::Done);
                return match state {
                    State::ReadingUnescaped => Some(Ok(token)),
                    State::ReadingQuoted | State::JustEscaped => {
                        self.fail(TokenizeError::ExpectedClosingQuote(self.quote))
                    }
                    State::EndOfQuotedToken => Some(Ok(token)),
                    State::SkippingWhitespace | State::Done => None,
                };
            };

            match self.state {
                State::SkippingWhitespace => {
                    if is_whitespace(c) {
                        continue;
                    }
                    if c == self.quote {
                        self.state = State::ReadingQuoted;
                    } else {
                        token.push(c);
                        self.state = State::ReadingUnescaped;
                    }
                }
                State::ReadingUnescaped => {
                    if is_whitespace(c) {
                        self.state = State::SkippingWhitespace;
                        return Some(Ok(token));
                    }
                    token.push(c);
                }
                State::ReadingQuoted => {
                    if c == self.quote {
                        self.state = State::EndOfQuotedToken;
                    } else if c == self.escape {
                        self.state = State::JustEscaped;
                    } else {
                        token.push(c);
                    }
                }
                State::JustEscaped => {
                    token.push(c);
                    self.state = State::ReadingQuoted;
                }
                State::EndOfQuotedToken => {
                    if !is_whitespace(c) {
                        return self.fail(TokenizeError::ExpectedWhitespaceAfterQuote(self.quote));
                    }
                    self.state = State::SkippingWhitespace;
                    return Some(Ok(token));
                }
                State::Done => return None,
            }
        }
    }
}
