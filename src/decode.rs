//! Tokenizer for the parenthesized data of IMAP responses.
//!
//! `FETCH`, `ENVELOPE` and `BODYSTRUCTURE` payloads are nested parenthesized
//! lists mixing atoms, quoted strings, `BODY[...]` item names and `{n}`
//! literal markers. [`decode`] turns one such line into a [`Token`] tree in a
//! single left-to-right pass. The cursor lives on the decoder value, so
//! nested lists recurse through the same state and the whole thing is
//! reentrant.

use std::mem;

/// One node decoded from response data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    /// The `NIL` atom.
    Nil,
    /// An unquoted run of ASCII digits.
    Number(i64),
    /// An atom or quoted string; quotes and escapes are resolved.
    Text(String),
    /// A `BODY[...]`-shaped item name, brackets (and any `<origin>` suffix)
    /// kept verbatim.
    Section(String),
    /// A parenthesized list.
    List(Vec<Token>),
}

impl Token {
    /// The token's text, for `Text` and `Section` tokens.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Text(s) | Token::Section(s) => Some(s),
            _ => None,
        }
    }

    /// The token's numeric value, for `Number` tokens.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Token::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The token's children, for `List` tokens.
    pub fn as_list(&self) -> Option<&[Token]> {
        match self {
            Token::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this token is `NIL`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Token::Nil)
    }
}

/// Decode one line of response data into a token sequence.
///
/// A leading `(` groups the remainder of the line; an unmatched close is
/// treated as end of input. `{`, CR and LF are consumed silently, since
/// literal payloads are carried out of band and only the `{n}` octet count
/// matters here.
pub fn decode(input: &str) -> Vec<Token> {
    Decoder::new(input).decode()
}

struct Decoder {
    chars: Vec<char>,
    index: usize,
}

impl Decoder {
    fn new(input: &str) -> Decoder {
        Decoder {
            chars: input.chars().collect(),
            index: 0,
        }
    }

    fn decode(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut quoted = false;
        let mut was_quoted = false;
        let mut section = false;
        let mut has_section = false;

        if self.chars.get(self.index) == Some(&'(') {
            self.index += 1;
        }

        while self.index < self.chars.len() {
            let c = self.chars[self.index];
            self.index += 1;

            if quoted {
                match c {
                    // backslash escapes the next character
                    '\\' => {
                        if let Some(&escaped) = self.chars.get(self.index) {
                            text.push(escaped);
                            self.index += 1;
                        }
                    }
                    '"' => quoted = false,
                    _ => text.push(c),
                }
            } else if section {
                if c == ']' {
                    section = false;
                }
                text.push(c);
            } else {
                match c {
                    '"' => {
                        quoted = true;
                        was_quoted = true;
                    }
                    '[' => {
                        section = true;
                        has_section = true;
                        text.push(c);
                    }
                    '(' => {
                        self.index -= 1;
                        tokens.push(Token::List(self.decode()));
                    }
                    '{' | '\r' | '\n' => {}
                    ' ' | '\t' | '}' | ')' => {
                        if !text.is_empty() || was_quoted {
                            tokens.push(classify(
                                mem::take(&mut text),
                                was_quoted,
                                has_section,
                            ));
                            was_quoted = false;
                            has_section = false;
                        }
                        if c == ')' {
                            return tokens;
                        }
                    }
                    _ => text.push(c),
                }
            }
        }

        if !text.is_empty() || was_quoted {
            tokens.push(classify(text, was_quoted, has_section));
        }
        tokens
    }
}

fn classify(text: String, was_quoted: bool, has_section: bool) -> Token {
    if has_section {
        Token::Section(text)
    } else if was_quoted {
        // a quoted string is always a string, even "NIL" or "123"
        Token::Text(text)
    } else if text == "NIL" {
        Token::Nil
    } else if text.chars().all(|c| c.is_ascii_digit()) {
        match text.parse() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Text(text),
        }
    } else {
        Token::Text(text)
    }
}
