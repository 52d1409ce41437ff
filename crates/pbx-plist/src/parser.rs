use std::collections::btree_map::Entry;

use pbx_types::{Dictionary, PlistValue};

use crate::error::{PlistError, PlistResult};

/// Parse old-style property-list text into a value tree.
///
/// The input must contain exactly one top-level value; comments and
/// whitespace may surround it (the `// !$*UTF8*$!` header is an ordinary
/// line comment).
pub fn parse(text: &str) -> PlistResult<PlistValue> {
    let mut parser = Parser::new(text);
    parser.skip_trivia()?;
    let value = parser.value()?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(PlistError::TrailingContent {
            line: parser.line,
            column: parser.column,
        });
    }
    Ok(value)
}

/// Characters that end a bare (unquoted) string.
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')' | '<' | '>' | ';' | ',' | '=' | '"')
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        // A byte-order mark is not part of the content.
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eof(&self) -> PlistError {
        PlistError::UnexpectedEof {
            line: self.line,
            column: self.column,
        }
    }

    fn unexpected(&self, found: char, expected: &'static str) -> PlistError {
        PlistError::UnexpectedChar {
            found,
            expected,
            line: self.line,
            column: self.column,
        }
    }

    /// Skip whitespace, `// line` comments and `/* block */` comments.
    fn skip_trivia(&mut self) -> PlistResult<()> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(PlistError::UnterminatedComment { line, column }),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> PlistResult<()> {
        self.skip_trivia()?;
        match self.peek() {
            Some(c) if c == wanted => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.unexpected(c, expected)),
            None => Err(self.eof()),
        }
    }

    fn value(&mut self) -> PlistResult<PlistValue> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.dictionary(),
            Some('(') => self.array(),
            Some('<') => self.data(),
            Some('"') => self.quoted().map(PlistValue::String),
            Some(c) if !is_delimiter(c) => Ok(PlistValue::String(self.bare())),
            Some(c) => Err(self.unexpected(c, "a value")),
            None => Err(self.eof()),
        }
    }

    fn string(&mut self) -> PlistResult<String> {
        self.skip_trivia()?;
        match self.peek() {
            Some('"') => self.quoted(),
            Some(c) if !is_delimiter(c) => Ok(self.bare()),
            Some(c) => Err(self.unexpected(c, "a string key")),
            None => Err(self.eof()),
        }
    }

    fn dictionary(&mut self) -> PlistResult<PlistValue> {
        self.bump();
        let mut map = Dictionary::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(PlistValue::Dictionary(map));
                }
                None => return Err(self.eof()),
                Some(_) => {}
            }
            let line = self.line;
            let key = self.string()?;
            self.expect('=', "'=' after dictionary key")?;
            let value = self.value()?;
            self.expect(';', "';' after dictionary value")?;
            match map.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(slot) => {
                    return Err(PlistError::DuplicateKey {
                        key: slot.key().clone(),
                        line,
                    });
                }
            }
        }
    }

    fn array(&mut self) -> PlistResult<PlistValue> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(')') => {
                    self.bump();
                    return Ok(PlistValue::Array(items));
                }
                None => return Err(self.eof()),
                Some(_) => {}
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                Some(c) => return Err(self.unexpected(c, "',' or ')' in array")),
                None => return Err(self.eof()),
            }
        }
    }

    fn data(&mut self) -> PlistResult<PlistValue> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut digits = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                Some(c) if c.is_whitespace() => {}
                Some(c) => {
                    return Err(PlistError::InvalidData {
                        reason: format!("unexpected character {c:?}"),
                        line,
                        column,
                    })
                }
                None => return Err(self.eof()),
            }
        }
        let bytes = hex::decode(&digits).map_err(|e| PlistError::InvalidData {
            reason: e.to_string(),
            line,
            column,
        })?;
        Ok(PlistValue::Data(bytes))
    }

    fn bare(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            // `a/*comment*/` is a string followed by a comment.
            if c == '/' && matches!(self.peek_second(), Some('*') | Some('/')) {
                break;
            }
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn quoted(&mut self) -> PlistResult<String> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
                None => return Err(PlistError::UnterminatedString { line, column }),
            }
        }
    }

    fn escape(&mut self) -> PlistResult<char> {
        let (line, column) = (self.line, self.column);
        let invalid = |reason: String| PlistError::InvalidEscape {
            reason,
            line,
            column,
        };
        let c = self.bump().ok_or_else(|| self.eof())?;
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '\\' | '"' | '\'' => c,
            'U' | 'u' => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .bump()
                        .and_then(|d| d.to_digit(16))
                        .ok_or_else(|| invalid("expected four hex digits after \\U".into()))?;
                    code = code * 16 + digit;
                }
                char::from_u32(code).ok_or_else(|| invalid(format!("invalid code point {code:#x}")))?
            }
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            self.bump();
                            code = code * 8 + digit;
                        }
                        None => break,
                    }
                }
                char::from_u32(code).ok_or_else(|| invalid(format!("invalid octal escape {code:o}")))?
            }
            other => return Err(invalid(format!("unknown escape \\{other}"))),
        };
        Ok(decoded)
    }
}
