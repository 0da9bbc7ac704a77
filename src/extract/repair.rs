//! Best-effort repair of near-JSON text.
//!
//! Models routinely emit arguments that are almost JSON: single quotes,
//! unquoted keys, trailing commas, Python literals, or a value cut off
//! mid-string when generation stops. [`repair_and_parse`] tries a strict
//! parse first and falls back to a lenient recursive-descent reader that
//! builds a [`serde_json::Value`] directly.

use serde_json::{Map, Number, Value};
use thiserror::Error;

const MAX_NESTING: usize = 128;

/// Why text could not be turned into a structured value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepairError {
    #[error("no JSON object or array found")]
    NoStructure,

    #[error("unexpected character '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("nesting deeper than {MAX_NESTING} levels")]
    TooDeep,
}

/// Repair `text` and parse it into a structured value.
///
/// Leading prose and markdown code fences are skipped; trailing garbage after
/// the first complete top-level value is ignored. Unterminated strings,
/// objects and arrays are closed at end of input.
pub fn repair_and_parse(text: &str) -> Result<Value, RepairError> {
    let trimmed = strip_code_fence(text.trim());
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed
        .find(|c| c == '{' || c == '[')
        .ok_or(RepairError::NoStructure)?;
    let mut reader = LenientReader::new(&trimmed[start..]);
    reader.value(0)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json) along with the fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn is_structural(c: char) -> bool {
    matches!(c, ',' | ':' | '{' | '}' | '[' | ']')
}

struct LenientReader {
    chars: Vec<char>,
    pos: usize,
}

impl LenientReader {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn unexpected(&self, found: char) -> RepairError {
        RepairError::Unexpected {
            found,
            offset: self.pos,
        }
    }

    /// Skip whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.pos += 1;
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while self.peek().is_some() {
                        if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, RepairError> {
        if depth > MAX_NESTING {
            return Err(RepairError::TooDeep);
        }
        self.skip_trivia();
        match self.peek() {
            None => Ok(Value::Null),
            Some('{') => self.object(depth),
            Some('[') => self.array(depth),
            Some(quote @ ('"' | '\'')) => Ok(Value::String(self.string(quote))),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => Ok(self.number()),
            Some(c) if !is_structural(c) => Ok(self.bare_value()),
            Some(c) => Err(self.unexpected(c)),
        }
    }

    fn object(&mut self, depth: usize) -> Result<Value, RepairError> {
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            let key = match self.peek() {
                None => break,
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(quote @ ('"' | '\'')) => self.string(quote),
                Some(c) if !is_structural(c) => self.bare_key(),
                Some(c) => return Err(self.unexpected(c)),
            };

            self.skip_trivia();
            match self.peek() {
                // Truncated right after a key: drop the dangling key.
                None => break,
                Some(':') => {
                    self.bump();
                }
                Some('}' | ',') => {
                    map.insert(key, Value::Null);
                    continue;
                }
                // Missing colon; read the value anyway.
                Some(_) => {}
            }

            self.skip_trivia();
            match self.peek() {
                None => break,
                Some('}' | ',') => {
                    map.insert(key, Value::Null);
                }
                Some(_) => {
                    let value = self.value(depth + 1)?;
                    map.insert(key, value);
                }
            }
        }
        Ok(Value::Object(map))
    }

    fn array(&mut self, depth: usize) -> Result<Value, RepairError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => break,
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                }
                Some(_) => items.push(self.value(depth + 1)?),
            }
        }
        Ok(Value::Array(items))
    }

    /// Read a quoted string; an unterminated string runs to end of input.
    ///
    /// A quote closes the string only when the next significant character is
    /// a separator or the input ends. Any other quote is kept as content, so
    /// `"He said "hi" to me"` stays one string.
    fn string(&mut self, quote: char) -> String {
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == quote {
                if self.quote_closes() {
                    break;
                }
                out.push(c);
                continue;
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump() {
                None => break,
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('b') => out.push('\u{8}'),
                Some('f') => out.push('\u{c}'),
                Some('u') => out.push(self.unicode_escape()),
                Some(c @ ('"' | '\'' | '\\' | '/')) => out.push(c),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
        out
    }

    fn quote_closes(&self) -> bool {
        self.chars[self.pos..]
            .iter()
            .find(|c| !c.is_whitespace())
            .map_or(true, |&c| matches!(c, ',' | '}' | ']' | ':'))
    }

    fn hex4(&mut self) -> Option<u32> {
        let digits: String = (0..4).filter_map(|i| self.peek_at(i)).collect();
        if digits.len() != 4 {
            return None;
        }
        let code = u32::from_str_radix(&digits, 16).ok()?;
        self.pos += 4;
        Some(code)
    }

    fn unicode_escape(&mut self) -> char {
        let Some(high) = self.hex4() else {
            return char::REPLACEMENT_CHARACTER;
        };
        if (0xD800..0xDC00).contains(&high)
            && self.peek() == Some('\\')
            && self.peek_at(1) == Some('u')
        {
            self.pos += 2;
            if let Some(low) = self.hex4() {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                return char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER);
            }
        }
        char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// A token that starts like a number. Anything up to the next separator
    /// that does not parse as one (`1.2.3`, `2024-01-01`, `2024_report.txt`)
    /// is kept as a string.
    fn number(&mut self) -> Value {
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | '}' | ']') {
                break;
            }
            literal.push(c);
            self.pos += 1;
        }
        // A value cut off mid-exponent or mid-fraction ("12e", "3.").
        let cleaned = literal
            .trim_start_matches('+')
            .trim_end_matches(|c| matches!(c, 'e' | 'E' | '+' | '-' | '.'));

        if let Ok(int) = cleaned.parse::<i64>() {
            return Value::Number(int.into());
        }
        if let Ok(uint) = cleaned.parse::<u64>() {
            return Value::Number(uint.into());
        }
        let is_numeric = cleaned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|_| is_numeric)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(literal))
    }

    fn bare_key(&mut self) -> String {
        let mut key = String::new();
        while let Some(c) = self.peek() {
            if is_structural(c) {
                break;
            }
            key.push(c);
            self.pos += 1;
        }
        key.trim().to_string()
    }

    /// An unquoted value runs to the next separator or line end.
    fn bare_value(&mut self) -> Value {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, ',' | '}' | ']' | '\n') {
                break;
            }
            word.push(c);
            self.pos += 1;
        }
        match word.trim() {
            "true" | "True" | "TRUE" => Value::Bool(true),
            "false" | "False" | "FALSE" => Value::Bool(false),
            "null" | "None" | "NULL" | "undefined" => Value::Null,
            other => Value::String(other.to_string()),
        }
    }
}
