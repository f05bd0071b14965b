//! Row keys and their one-line textual form in the key buffer.
//!
//! A [`RowKey`] knows how to pull itself out of a scanned record, how to turn
//! into a store [`UserKey`] for point lookups, and how to round-trip through
//! a single buffer line. Lines never contain `\n` or `\r`.

use std::{fmt::Debug, hash::Hash, num::ParseIntError, str::Utf8Error};

use crate::store::{Record, UserKey};

/// Failure to decode one buffer line into a key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyDecodeError {
    /// Not a decimal integer.
    #[error("invalid integer key: {0}")]
    Int(#[from] ParseIntError),
    /// Backslash followed by an unknown character, or dangling at the end.
    #[error("invalid escape sequence at byte {0}")]
    Escape(usize),
    /// Dynamic key line without a known `i:`/`s:`/`b:` tag.
    #[error("unknown key tag in {0:?}")]
    Tag(String),
    /// Malformed hex in a bytes key.
    #[error("invalid hex digits in bytes key")]
    Hex,
    /// The line is not UTF-8 text.
    #[error("key line is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),
}

/// A primary-key type the index can hold.
pub trait RowKey: Clone + Debug + Eq + Hash {
    /// Convert a store key, `None` if the store key has another type.
    fn from_user_key(key: &UserKey) -> Option<Self>;

    /// Store key used to address this row.
    fn to_user_key(&self) -> UserKey;

    /// Append the one-line textual form of this key to `out`, without the
    /// trailing newline.
    fn encode_line(&self, out: &mut String);

    /// Parse a line produced by [`RowKey::encode_line`].
    fn decode_line(line: &str) -> Result<Self, KeyDecodeError>;

    /// Extract the key of a scanned record.
    ///
    /// The record's stored user key is tried first; when the server did not
    /// send one back, or it does not convert, the value of `key_column` is
    /// used instead.
    fn from_record(record: &Record, key_column: &str) -> Option<Self> {
        if let Some(key) = record.key.as_ref().and_then(Self::from_user_key) {
            return Some(key);
        }
        record
            .get(key_column)
            .and_then(|value| value.as_user_key())
            .and_then(|key| Self::from_user_key(&key))
    }
}

impl RowKey for i64 {
    fn from_user_key(key: &UserKey) -> Option<Self> {
        match key {
            UserKey::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn to_user_key(&self) -> UserKey {
        UserKey::Int(*self)
    }

    fn encode_line(&self, out: &mut String) {
        out.push_str(&self.to_string());
    }

    fn decode_line(line: &str) -> Result<Self, KeyDecodeError> {
        Ok(line.trim().parse::<i64>()?)
    }
}

impl RowKey for String {
    fn from_user_key(key: &UserKey) -> Option<Self> {
        match key {
            UserKey::Str(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn to_user_key(&self) -> UserKey {
        UserKey::Str(self.clone())
    }

    fn encode_line(&self, out: &mut String) {
        escape_into(self, out);
    }

    fn decode_line(line: &str) -> Result<Self, KeyDecodeError> {
        unescape(line)
    }
}

impl RowKey for UserKey {
    fn from_user_key(key: &UserKey) -> Option<Self> {
        Some(key.clone())
    }

    fn to_user_key(&self) -> UserKey {
        self.clone()
    }

    fn encode_line(&self, out: &mut String) {
        match self {
            UserKey::Int(v) => {
                out.push_str("i:");
                out.push_str(&v.to_string());
            }
            UserKey::Str(v) => {
                out.push_str("s:");
                escape_into(v, out);
            }
            UserKey::Bytes(v) => {
                out.push_str("b:");
                for b in v {
                    out.push(hex_digit(b >> 4));
                    out.push(hex_digit(b & 0x0f));
                }
            }
        }
    }

    fn decode_line(line: &str) -> Result<Self, KeyDecodeError> {
        if let Some(rest) = line.strip_prefix("i:") {
            Ok(UserKey::Int(rest.parse::<i64>()?))
        } else if let Some(rest) = line.strip_prefix("s:") {
            Ok(UserKey::Str(unescape(rest)?))
        } else if let Some(rest) = line.strip_prefix("b:") {
            decode_hex(rest).map(UserKey::Bytes)
        } else {
            Err(KeyDecodeError::Tag(line.to_string()))
        }
    }
}

fn escape_into(raw: &str, out: &mut String) {
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

fn unescape(line: &str) -> Result<String, KeyDecodeError> {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.char_indices();
    while let Some((pos, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, '\\')) => out.push('\\'),
            Some((_, 'n')) => out.push('\n'),
            Some((_, 'r')) => out.push('\r'),
            _ => return Err(KeyDecodeError::Escape(pos)),
        }
    }
    Ok(out)
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(u32::from(nibble), 16).unwrap_or('0')
}

fn decode_hex(digits: &str) -> Result<Vec<u8>, KeyDecodeError> {
    if digits.len() % 2 != 0 {
        return Err(KeyDecodeError::Hex);
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or(KeyDecodeError::Hex)
        })
        .collect()
}
