//! Column types and values.

use std::fmt;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Size of the length header that prefixes every variable-length value.
pub const VARHDRSZ: usize = 4;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOid {
    /// Boolean.
    Bool,
    /// 32-bit integer.
    Int4,
    /// 64-bit integer.
    Int8,
    /// Double precision float.
    Float8,
    /// Unbounded text.
    Text,
    /// Length-limited text.
    Varchar,
    /// Raw bytes.
    Bytea,
}

impl TypeOid {
    /// Returns the type's name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int4 => "int4",
            Self::Int8 => "int8",
            Self::Float8 => "float8",
            Self::Text => "text",
            Self::Varchar => "varchar",
            Self::Bytea => "bytea",
        }
    }

    /// Whether values of this type are stored as length-prefixed byte sequences.
    pub fn is_varlena(&self) -> bool {
        matches!(self, Self::Text | Self::Varchar | Self::Bytea)
    }
}

impl fmt::Display for TypeOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TypeOid {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(Self::Bool),
            "int4" | "integer" | "int" => Ok(Self::Int4),
            "int8" | "bigint" => Ok(Self::Int8),
            "float8" | "double precision" => Ok(Self::Float8),
            "text" => Ok(Self::Text),
            "varchar" | "character varying" => Ok(Self::Varchar),
            "bytea" => Ok(Self::Bytea),
            other => Err(AppError::configuration(format!("Unknown column type '{other}'"))),
        }
    }
}

/// A length-prefixed byte sequence.
///
/// The first [`VARHDRSZ`] bytes hold the total length (header included) as a
/// little-endian `u32`. A value is only well formed when that header matches
/// the number of bytes actually present.
#[derive(Clone, PartialEq, Eq)]
pub struct Varlena(Bytes);

impl Varlena {
    /// Builds a value from its payload, computing the header.
    pub fn from_payload(payload: &[u8]) -> Self {
        let total = VARHDRSZ + payload.len();
        let mut buf = BytesMut::zeroed(total);
        Self::write_header(&mut buf, total);
        buf[VARHDRSZ..].copy_from_slice(payload);
        Self(buf.freeze())
    }

    /// Builds a text value.
    pub fn from_text(text: &str) -> Self {
        Self::from_payload(text.as_bytes())
    }

    /// Wraps raw header-prefixed bytes, rejecting inconsistent headers.
    pub fn from_bytes(raw: Bytes) -> AppResult<Self> {
        let value = Self(raw);
        if !value.is_consistent() {
            return Err(AppError::internal(format!(
                "Length header {} does not match value size {}",
                value.declared_len(),
                value.total_len()
            )));
        }
        Ok(value)
    }

    /// Writes the header for a value of `total` bytes into the start of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`VARHDRSZ`].
    pub fn write_header(buf: &mut [u8], total: usize) {
        let header = u32::try_from(total).unwrap_or(u32::MAX);
        buf[..VARHDRSZ].copy_from_slice(&header.to_le_bytes());
    }

    /// The length recorded in the header.
    pub fn declared_len(&self) -> usize {
        if self.0.len() < VARHDRSZ {
            return 0;
        }
        let mut header = [0u8; VARHDRSZ];
        header.copy_from_slice(&self.0[..VARHDRSZ]);
        u32::from_le_bytes(header) as usize
    }

    /// Number of bytes present, header included.
    pub fn total_len(&self) -> usize {
        self.0.len()
    }

    /// Number of payload bytes.
    pub fn payload_len(&self) -> usize {
        self.0.len().saturating_sub(VARHDRSZ)
    }

    /// The bytes after the header.
    pub fn payload(&self) -> &[u8] {
        self.0.get(VARHDRSZ..).unwrap_or_default()
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.payload()).ok()
    }

    /// The full header-prefixed representation.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Whether the header agrees with the number of bytes present.
    pub fn is_consistent(&self) -> bool {
        self.0.len() >= VARHDRSZ && self.declared_len() == self.0.len()
    }

    pub(crate) fn from_raw(raw: Bytes) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Varlena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Varlena")
            .field("len", &self.declared_len())
            .field("payload", &String::from_utf8_lossy(self.payload()))
            .finish()
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit integer.
    Int4(i32),
    /// 64-bit integer.
    Int8(i64),
    /// Double precision float.
    Float8(f64),
    /// Length-prefixed value (text, varchar, bytea).
    Varlena(Varlena),
}

impl Datum {
    /// Convenience constructor for a text value.
    pub fn text(text: &str) -> Self {
        Self::Varlena(Varlena::from_text(text))
    }

    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the length-prefixed value, if this is one.
    pub fn as_varlena(&self) -> Option<&Varlena> {
        match self {
            Self::Varlena(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int4(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Float8(v) => write!(f, "{v}"),
            Self::Varlena(v) => write!(f, "{}", String::from_utf8_lossy(v.payload())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_sets_header() {
        let value = Varlena::from_text("abc");
        assert_eq!(value.total_len(), 7);
        assert_eq!(value.declared_len(), 7);
        assert_eq!(value.payload(), b"abc");
        assert!(value.is_consistent());
    }

    #[test]
    fn test_from_bytes_rejects_bad_header() {
        let mut raw = vec![0u8; 6];
        raw[..4].copy_from_slice(&9u32.to_le_bytes());
        assert!(Varlena::from_bytes(Bytes::from(raw)).is_err());
    }

    #[test]
    fn test_empty_payload() {
        let value = Varlena::from_payload(&[]);
        assert_eq!(value.total_len(), VARHDRSZ);
        assert_eq!(value.payload_len(), 0);
        assert!(value.is_consistent());
    }

    #[test]
    fn test_type_names() {
        assert_eq!("VARCHAR".parse::<TypeOid>().expect("parse"), TypeOid::Varchar);
        assert_eq!("text".parse::<TypeOid>().expect("parse"), TypeOid::Text);
        assert!("geometry".parse::<TypeOid>().is_err());
        assert!(TypeOid::Text.is_varlena());
        assert!(!TypeOid::Int4.is_varlena());
    }
}
