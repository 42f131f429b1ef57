/*!
Error types shared by the decoder, the filter engine and the iterators.
*/
use crate::models::EntryType;
use num_enum::{TryFromPrimitive, TryFromPrimitiveError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    /// A wire value does not map to any variant of the enum named by
    /// `type_name`. Produced by the [num_enum::TryFromPrimitiveError]
    /// conversion below for all primitive enums in the data model.
    #[error("unrecognized value {value} for {type_name}")]
    UnrecognizedEnumVariant { type_name: &'static str, value: u64 },

    /// The MRT entry type is known but this parser does not decode it,
    /// e.g. OSPF or ISIS records in a mixed archive.
    #[error("unsupported MRT type {mrt_type:?} subtype {subtype}")]
    UnsupportedMrtType { mrt_type: EntryType, subtype: u16 },

    /// An address mask larger than the address it applies to.
    #[error("invalid network prefix mask")]
    InvalidPrefixLength(#[from] ipnet::PrefixLenError),

    /// General IO error from the underlying reader.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// Error from opening or downloading a local/remote source.
    #[error(transparent)]
    RemoteIoError(#[from] oneio::OneIoError),

    /// The record body ended before a length-prefixed field could be read.
    #[error("input ended before {expected} byte(s) could be read")]
    ShortInput { expected: usize },

    /// A message declared more content than its container carries.
    #[error("truncated message: {0}")]
    TruncatedMsg(String),

    /// Any other malformed field.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Invalid filter name or filter value.
    #[error("filter error: {0}")]
    FilterError(String),

    /// Clean end of the MRT stream. Iterators translate this into `None`.
    #[error("end of MRT stream")]
    EofExpected,
}

impl<T> From<TryFromPrimitiveError<T>> for ParserError
where
    T: TryFromPrimitive,
    T::Primitive: Into<u64>,
{
    #[inline]
    fn from(value: TryFromPrimitiveError<T>) -> Self {
        ParserError::UnrecognizedEnumVariant {
            type_name: T::NAME,
            value: value.number.into(),
        }
    }
}
