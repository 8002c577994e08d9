//! This contains the enums that describe the interpretation of a SEG-Y file
//! and of the in-memory trace metadata.
//!
//! The SEG-Y format uses numeric codes in the binary file header to convey how
//! trace data is to be interpreted (see the
//! [SEG-Y_r2.0 document](<https://seg.org/Portals/0/SEG/News%20and%20Resources/Technical%20Standards/seg_y_rev2_0-mar2017.pdf>)
//! (January 2017) table 2). This library reads and writes the two
//! floating point sample formats only, so the sample format enum here is
//! deliberately restricted: any other code is reported as unsupported rather
//! than parsed and carried around.
use num::FromPrimitive;
#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// From bytes 3225-3226 (25-26) of the binary header. Only the two IEEE/IBM
/// single precision float formats are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum SegyNumberFormat {
    IbmFloat32 = 1,
    IeeeFloat32 = 5,
}

impl std::fmt::Display for SegyNumberFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "{:?}", self)
    }
}

impl SegyNumberFormat {
    pub fn new(source: u16) -> Result<Self, PsgError> {
        SegyNumberFormat::from_u16(source).ok_or(PsgError::UnsupportedFormat { code: source })
    }

    /// The byte length of a single sample. Both supported formats are 4-byte.
    pub fn datum_byte_length(self) -> usize {
        match self {
            Self::IbmFloat32 => 4,
            Self::IeeeFloat32 => 4,
        }
    }
}

/// The encoding used for the 3200-byte text header.
///
/// Reading autodetects the encoding; writing uses the encoding selected in
/// the settings (ASCII unless told otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum TextEncoding {
    Ascii,
    Ebcdic,
}

/// The kind of a rule entry, which selects the column of [`crate::metadata::TraceMetadata`]
/// the entry lives in and how it is moved to and from the trace header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum FieldKind {
    /// A coordinate-scaled value: an i32 on disk, scaled into an f64 in memory.
    Float,
    /// A plain big-endian i32 on disk, widened to i64 in memory.
    Long,
    /// A plain big-endian i16 on disk, widened to i64 in memory.
    Short,
    /// In-memory only bookkeeping (u64); never touches the file.
    Index,
    /// A verbatim copy of the whole 240-byte trace header.
    Copy,
}

/// The native type tag a blob parser produces, together with
/// [`EntryType::size_of`] used for sizing buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum EntryType {
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Index,
}

impl EntryType {
    pub fn size_of(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F64 | Self::I64 | Self::U64 | Self::Index => 8,
        }
    }
}

impl FieldKind {
    /// The native representation produced when an entry of this kind is
    /// parsed from a trace header.
    pub fn parsed_type(self) -> EntryType {
        match self {
            Self::Float => EntryType::F64,
            Self::Long => EntryType::I32,
            Self::Short => EntryType::I16,
            Self::Index => EntryType::Index,
            Self::Copy => EntryType::U8,
        }
    }
}
