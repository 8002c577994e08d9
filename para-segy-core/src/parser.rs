//! The sparse, reversible mapping between a metadata field's logical value
//! and the byte ranges it occupies in a trace header blob.
//!
//! A parser declares the byte ranges it needs via [`BlobParser::data_locations`];
//! the orchestrating layer fills in live byte slices for those ranges and
//! hands them back for decoding or encoding. This keeps single-field updates
//! from materialising whole 240-byte headers, and lets many parsers share
//! the same underlying blob.
use crate::bitconverter::Be;
use crate::enums::{EntryType, FieldKind};
use crate::errors::PsgError;
use crate::keys::{TraceField, TraceHeaderOffset};
use crate::segy::parse_scalar;
use crate::TRACE_HEADER_LEN;

use tinyvec::TinyVec;

/// One byte range within a blob, `begin..end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteRange {
    pub begin: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(begin: usize, end: usize) -> Self {
        ByteRange { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A byte range of a blob together with the live bytes backing it.
#[derive(Debug)]
pub struct DataReadLocation<'a> {
    pub range: ByteRange,
    pub data: &'a [u8],
}

/// The mutable counterpart of [`DataReadLocation`].
#[derive(Debug)]
pub struct DataWriteLocation<'a> {
    pub range: ByteRange,
    pub data: &'a mut [u8],
}

/// The native value a parser produces or consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Integer(i64),
    FloatingPoint(f64),
    Index(u64),
    Raw(Vec<u8>),
}

/// A parser for one logical field of a trace header.
///
/// The byte locations are 1-indexed, as printed in the SEG-Y standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobParser {
    /// Copy the full trace header without parsing.
    RawCopy,
    /// A big-endian i16 at `loc`.
    Short { loc: usize },
    /// A big-endian i32 at `loc`.
    Long { loc: usize },
    /// An i32 at `loc`, scaled by the i16 scalar at `scalar_loc`.
    ScaledLong { loc: usize, scalar_loc: usize },
    /// In-memory bookkeeping; occupies no bytes of the blob.
    Index,
}

fn find_read<'a, 'b>(
    locations: &'b [DataReadLocation<'a>],
    range: ByteRange,
) -> Result<&'b DataReadLocation<'a>, PsgError> {
    locations
        .iter()
        .find(|l| l.range == range)
        .ok_or_else(|| PsgError::BitConversionError {
            msg: format!("no data location covers bytes {}..{}", range.begin, range.end),
        })
}

fn find_write<'a, 'c>(
    locations: &'c mut [DataWriteLocation<'a>],
    range: ByteRange,
) -> Result<&'c mut DataWriteLocation<'a>, PsgError> {
    locations
        .iter_mut()
        .find(|l| l.range == range)
        .ok_or_else(|| PsgError::BitConversionError {
            msg: format!("no data location covers bytes {}..{}", range.begin, range.end),
        })
}

impl BlobParser {
    /// The kind of rule entry this parser implements.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::RawCopy => FieldKind::Copy,
            Self::Short { .. } => FieldKind::Short,
            Self::Long { .. } => FieldKind::Long,
            Self::ScaledLong { .. } => FieldKind::Float,
            Self::Index => FieldKind::Index,
        }
    }

    /// How many disjoint byte ranges this field touches.
    pub fn number_of_data_locations(&self) -> usize {
        match self {
            Self::RawCopy => 1,
            Self::Short { .. } | Self::Long { .. } => 1,
            Self::ScaledLong { .. } => 2,
            Self::Index => 0,
        }
    }

    /// The byte ranges this field needs, ascending by `begin`.
    pub fn data_locations(&self) -> TinyVec<[ByteRange; 2]> {
        let mut locations: TinyVec<[ByteRange; 2]> = TinyVec::default();
        match *self {
            Self::RawCopy => locations.push(ByteRange::new(0, TRACE_HEADER_LEN)),
            Self::Short { loc } => locations.push(ByteRange::new(loc - 1, loc + 1)),
            Self::Long { loc } => locations.push(ByteRange::new(loc - 1, loc + 3)),
            Self::ScaledLong { loc, scalar_loc } => {
                locations.push(ByteRange::new(scalar_loc - 1, scalar_loc + 1));
                locations.push(ByteRange::new(loc - 1, loc + 3));
                locations.sort_unstable_by_key(|r| r.begin);
            }
            Self::Index => {}
        }
        locations
    }

    /// The native representation produced on read.
    pub fn parsed_type(&self) -> (EntryType, usize) {
        match self {
            Self::RawCopy => (EntryType::U8, TRACE_HEADER_LEN),
            _ => (self.kind().parsed_type(), 1),
        }
    }

    /// Decode this field out of the given locations, which must cover at
    /// least the ranges of [`BlobParser::data_locations`].
    pub fn read(&self, locations: &[DataReadLocation]) -> Result<ParsedValue, PsgError> {
        match *self {
            Self::RawCopy => {
                let location = find_read(locations, ByteRange::new(0, TRACE_HEADER_LEN))?;
                Ok(ParsedValue::Raw(location.data.to_vec()))
            }
            Self::Short { loc } => {
                let location = find_read(locations, ByteRange::new(loc - 1, loc + 1))?;
                Ok(ParsedValue::Integer(i16::from_be_slice(location.data)? as i64))
            }
            Self::Long { loc } => {
                let location = find_read(locations, ByteRange::new(loc - 1, loc + 3))?;
                Ok(ParsedValue::Integer(i32::from_be_slice(location.data)? as i64))
            }
            Self::ScaledLong { loc, scalar_loc } => {
                let scalar_location =
                    find_read(locations, ByteRange::new(scalar_loc - 1, scalar_loc + 1))?;
                let scalar = parse_scalar(i16::from_be_slice(scalar_location.data)?);

                let location = find_read(locations, ByteRange::new(loc - 1, loc + 3))?;
                let unscaled = i32::from_be_slice(location.data)?;

                Ok(ParsedValue::FloatingPoint(scalar * unscaled as f64))
            }
            Self::Index => Err(PsgError::BitConversionError {
                msg: "index entries are not stored in a blob".to_string(),
            }),
        }
    }

    /// Encode `value` into the given locations.
    ///
    /// A [`BlobParser::ScaledLong`] reads the already-present scalar out of
    /// the blob, divides the native value by it, and stores the rounded i32;
    /// the orchestrator is expected to have written the scalar first.
    pub fn write(
        &self,
        locations: &mut [DataWriteLocation],
        value: &ParsedValue,
    ) -> Result<(), PsgError> {
        match (*self, value) {
            (Self::RawCopy, ParsedValue::Raw(bytes)) => {
                let location = find_write(locations, ByteRange::new(0, TRACE_HEADER_LEN))?;
                location.data.copy_from_slice(bytes);
                Ok(())
            }
            (Self::Short { loc }, ParsedValue::Integer(v)) => {
                let location = find_write(locations, ByteRange::new(loc - 1, loc + 1))?;
                location.data.copy_from_slice(&(*v as i16).to_be_bytes());
                Ok(())
            }
            (Self::Long { loc }, ParsedValue::Integer(v)) => {
                let location = find_write(locations, ByteRange::new(loc - 1, loc + 3))?;
                location.data.copy_from_slice(&(*v as i32).to_be_bytes());
                Ok(())
            }
            (Self::ScaledLong { loc, scalar_loc }, ParsedValue::FloatingPoint(v)) => {
                let scalar = {
                    let scalar_location =
                        find_write(locations, ByteRange::new(scalar_loc - 1, scalar_loc + 1))?;
                    parse_scalar(i16::from_be_slice(scalar_location.data)?)
                };

                let scaled = (*v / scalar).round() as i32;
                let location = find_write(locations, ByteRange::new(loc - 1, loc + 3))?;
                location.data.copy_from_slice(&scaled.to_be_bytes());
                Ok(())
            }
            (Self::Index, _) => Err(PsgError::BitConversionError {
                msg: "index entries are not stored in a blob".to_string(),
            }),
            (parser, value) => Err(PsgError::BitConversionError {
                msg: format!("{:?} cannot encode {:?}", parser, value),
            }),
        }
    }
}

/// The fixed SEG-Y mapping from a field key to its standard parser.
///
/// Keys without an on-disk location (the in-memory trace numbers) return
/// `None`; rule sets add those as index entries instead.
pub fn make_segy_parser(field: TraceField) -> Option<BlobParser> {
    use self::TraceHeaderOffset as O;

    let single_long = |offset: O| Some(BlobParser::Long { loc: offset.location() });
    let single_short = |offset: O| Some(BlobParser::Short { loc: offset.location() });
    let scaled = |offset: O, scalar: O| {
        Some(BlobParser::ScaledLong {
            loc: offset.location(),
            scalar_loc: scalar.location(),
        })
    };

    match field {
        TraceField::Raw => Some(BlobParser::RawCopy),

        TraceField::LineTraceIndex => single_long(O::LineTraceIndex),
        TraceField::FileTraceIndex => single_long(O::FileTraceIndex),
        TraceField::OfrTraceIndex => single_long(O::OfrTraceIndex),
        TraceField::EnsembleTraceIndex => single_long(O::EnsembleTraceIndex),
        TraceField::EnergySourceNumber => single_long(O::EnergySourceNumber),
        TraceField::SourceReceiverDistance => single_long(O::SourceReceiverDistance),
        TraceField::Inline => single_long(O::Inline),
        TraceField::Crossline => single_long(O::Crossline),

        TraceField::NumberOfSamples => single_short(O::NumberOfSamples),
        TraceField::SampleInterval => single_short(O::SampleInterval),
        TraceField::TraceIdCode => single_short(O::TraceIdCode),
        TraceField::VStackCount => single_short(O::VStackCount),
        TraceField::HStackCount => single_short(O::HStackCount),
        TraceField::CoordinateScalar => single_short(O::CoordinateScalar),
        TraceField::TraceValueUnit => single_short(O::TraceValueUnit),
        TraceField::TransductionUnit => single_short(O::TransductionUnit),

        TraceField::ReceiverElevation => scaled(O::ReceiverElevation, O::ElevationScalar),
        TraceField::SurfaceElevationAtSource => {
            scaled(O::SurfaceElevationAtSource, O::ElevationScalar)
        }
        TraceField::SourceDepth => scaled(O::SourceDepth, O::ElevationScalar),
        TraceField::WaterDepthAtSource => scaled(O::WaterDepthAtSource, O::ElevationScalar),
        TraceField::WaterDepthAtReceiver => scaled(O::WaterDepthAtReceiver, O::ElevationScalar),
        TraceField::ShotpointNumber => scaled(O::ShotpointNumber, O::ShotpointScalar),

        TraceField::SourceX => scaled(O::SourceX, O::CoordinateScalar),
        TraceField::SourceY => scaled(O::SourceY, O::CoordinateScalar),
        TraceField::ReceiverX => scaled(O::ReceiverX, O::CoordinateScalar),
        TraceField::ReceiverY => scaled(O::ReceiverY, O::CoordinateScalar),
        TraceField::CdpX => scaled(O::CdpX, O::CoordinateScalar),
        TraceField::CdpY => scaled(O::CdpY, O::CoordinateScalar),

        TraceField::Ltn | TraceField::Gtn => None,
    }
}
