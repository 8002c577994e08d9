// Copyright (C) 2023 by GiGa infosystems
//! The on-disk SEG-Y layout arithmetic, the coordinate scalar mechanism and
//! the passes that move trace metadata between a staging buffer and a
//! [`TraceMetadata`] container.
//!
//! A SEG-Y file is a 3200-byte text header, a 400-byte binary header, and
//! then `nt` traces of `240 + 4 * ns` bytes each. Everything here is pure
//! arithmetic and byte shuffling; no I/O happens in this module.
use crate::enums::FieldKind;
use crate::errors::PsgError;
use crate::keys::TraceField;
use crate::metadata::TraceMetadata;
use crate::parser::{BlobParser, ByteRange, DataReadLocation, DataWriteLocation, ParsedValue};
use crate::{FILE_HEADER_LEN, TRACE_HEADER_LEN};

use fnv::FnvHashMap;

/// The byte length of one sample in the supported number formats.
pub const DATUM_LEN: usize = 4;

/// The byte length of the sample vector of one trace.
pub fn trace_data_size(samples_per_trace: usize) -> usize {
    DATUM_LEN * samples_per_trace
}

/// The byte length of one whole trace, header included.
pub fn trace_size(samples_per_trace: usize) -> usize {
    TRACE_HEADER_LEN + trace_data_size(samples_per_trace)
}

/// The file offset of trace `trace_index`.
pub fn trace_location(trace_index: u64, samples_per_trace: usize) -> u64 {
    FILE_HEADER_LEN as u64 + trace_index * trace_size(samples_per_trace) as u64
}

/// The file offset of the sample vector of trace `trace_index`.
pub fn trace_data_location(trace_index: u64, samples_per_trace: usize) -> u64 {
    trace_location(trace_index, samples_per_trace) + TRACE_HEADER_LEN as u64
}

/// The number of traces in a file of `file_size` bytes. A trace area that is
/// not a whole number of traces means the file is corrupt.
pub fn number_of_traces(file_size: u64, samples_per_trace: usize) -> Result<u64, PsgError> {
    let trace_area = file_size.checked_sub(FILE_HEADER_LEN as u64).ok_or_else(|| {
        PsgError::CorruptFile {
            msg: format!(
                "file is {} bytes, shorter than the {}-byte file header",
                file_size, FILE_HEADER_LEN
            ),
        }
    })?;

    let trace_size = trace_size(samples_per_trace) as u64;
    if trace_area % trace_size != 0 {
        return Err(PsgError::CorruptFile {
            msg: format!(
                "trace area of {} bytes is not a whole number of {}-byte traces",
                trace_area, trace_size
            ),
        });
    }
    Ok(trace_area / trace_size)
}

/// Parse a SEG-Y scalar: positive means multiply, negative divide by the
/// magnitude, and zero is unscaled.
/// ```
/// # use para_segy_core::segy::parse_scalar;
/// assert_eq!(parse_scalar(100), 100.);
/// assert_eq!(parse_scalar(-100), 0.01);
/// assert_eq!(parse_scalar(0), 1.);
/// ```
pub fn parse_scalar(segy_scalar: i16) -> f64 {
    if segy_scalar == 0 {
        return 1.0;
    }
    if segy_scalar > 0 {
        segy_scalar as f64
    } else {
        1.0 / -(segy_scalar as f64)
    }
}

/// Choose the SEG-Y scalar that stores `value` as a scaled i32 with the
/// least precision loss.
///
/// If the integer part of the value overflows an i32, the smallest positive
/// power of ten that brings it back into range is returned (0 if none can).
/// Otherwise the most negative scalar that still preserves the fractional
/// digits is chosen, and 1 if the value is integral.
pub fn find_scalar(value: f64) -> i16 {
    const TENK: i64 = 10_000;

    let integer_part = value as i64;
    let int_part = integer_part as i32;

    if integer_part != int_part as i64 {
        // Start with the smallest factor and drop as much precision as it
        // takes to hold the most significant digit.
        let mut scalar: i16 = 10;
        while (scalar as i64) <= TENK {
            let scaled = integer_part / scalar as i64;
            if scaled == (scaled as i32) as i64 {
                return scalar;
            }
            scalar *= 10;
        }
        0
    } else {
        // The first four fractional digits decide the finest usable scalar.
        let digits = (value * TENK as f64).round() as i64 - integer_part * TENK;
        if digits != 0 {
            let mut i: i64 = 1;
            while i < TENK {
                if digits % (i * 10) != 0 {
                    let scale_factor = (-TENK / i) as i16;
                    let scalar = parse_scalar(scale_factor);

                    // Check the most significant digit still fits.
                    let mut scaled = (value / scalar).round() as i32;
                    scaled /= -(scale_factor as i32);
                    if scaled as i64 == integer_part {
                        return scale_factor;
                    }
                }
                i *= 10;
            }
        }
        1
    }
}

/// Split disjoint, ascending byte ranges (absolute within the header) out of
/// a staging row that starts at header byte `start`.
fn split_write_locations<'a>(
    row: &'a mut [u8],
    start: usize,
    ranges: &[ByteRange],
) -> Vec<DataWriteLocation<'a>> {
    let mut locations = Vec::with_capacity(ranges.len());
    let mut rest: &mut [u8] = row;
    let mut consumed = start;
    for range in ranges {
        let tail = std::mem::take(&mut rest);
        let (_, tail) = tail.split_at_mut(range.begin - consumed);
        let (data, tail) = tail.split_at_mut(range.len());
        locations.push(DataWriteLocation {
            range: *range,
            data,
        });
        rest = tail;
        consumed = range.end;
    }
    locations
}

fn read_locations<'a>(
    row: &'a [u8],
    start: usize,
    ranges: &[ByteRange],
) -> Vec<DataReadLocation<'a>> {
    ranges
        .iter()
        .map(|range| DataReadLocation {
            range: *range,
            data: &row[range.begin - start..range.end - start],
        })
        .collect()
}

/// Decode the metadata of `number_of_traces` traces out of a staging buffer
/// into rows `[skip, skip + number_of_traces)` of the container.
///
/// The buffer holds one row of `extent` bytes per trace, rows spaced
/// `extent + stride` bytes apart, each row covering header bytes
/// `[start, start + extent)` of its trace.
pub fn extract_trace_metadata(
    number_of_traces: usize,
    buffer: &[u8],
    trace_metadata: &mut TraceMetadata,
    stride: usize,
    skip: usize,
) -> Result<(), PsgError> {
    if number_of_traces == 0 {
        return Ok(());
    }

    let rules = trace_metadata.rules().clone();
    let start = rules.start();
    let extent = rules.extent();

    // The raw copy is read first, so explicitly parsed fields stay
    // authoritative in the typed columns.
    if rules.has_copy() {
        for i in 0..number_of_traces {
            let row = &buffer[i * (extent + stride)..][..TRACE_HEADER_LEN];
            trace_metadata
                .raw_metadata_row_mut(i + skip)?
                .copy_from_slice(row);
        }
    }

    for i in 0..number_of_traces {
        let row = &buffer[(extent + stride) * i..][..extent];

        for (&field, parser) in rules.iter() {
            match parser.kind() {
                FieldKind::Index | FieldKind::Copy => continue,
                _ => {}
            }

            let ranges = parser.data_locations();
            let locations = read_locations(row, start, &ranges);
            match parser.read(&locations)? {
                ParsedValue::Integer(value) => {
                    trace_metadata.set_integer(i + skip, field, value)?
                }
                ParsedValue::FloatingPoint(value) => {
                    trace_metadata.set_floating_point(i + skip, field, value)?
                }
                ParsedValue::Index(_) | ParsedValue::Raw(_) => {}
            }
        }
    }
    Ok(())
}

/// Encode rows `[skip, skip + number_of_traces)` of the container into a
/// staging buffer, the inverse of [`extract_trace_metadata`].
///
/// Coordinate-scaled fields sharing a scalar slot are resolved to one common
/// scalar per trace: the largest if any field needs headroom above 1,
/// otherwise the smallest for maximum precision. The scalar is written to
/// the staging row before the scaled values, which read it back during
/// their own encoding.
pub fn insert_trace_metadata(
    number_of_traces: usize,
    trace_metadata: &TraceMetadata,
    buffer: &mut [u8],
    stride: usize,
    skip: usize,
) -> Result<(), PsgError> {
    if number_of_traces == 0 {
        return Ok(());
    }

    let rules = trace_metadata.rules();
    let start = rules.start();
    let extent = rules.extent();

    // The raw copy lands first; explicitly ruled fields overwrite it below.
    if rules.has_copy() {
        for i in 0..number_of_traces {
            let row = trace_metadata.raw_metadata_row(i + skip)?;
            buffer[i * (extent + stride)..][..TRACE_HEADER_LEN].copy_from_slice(row);
        }
    }

    for i in 0..number_of_traces {
        let row = &mut buffer[(extent + stride) * i..][..extent];

        // One shared scalar per scalar slot per trace.
        let mut scalars: FnvHashMap<usize, i16> = FnvHashMap::default();
        let mut scaled_fields: Vec<(TraceField, BlobParser)> = Vec::new();

        for (&field, parser) in rules.iter() {
            match *parser {
                BlobParser::ScaledLong { scalar_loc, .. } => {
                    let value = trace_metadata.get_floating_point(i + skip, field)?;
                    let wanted = find_scalar(value);
                    if wanted == 0 {
                        return Err(PsgError::OutOfRange {
                            msg: format!(
                                "no SEG-Y coordinate scalar can represent {} ({:?})",
                                value, field
                            ),
                        });
                    }

                    let held = scalars.get(&scalar_loc).copied().unwrap_or(1);
                    // A scalar above 1 means a field needs headroom for its
                    // most significant digit, which beats fractional
                    // precision.
                    let resolved = if held > 1 || wanted > 1 {
                        held.max(wanted)
                    } else {
                        held.min(wanted)
                    };
                    scalars.insert(scalar_loc, resolved);
                    scaled_fields.push((field, *parser));
                }
                BlobParser::Short { .. } | BlobParser::Long { .. } => {
                    let value = ParsedValue::Integer(trace_metadata.get_integer(i + skip, field)?);
                    let ranges = parser.data_locations();
                    let mut locations = split_write_locations(row, start, &ranges);
                    parser.write(&mut locations, &value)?;
                }
                BlobParser::Index | BlobParser::RawCopy => {}
            }
        }

        for (&scalar_loc, &scalar) in scalars.iter() {
            let at = scalar_loc - 1 - start;
            row[at..at + 2].copy_from_slice(&scalar.to_be_bytes());
        }

        for (field, parser) in scaled_fields {
            let value =
                ParsedValue::FloatingPoint(trace_metadata.get_floating_point(i + skip, field)?);
            let ranges = parser.data_locations();
            let mut locations = split_write_locations(row, start, &ranges);
            parser.write(&mut locations, &value)?;
        }
    }
    Ok(())
}
