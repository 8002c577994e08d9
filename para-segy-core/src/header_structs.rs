//! This file contains the definitions for the file-level headers of a SEG-Y
//! file: the 400-byte binary header fields the library interprets, and the
//! text header codec with its EBCDIC autodetection.
use crate::bitconverter::{is_printable_ascii, to_ascii_from_ebcdic, to_ebcdic_from_ascii, Be};
use crate::enums::{SegyNumberFormat, TextEncoding};
use crate::errors::PsgError;
use crate::{BIN_HEADER_LEN, TEXT_HEADER_LEN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// 0-indexed offsets within the binary header. The file-absolute positions
// are these plus 3200.
const SAMPLE_INTERVAL_IDX: usize = 16;
const SAMPLES_PER_TRACE_IDX: usize = 20;
const NUMBER_FORMAT_IDX: usize = 24;

/// The binary header fields of a SEG-Y file that this library interprets.
///
/// The on-disk header is 400 bytes with around 45 fields; everything the
/// parallel trace I/O does not need is carried through untouched, so only
/// the sample geometry and the number format appear here.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinHeader {
    /// Bytes 3217 - 3218 of the SEG-Y file: sample interval in microseconds.
    pub sample_interval: i16,
    /// Bytes 3221 - 3222 of the SEG-Y file: samples per trace.
    pub samples_per_trace: i16,
    /// Bytes 3225 - 3226 of the SEG-Y file: the sample number format.
    pub number_format: SegyNumberFormat,
}

impl BinHeader {
    pub fn new(
        sample_interval: i16,
        samples_per_trace: i16,
        number_format: SegyNumberFormat,
    ) -> Self {
        BinHeader {
            sample_interval,
            samples_per_trace,
            number_format,
        }
    }

    /// Parse the used fields out of a 400-byte binary header block.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PsgError> {
        if bytes.len() != BIN_HEADER_LEN {
            return Err(PsgError::CorruptFile {
                msg: format!(
                    "binary header length should be {} but is {}",
                    BIN_HEADER_LEN,
                    bytes.len()
                ),
            });
        }

        let sample_interval =
            i16::from_be_slice(&bytes[SAMPLE_INTERVAL_IDX..SAMPLE_INTERVAL_IDX + 2])?;
        let samples_per_trace =
            i16::from_be_slice(&bytes[SAMPLES_PER_TRACE_IDX..SAMPLES_PER_TRACE_IDX + 2])?;
        let number_format =
            SegyNumberFormat::new(u16::from_be_slice(&bytes[NUMBER_FORMAT_IDX..NUMBER_FORMAT_IDX + 2])?)?;

        Ok(BinHeader {
            sample_interval,
            samples_per_trace,
            number_format,
        })
    }

    /// Assemble a 400-byte binary header block. Unused fields are zero.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; BIN_HEADER_LEN];
        bytes[SAMPLE_INTERVAL_IDX..SAMPLE_INTERVAL_IDX + 2]
            .copy_from_slice(&self.sample_interval.to_be_bytes());
        bytes[SAMPLES_PER_TRACE_IDX..SAMPLES_PER_TRACE_IDX + 2]
            .copy_from_slice(&self.samples_per_trace.to_be_bytes());
        bytes[NUMBER_FORMAT_IDX..NUMBER_FORMAT_IDX + 2]
            .copy_from_slice(&(self.number_format as u16).to_be_bytes());
        bytes
    }
}

/// Decode a 3200-byte text header block into ASCII.
///
/// A block that is printable ASCII is taken as-is; otherwise an EBCDIC to
/// ASCII translation is attempted, and a block that is printable under
/// neither encoding is reported as corrupt.
pub fn decode_text_header(bytes: &[u8]) -> Result<String, PsgError> {
    if bytes.len() != TEXT_HEADER_LEN {
        return Err(PsgError::CorruptFile {
            msg: format!(
                "text header length should be {} but is {}",
                TEXT_HEADER_LEN,
                bytes.len()
            ),
        });
    }

    if bytes.iter().all(|&b| is_printable_ascii(b)) {
        return Ok(String::from_utf8_lossy(bytes).to_string());
    }

    let translated = bytes
        .iter()
        .map(|&b| to_ascii_from_ebcdic(b))
        .collect::<Vec<u8>>();
    if translated.iter().all(|&b| is_printable_ascii(b)) {
        return Ok(String::from_utf8_lossy(&translated).to_string());
    }

    Err(PsgError::CorruptFile {
        msg: "text header is neither printable ASCII nor EBCDIC".to_string(),
    })
}

/// Encode an ASCII string as a 3200-byte text header block, padded with
/// spaces and truncated as needed.
pub fn encode_text_header(text: &str, encoding: TextEncoding) -> Result<Vec<u8>, PsgError> {
    if !text.chars().all(|c| c.is_ascii() && is_printable_ascii(c as u8)) {
        return Err(PsgError::BitConversionError {
            msg: "text headers can only hold printable ASCII".to_string(),
        });
    }

    let mut bytes = text.as_bytes().to_vec();
    bytes.truncate(TEXT_HEADER_LEN);
    bytes.resize(TEXT_HEADER_LEN, b' ');

    if encoding == TextEncoding::Ebcdic {
        for b in bytes.iter_mut() {
            *b = to_ebcdic_from_ascii(*b);
        }
    }
    Ok(bytes)
}

/// Split a decoded text header into its 40 lines of 80 columns.
pub fn text_header_lines(text: &str) -> Vec<String> {
    text.chars()
        .collect::<Vec<char>>()
        .as_slice()
        .chunks(80)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<String>>()
}
