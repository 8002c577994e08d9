//! This module contains the [`SegySettings`] structure which customises how
//! SEG-Y files are read and written.
//!
//! NB: Few files in the wild keep perfectly to the SEG-Y standard, so a
//! small amount of configurability is necessary. Using it carelessly can
//! just as easily produce files other software will misread, hence setter
//! and getter functions rather than public fields.
use crate::enums::{SegyNumberFormat, TextEncoding};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One microsecond, the SEG-Y rev 1 unit of the binary header sample
/// interval field.
pub const MICROSECOND: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct SegySettings {
    /// The factor the raw sample interval field is multiplied by when read,
    /// and divided by when written.
    pub(crate) sample_interval_factor: f64,
    /// The encoding used when writing the text header. Reading always
    /// autodetects.
    pub(crate) text_encoding: TextEncoding,
    /// The sample number format used when writing trace data. Reading takes
    /// the format from the binary header.
    pub(crate) number_format: SegyNumberFormat,
}

impl Default for SegySettings {
    /// The defaults follow the SEG-Y rev 1 standard: intervals in
    /// microseconds, ASCII text, IEEE samples.
    fn default() -> Self {
        SegySettings {
            sample_interval_factor: MICROSECOND,
            text_encoding: TextEncoding::Ascii,
            number_format: SegyNumberFormat::IeeeFloat32,
        }
    }
}

impl SegySettings {
    #[cfg(feature = "to_json")]
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(&self).map_err(|e| e.to_string())
    }

    /// Set the factor between the raw sample interval field and the value
    /// the file layer reports.
    pub fn set_sample_interval_factor(&mut self, factor: f64) {
        self.sample_interval_factor = factor;
    }

    pub fn get_sample_interval_factor(&self) -> f64 {
        self.sample_interval_factor
    }

    /// Set the text header encoding used on write.
    pub fn set_text_encoding(&mut self, encoding: TextEncoding) {
        self.text_encoding = encoding;
    }

    pub fn get_text_encoding(&self) -> TextEncoding {
        self.text_encoding
    }

    /// Set the sample number format used on write.
    pub fn set_number_format(&mut self, format: SegyNumberFormat) {
        self.number_format = format;
    }

    pub fn get_number_format(&self) -> SegyNumberFormat {
        self.number_format
    }
}
