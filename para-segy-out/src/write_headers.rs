//! Assembly of the 3600-byte SEG-Y file header from the writer's state.
use para_segy_core::header_structs::{encode_text_header, BinHeader};
use para_segy_core::errors::*;
use para_segy_core::SegySettings;

/// Assemble the text header and binary header into one 3600-byte block,
/// encoded per the settings.
pub fn file_header_bytes(
    text: &str,
    settings: &SegySettings,
    samples_per_trace: usize,
    sample_interval_raw: i16,
) -> Result<Vec<u8>, PsgError> {
    let mut bytes = encode_text_header(text, settings.get_text_encoding())?;
    bytes.extend(
        BinHeader::new(
            sample_interval_raw,
            samples_per_trace as i16,
            settings.get_number_format(),
        )
        .as_bytes(),
    );
    Ok(bytes)
}
