//! This submodule deals with decoding the binary sample data of traces once
//! the raw bytes have been pulled out of the file.
use para_segy_core::bitconverter::sample_reader;
use para_segy_core::enums::SegyNumberFormat;
use para_segy_core::errors::*;
use para_segy_core::segy::DATUM_LEN;

/// Decode a buffer of raw big-endian samples into IEEE f32 values.
///
/// `bytes` must hold exactly `out.len()` samples in the given format.
pub fn decode_samples_into(
    bytes: &[u8],
    format: SegyNumberFormat,
    out: &mut [f32],
) -> Result<(), PsgError> {
    if bytes.len() != out.len() * DATUM_LEN {
        return Err(PsgError::BitConversionError {
            msg: format!(
                "{} bytes cannot hold {} samples of {} bytes",
                bytes.len(),
                out.len(),
                DATUM_LEN
            ),
        });
    }

    let reader = sample_reader(format);
    for (chunk, sample) in bytes.chunks_exact(DATUM_LEN).zip(out.iter_mut()) {
        *sample = reader(chunk)?;
    }
    Ok(())
}

/// Decode a buffer of raw samples into a fresh vector.
pub fn decode_samples(bytes: &[u8], format: SegyNumberFormat) -> Result<Vec<f32>, PsgError> {
    let mut out = vec![0.0f32; bytes.len() / DATUM_LEN];
    decode_samples_into(bytes, format, &mut out)?;
    Ok(out)
}
