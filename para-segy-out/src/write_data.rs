//! This submodule deals with encoding IEEE f32 sample data into the on-disk
//! sample format of the file being written.
use para_segy_core::bitconverter::sample_writer;
use para_segy_core::enums::SegyNumberFormat;
use para_segy_core::errors::*;
use para_segy_core::segy::DATUM_LEN;

/// Encode samples into a raw big-endian buffer of exactly
/// `samples.len() * 4` bytes.
pub fn encode_samples_into(
    samples: &[f32],
    format: SegyNumberFormat,
    out: &mut [u8],
) -> Result<(), PsgError> {
    if out.len() != samples.len() * DATUM_LEN {
        return Err(PsgError::BitConversionError {
            msg: format!(
                "{} bytes cannot hold {} samples of {} bytes",
                out.len(),
                samples.len(),
                DATUM_LEN
            ),
        });
    }

    let writer = sample_writer(format);
    for (chunk, &sample) in out.chunks_exact_mut(DATUM_LEN).zip(samples.iter()) {
        chunk.copy_from_slice(&writer(sample));
    }
    Ok(())
}

/// Encode samples into a fresh buffer.
pub fn encode_samples(samples: &[f32], format: SegyNumberFormat) -> Vec<u8> {
    let writer = sample_writer(format);
    let mut out = Vec::with_capacity(samples.len() * DATUM_LEN);
    for &sample in samples {
        out.extend_from_slice(&writer(sample));
    }
    out
}
