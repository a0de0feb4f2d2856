//! Raw buffer decoding
//!
//! Capture delivers interleaved little-endian `f32` frames as bytes. These
//! helpers turn them into mono samples for the detector without allocating
//! once the scratch buffer has grown to the callback size.

use crate::error::{CoreError, Result};

/// Bytes per encoded sample
pub const BYTES_PER_SAMPLE: usize = 4;

/// Decode interleaved LE `f32` bytes into `out` as mono samples.
///
/// Frames are averaged across `channels`; a trailing partial frame is averaged
/// over the channels it contains. Non-finite samples count as silence. `out` is
/// cleared first.
pub fn decode_mono_into(bytes: &[u8], channels: u16, out: &mut Vec<f32>) -> Result<()> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(CoreError::MalformedBuffer(format!(
            "{} bytes is not a whole number of {}-byte samples",
            bytes.len(),
            BYTES_PER_SAMPLE
        )));
    }
    out.clear();
    let samples = bytes.chunks_exact(BYTES_PER_SAMPLE).map(|chunk| {
        let sample = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if sample.is_finite() {
            sample
        } else {
            0.0
        }
    });
    append_downmixed_samples(out, samples, usize::from(channels.max(1)));
    Ok(())
}

/// Average each interleaved frame to produce a mono representation.
pub fn append_downmixed_samples<I>(buf: &mut Vec<f32>, samples: I, channels: usize)
where
    I: IntoIterator<Item = f32>,
{
    if channels <= 1 {
        buf.extend(samples);
        return;
    }

    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in samples {
        acc += sample;
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

/// Encode samples as LE `f32` bytes, appending to `out`
pub fn encode_f32_le(samples: &[f32], out: &mut Vec<u8>) {
    out.reserve(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
}
