/// Packing of sample values to and from little-endian bytes.
///
/// 8-bit PCM is unsigned on disk (biased by 128) but signed in memory.
/// 24-bit PCM has no native integer width, so each value is packed as an
/// `i32` with the high byte dropped, and sign-extended on the way back.
use crate::models::error::{Result, WaveFileError};
use crate::models::format::SampleEncoding;
use crate::processing::buffer::Samples;

/// Append the on-disk encoding of `samples` to `out`.
///
/// Integer samples must already be in range for `encoding`; `SampleBuffer`
/// guarantees that.
pub fn encode(samples: &Samples, encoding: SampleEncoding, out: &mut Vec<u8>) -> Result<()> {
    out.reserve(samples.len() * encoding.bytes_per_sample());
    match (samples, encoding) {
        (Samples::Int(values), SampleEncoding::Pcm8) => {
            out.extend(values.iter().map(|&v| (v + 128) as u8));
        }
        (Samples::Int(values), SampleEncoding::Pcm16) => {
            for &v in values {
                out.extend_from_slice(&(v as i16).to_le_bytes());
            }
        }
        (Samples::Int(values), SampleEncoding::Pcm24) => {
            for &v in values {
                out.extend_from_slice(&v.to_le_bytes()[..3]);
            }
        }
        (Samples::Int(values), SampleEncoding::Pcm32) => {
            for &v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        (Samples::Float(values), SampleEncoding::Float32) => {
            for &v in values {
                out.extend_from_slice(&(v as f32).to_le_bytes());
            }
        }
        (Samples::Float(values), SampleEncoding::Float64) => {
            for &v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        (samples, encoding) => {
            return Err(WaveFileError::InvalidSamples(format!(
                "cannot encode {} samples as {}",
                samples.kind(),
                encoding
            )));
        }
    }
    Ok(())
}

/// Decode whole samples from `bytes`. Trailing bytes that don't make up a
/// complete sample are ignored; callers slice on frame boundaries.
pub fn decode(bytes: &[u8], encoding: SampleEncoding) -> Samples {
    match encoding {
        SampleEncoding::Pcm8 => Samples::Int(bytes.iter().map(|&b| b as i32 - 128).collect()),
        SampleEncoding::Pcm16 => Samples::Int(
            bytes
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as i32)
                .collect(),
        ),
        SampleEncoding::Pcm24 => Samples::Int(
            bytes
                .chunks_exact(3)
                .map(|b| {
                    let sign = if b[2] & 0x80 != 0 { 0xFF } else { 0x00 };
                    i32::from_le_bytes([b[0], b[1], b[2], sign])
                })
                .collect(),
        ),
        SampleEncoding::Pcm32 => Samples::Int(
            bytes
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ),
        SampleEncoding::Float32 => Samples::Float(
            bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
        ),
        SampleEncoding::Float64 => Samples::Float(
            bytes
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
        ),
    }
}
