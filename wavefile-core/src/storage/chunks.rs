//! Parsers for the bodies of the `fmt ` and `smpl` chunks.
use crate::models::error::{Result, WaveFileError};
use crate::models::format::{SampleEncoding, SampleFormat, WaveFormat};
use crate::models::sampler::{LoopType, SamplerInfo, SamplerLoop, SmpteTimecode};
use crate::processing::wav_format::{
    FORMAT_CODE_EXTENSIBLE, FORMAT_CODE_FLOAT, FORMAT_CODE_PCM, SUBFORMAT_GUID_TAIL,
};

const MIN_FORMAT_CHUNK_SIZE: usize = 16;
const EXTENSIBLE_FORMAT_CHUNK_SIZE: usize = 40;
const EXTENSIBLE_EXTENSION_SIZE: u16 = 22;

const SAMPLER_HEADER_SIZE: usize = 36;
const SAMPLER_LOOP_SIZE: usize = 24;

fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

/// Fraction stored as a 32-bit fixed point value over `2^32`.
fn fixed_point_fraction(val: u32) -> f64 {
    val as f64 / 4_294_967_296.0
}

/// `WAVE_FORMAT_EXTENSIBLE` fields that follow the basic format chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatExtension {
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: [u8; 16],
}

/// The `fmt ` chunk as stored, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatChunk {
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extension: Option<FormatExtension>,
}

impl FormatChunk {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_FORMAT_CHUNK_SIZE {
            return Err(WaveFileError::Malformed(format!(
                "format chunk too small: {} bytes",
                data.len()
            )));
        }

        let format_code = u16_at(data, 0);
        let extension = if format_code == FORMAT_CODE_EXTENSIBLE {
            if data.len() < EXTENSIBLE_FORMAT_CHUNK_SIZE || u16_at(data, 16) < EXTENSIBLE_EXTENSION_SIZE {
                return Err(WaveFileError::Malformed(format!(
                    "extensible format chunk too small: {} bytes",
                    data.len()
                )));
            }
            let mut sub_format = [0u8; 16];
            sub_format.copy_from_slice(&data[24..40]);
            Some(FormatExtension {
                valid_bits_per_sample: u16_at(data, 18),
                channel_mask: u32_at(data, 20),
                sub_format,
            })
        } else {
            None
        };

        Ok(Self {
            format_code,
            channels: u16_at(data, 2),
            sample_rate: u32_at(data, 4),
            byte_rate: u32_at(data, 8),
            block_align: u16_at(data, 12),
            bits_per_sample: u16_at(data, 14),
            extension,
        })
    }

    /// Resolve the format code, looking through the subformat GUID of an
    /// extensible chunk.
    pub fn sample_format(&self) -> Result<SampleFormat> {
        let code = match &self.extension {
            Some(ext) if ext.sub_format[2..] == SUBFORMAT_GUID_TAIL => u16::from_le_bytes([ext.sub_format[0], ext.sub_format[1]]),
            Some(ext) => {
                return Err(WaveFileError::UnsupportedFormat(format!(
                    "unknown extensible subformat {:02x?}",
                    ext.sub_format
                )));
            }
            None => self.format_code,
        };
        match code {
            FORMAT_CODE_PCM => Ok(SampleFormat::Pcm),
            FORMAT_CODE_FLOAT => Ok(SampleFormat::Float),
            other => Err(WaveFileError::UnsupportedFormat(format!("format code {:#06x}", other))),
        }
    }

    /// The readable format this chunk describes.
    pub fn to_wave_format(&self) -> Result<WaveFormat> {
        let sample_format = self.sample_format()?;
        let encoding = SampleEncoding::from_parts(sample_format, self.bits_per_sample).ok_or_else(|| {
            WaveFileError::UnsupportedFormat(format!(
                "{} bits per sample for {:?}",
                self.bits_per_sample, sample_format
            ))
        })?;
        let format = WaveFormat::from_encoding(self.channels, encoding, self.sample_rate).map_err(|e| match e {
            WaveFileError::InvalidFormat(msg) => WaveFileError::UnsupportedFormat(msg),
            other => other,
        })?;

        if format.block_align() != self.block_align {
            log::warn!(
                "format chunk block align {} disagrees with derived {}, using derived",
                self.block_align,
                format.block_align()
            );
        }
        if format.byte_rate() != self.byte_rate {
            log::warn!(
                "format chunk byte rate {} disagrees with derived {}",
                self.byte_rate,
                format.byte_rate()
            );
        }
        Ok(format)
    }
}

/// Parse a `smpl` chunk body. Bytes after the declared sampler data are
/// ignored.
pub fn parse_sampler_chunk(data: &[u8]) -> Result<SamplerInfo> {
    if data.len() < SAMPLER_HEADER_SIZE {
        return Err(WaveFileError::Malformed(format!(
            "sampler chunk too small: {} bytes",
            data.len()
        )));
    }

    let loop_count = u32_at(data, 28) as usize;
    let sampler_data_size = u32_at(data, 32) as usize;

    let loops_end = loop_count
        .checked_mul(SAMPLER_LOOP_SIZE)
        .and_then(|size| size.checked_add(SAMPLER_HEADER_SIZE))
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            WaveFileError::Malformed(format!(
                "sampler chunk declares {} loops but has {} bytes",
                loop_count,
                data.len()
            ))
        })?;
    let sampler_data_end = loops_end
        .checked_add(sampler_data_size)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            WaveFileError::Malformed(format!(
                "sampler chunk declares {} bytes of sampler data but has {}",
                sampler_data_size,
                data.len() - loops_end
            ))
        })?;

    let loops = data[SAMPLER_HEADER_SIZE..loops_end]
        .chunks_exact(SAMPLER_LOOP_SIZE)
        .map(|record| SamplerLoop {
            id: u32_at(record, 0),
            loop_type: LoopType::from(u32_at(record, 4)),
            start_sample_frame: u32_at(record, 8),
            end_sample_frame: u32_at(record, 12),
            fraction: fixed_point_fraction(u32_at(record, 16)),
            play_count: u32_at(record, 20),
        })
        .collect();

    Ok(SamplerInfo {
        manufacturer_id: u32_at(data, 0),
        product_id: u32_at(data, 4),
        sample_nanoseconds: u32_at(data, 8),
        unity_note: u32_at(data, 12),
        pitch_fraction: fixed_point_fraction(u32_at(data, 16)),
        smpte_format: u32_at(data, 20),
        smpte_offset: SmpteTimecode::from(u32_at(data, 24)),
        loops,
        sampler_specific_data: data[loops_end..sampler_data_end].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::test_support::{extensible_format_body, format_body, sampler_body, LoopRecord};

    #[test]
    fn parses_pcm_format() {
        let chunk = FormatChunk::parse(&format_body(FORMAT_CODE_PCM, 2, 44100, 16)).unwrap();
        assert_eq!(chunk.format_code, FORMAT_CODE_PCM);
        assert_eq!(chunk.block_align, 4);
        assert_eq!(chunk.extension, None);

        let format = chunk.to_wave_format().unwrap();
        assert_eq!(format.encoding(), SampleEncoding::Pcm16);
        assert_eq!(format.channels(), 2);
    }

    #[test]
    fn rejects_short_format_chunk() {
        let body = format_body(FORMAT_CODE_PCM, 1, 44100, 16);
        assert!(matches!(FormatChunk::parse(&body[..15]), Err(WaveFileError::Malformed(_))));
    }

    #[test]
    fn unsupported_code_and_depth() {
        let adpcm = FormatChunk::parse(&format_body(2, 1, 44100, 4)).unwrap();
        assert!(matches!(adpcm.to_wave_format(), Err(WaveFileError::UnsupportedFormat(_))));

        let pcm12 = FormatChunk::parse(&format_body(FORMAT_CODE_PCM, 1, 44100, 12)).unwrap();
        assert!(matches!(pcm12.to_wave_format(), Err(WaveFileError::UnsupportedFormat(_))));

        let float16 = FormatChunk::parse(&format_body(FORMAT_CODE_FLOAT, 1, 44100, 16)).unwrap();
        assert!(matches!(float16.to_wave_format(), Err(WaveFileError::UnsupportedFormat(_))));

        let no_channels = FormatChunk::parse(&format_body(FORMAT_CODE_PCM, 0, 44100, 16)).unwrap();
        assert!(matches!(no_channels.to_wave_format(), Err(WaveFileError::UnsupportedFormat(_))));
    }

    #[test]
    fn extensible_subformat_selects_encoding() {
        let pcm = FormatChunk::parse(&extensible_format_body(2, 48000, 24, FORMAT_CODE_PCM)).unwrap();
        let ext = pcm.extension.unwrap();
        assert_eq!(ext.valid_bits_per_sample, 24);
        assert_eq!(ext.channel_mask, 0x3);
        assert_eq!(pcm.to_wave_format().unwrap().encoding(), SampleEncoding::Pcm24);

        let float = FormatChunk::parse(&extensible_format_body(1, 48000, 64, FORMAT_CODE_FLOAT)).unwrap();
        assert_eq!(float.to_wave_format().unwrap().encoding(), SampleEncoding::Float64);
    }

    #[test]
    fn extensible_rejects_unknown_guid() {
        let mut body = extensible_format_body(1, 48000, 16, FORMAT_CODE_PCM);
        body[39] = 0x00;
        let chunk = FormatChunk::parse(&body).unwrap();
        assert!(matches!(chunk.sample_format(), Err(WaveFileError::UnsupportedFormat(_))));
    }

    #[test]
    fn extensible_requires_full_extension() {
        let body = extensible_format_body(1, 48000, 16, FORMAT_CODE_PCM);
        assert!(matches!(FormatChunk::parse(&body[..30]), Err(WaveFileError::Malformed(_))));
    }

    #[test]
    fn parses_sampler_chunk_with_loops() {
        let loops = [
            LoopRecord {
                id: 0,
                loop_type: 0,
                start: 0,
                end: 99,
                fraction: 0x8000_0000,
                play_count: 0,
            },
            LoopRecord {
                id: 1,
                loop_type: 7,
                start: 10,
                end: 20,
                fraction: 0,
                play_count: 3,
            },
        ];
        let body = sampler_body(&loops, &[1, 2, 3, 4], &[0xEE, 0xEE]);
        let info = parse_sampler_chunk(&body).unwrap();

        assert_eq!(info.manufacturer_id, 0x0100_0041);
        assert_eq!(info.product_id, 7);
        assert_eq!(info.sample_nanoseconds, 22675);
        assert_eq!(info.unity_note, 60);
        assert_abs_diff_eq!(info.pitch_fraction, 0.25);
        assert_eq!(info.smpte_offset.hours, 1);
        assert_eq!(info.smpte_offset.frame_count, 4);
        assert_eq!(info.loops.len(), 2);
        assert_eq!(info.loops[0].loop_type, LoopType::Forward);
        assert_abs_diff_eq!(info.loops[0].fraction, 0.5);
        assert!(info.loops[0].is_infinite());
        assert_eq!(info.loops[1].loop_type, LoopType::Unknown);
        assert_eq!(info.loops[1].end_sample_frame, 20);
        assert_eq!(info.sampler_specific_data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn sampler_loop_count_must_fit() {
        let mut body = sampler_body(&[], &[], &[]);
        body[28..32].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(parse_sampler_chunk(&body), Err(WaveFileError::Malformed(_))));
    }

    #[test]
    fn sampler_data_size_must_fit() {
        let mut body = sampler_body(&[], &[9, 9], &[]);
        body[32..36].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(parse_sampler_chunk(&body), Err(WaveFileError::Malformed(_))));
    }

    #[test]
    fn sampler_chunk_too_small() {
        assert!(matches!(parse_sampler_chunk(&[0u8; 20]), Err(WaveFileError::Malformed(_))));
    }
}
