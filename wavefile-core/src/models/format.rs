use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{Result, WaveFileError};

/// How sample values are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Signed integer PCM.
    Pcm,
    /// IEEE 754 floating point.
    Float,
}

/// Every (sample format, bit depth) pair this crate can read and write.
///
/// The enum is the lookup table: anything not listed here is rejected when a
/// `WaveFormat` is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    Pcm8,
    Pcm16,
    Pcm24,
    Pcm32,
    Float32,
    Float64,
}

impl SampleEncoding {
    pub fn from_parts(sample_format: SampleFormat, bits_per_sample: u16) -> Option<Self> {
        match (sample_format, bits_per_sample) {
            (SampleFormat::Pcm, 8) => Some(Self::Pcm8),
            (SampleFormat::Pcm, 16) => Some(Self::Pcm16),
            (SampleFormat::Pcm, 24) => Some(Self::Pcm24),
            (SampleFormat::Pcm, 32) => Some(Self::Pcm32),
            (SampleFormat::Float, 32) => Some(Self::Float32),
            (SampleFormat::Float, 64) => Some(Self::Float64),
            _ => None,
        }
    }

    pub fn sample_format(self) -> SampleFormat {
        match self {
            Self::Pcm8 | Self::Pcm16 | Self::Pcm24 | Self::Pcm32 => SampleFormat::Pcm,
            Self::Float32 | Self::Float64 => SampleFormat::Float,
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::Pcm8 => 8,
            Self::Pcm16 => 16,
            Self::Pcm24 => 24,
            Self::Pcm32 | Self::Float32 => 32,
            Self::Float64 => 64,
        }
    }

    /// Bytes one sample occupies on disk (24-bit is packed into 3).
    pub fn bytes_per_sample(self) -> usize {
        (self.bits_per_sample() as usize).div_ceil(8)
    }

    /// Largest magnitude of a full-scale integer sample, `2^(bits - 1)`.
    ///
    /// Integer samples are normalized by dividing by this value.
    /// Returns `None` for float encodings.
    pub fn pcm_scale(self) -> Option<f64> {
        match self.sample_format() {
            SampleFormat::Pcm => Some((1u64 << (self.bits_per_sample() - 1)) as f64),
            SampleFormat::Float => None,
        }
    }

    /// Inclusive integer range `(min, max)` for PCM encodings.
    pub fn pcm_range(self) -> Option<(i32, i32)> {
        match self {
            Self::Pcm8 => Some((i8::MIN as i32, i8::MAX as i32)),
            Self::Pcm16 => Some((i16::MIN as i32, i16::MAX as i32)),
            Self::Pcm24 => Some((-(1 << 23), (1 << 23) - 1)),
            Self::Pcm32 => Some((i32::MIN, i32::MAX)),
            Self::Float32 | Self::Float64 => None,
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pcm8 => "pcm_8",
            Self::Pcm16 => "pcm_16",
            Self::Pcm24 => "pcm_24",
            Self::Pcm32 => "pcm_32",
            Self::Float32 => "float_32",
            Self::Float64 => "float_64",
        };
        f.write_str(name)
    }
}

impl FromStr for SampleEncoding {
    type Err = WaveFileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pcm_8" => Ok(Self::Pcm8),
            "pcm_16" => Ok(Self::Pcm16),
            "pcm_24" => Ok(Self::Pcm24),
            "pcm_32" => Ok(Self::Pcm32),
            "float" | "float_32" => Ok(Self::Float32),
            "float_64" => Ok(Self::Float64),
            other => Err(WaveFileError::InvalidFormat(format!("unknown sample encoding: {}", other))),
        }
    }
}

/// Immutable description of a stream's audio format.
///
/// Block align and byte rate are always derived, never stored, so they can't
/// disagree with the channel count and encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WaveFormatFields")]
pub struct WaveFormat {
    channels: u16,
    encoding: SampleEncoding,
    sample_rate: u32,
}

/// Unvalidated wire shape of `WaveFormat`; deserialization goes through
/// `WaveFormat::from_encoding` so invalid values are rejected.
#[derive(Deserialize)]
struct WaveFormatFields {
    channels: u16,
    encoding: SampleEncoding,
    sample_rate: u32,
}

impl TryFrom<WaveFormatFields> for WaveFormat {
    type Error = WaveFileError;

    fn try_from(fields: WaveFormatFields) -> Result<Self> {
        Self::from_encoding(fields.channels, fields.encoding, fields.sample_rate)
    }
}

impl WaveFormat {
    pub fn new(channels: u16, sample_format: SampleFormat, bits_per_sample: u16, sample_rate: u32) -> Result<Self> {
        let encoding = SampleEncoding::from_parts(sample_format, bits_per_sample).ok_or_else(|| {
            WaveFileError::InvalidFormat(format!(
                "unsupported bits per sample for {:?}: {}",
                sample_format, bits_per_sample
            ))
        })?;
        Self::from_encoding(channels, encoding, sample_rate)
    }

    pub fn from_encoding(channels: u16, encoding: SampleEncoding, sample_rate: u32) -> Result<Self> {
        let format = Self {
            channels,
            encoding,
            sample_rate,
        };
        format.validate()?;
        Ok(format)
    }

    fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(WaveFileError::InvalidFormat("channel count must be positive".into()));
        }
        if self.sample_rate == 0 {
            return Err(WaveFileError::InvalidFormat("sample rate must be positive".into()));
        }
        // block_align is a u16 on disk
        if self.channels as usize * self.encoding.bytes_per_sample() > u16::MAX as usize {
            return Err(WaveFileError::InvalidFormat(format!(
                "too many channels for {}: {}",
                self.encoding, self.channels
            )));
        }
        Ok(())
    }

    /// Copy of this format with a different channel count.
    pub fn with_channels(&self, channels: u16) -> Result<Self> {
        Self::from_encoding(channels, self.encoding, self.sample_rate)
    }

    /// Copy of this format with a different sample encoding.
    pub fn with_encoding(&self, encoding: SampleEncoding) -> Result<Self> {
        Self::from_encoding(self.channels, encoding, self.sample_rate)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.encoding.sample_format()
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.encoding.bits_per_sample()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes per sample frame: `channels * ceil(bits_per_sample / 8)`.
    pub fn block_align(&self) -> u16 {
        (self.channels as usize * self.encoding.bytes_per_sample()) as u16
    }

    /// Bytes per second of audio: `sample_rate * block_align`.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.wrapping_mul(self.block_align() as u32)
    }
}

impl Default for WaveFormat {
    fn default() -> Self {
        Self {
            channels: 2,
            encoding: SampleEncoding::Pcm16,
            sample_rate: 44100,
        }
    }
}
