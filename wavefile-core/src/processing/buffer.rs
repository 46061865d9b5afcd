use std::slice::ChunksExact;

use crate::models::error::{Result, WaveFileError};
use crate::models::format::{SampleFormat, WaveFormat};

/// Interleaved sample values `[L0, R0, L1, R1, ...]`.
///
/// PCM values are held as `i32` regardless of bit depth; float values as
/// `f64` regardless of width.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Int(Vec<i32>),
    Float(Vec<f64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Int(values) => values.len(),
            Samples::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Samples::Int(_) => "integer",
            Samples::Float(_) => "float",
        }
    }

    fn sample_format(&self) -> SampleFormat {
        match self {
            Samples::Int(_) => SampleFormat::Pcm,
            Samples::Float(_) => SampleFormat::Float,
        }
    }

    fn empty_like(format: &WaveFormat, capacity: usize) -> Self {
        match format.sample_format() {
            SampleFormat::Pcm => Samples::Int(Vec::with_capacity(capacity)),
            SampleFormat::Float => Samples::Float(Vec::with_capacity(capacity)),
        }
    }
}

impl From<Vec<i32>> for Samples {
    fn from(values: Vec<i32>) -> Self {
        Samples::Int(values)
    }
}

impl From<Vec<f64>> for Samples {
    fn from(values: Vec<f64>) -> Self {
        Samples::Float(values)
    }
}

/// Sample frames tagged with the format they are expressed in.
///
/// Every frame holds exactly `format.channels()` values and integer values
/// are within the range of the format's bit depth. Conversion produces a new
/// buffer; the source is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Samples,
    format: WaveFormat,
}

impl SampleBuffer {
    pub fn new(samples: impl Into<Samples>, format: WaveFormat) -> Result<Self> {
        let samples = samples.into();
        validate(&samples, &format)?;
        Ok(Self { samples, format })
    }

    /// Build a buffer from per-frame values, e.g. `vec![vec![l0, r0], vec![l1, r1]]`.
    pub fn from_frames<F: Into<Samples>>(frames: impl IntoIterator<Item = F>, format: WaveFormat) -> Result<Self> {
        let channels = format.channels() as usize;
        let mut samples = Samples::empty_like(&format, 0);
        for (index, frame) in frames.into_iter().enumerate() {
            let frame = frame.into();
            if frame.len() != channels {
                return Err(WaveFileError::InvalidSamples(format!(
                    "frame {} has {} values, expected {}",
                    index,
                    frame.len(),
                    channels
                )));
            }
            match (&mut samples, frame) {
                (Samples::Int(all), Samples::Int(values)) => all.extend(values),
                (Samples::Float(all), Samples::Float(values)) => all.extend(values),
                (_, frame) => {
                    return Err(WaveFileError::InvalidSamples(format!(
                        "{} frame in a {:?} buffer",
                        frame.kind(),
                        format.sample_format()
                    )));
                }
            }
        }
        Self::new(samples, format)
    }

    /// Buffer with zero frames.
    pub fn empty(format: WaveFormat) -> Self {
        Self {
            samples: Samples::empty_like(&format, 0),
            format,
        }
    }

    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn into_samples(self) -> Samples {
        self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.format.channels() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Per-frame slices of a PCM buffer; `None` for float buffers.
    pub fn int_frames(&self) -> Option<ChunksExact<'_, i32>> {
        match &self.samples {
            Samples::Int(values) => Some(values.chunks_exact(self.format.channels() as usize)),
            Samples::Float(_) => None,
        }
    }

    /// Per-frame slices of a float buffer; `None` for PCM buffers.
    pub fn float_frames(&self) -> Option<ChunksExact<'_, f64>> {
        match &self.samples {
            Samples::Float(values) => Some(values.chunks_exact(self.format.channels() as usize)),
            Samples::Int(_) => None,
        }
    }

    /// Re-express these samples in `target`.
    ///
    /// Each value is normalized to `[-1.0, 1.0]` (PCM divides by
    /// `2^(bits - 1)`), channels are remapped (mono is duplicated to every
    /// target channel, multi-channel is averaged down to mono), then the
    /// value is scaled into the target. PCM targets round half away from
    /// zero and clip to the representable range.
    pub fn convert(&self, target: &WaveFormat) -> Result<SampleBuffer> {
        let source_channels = self.format.channels() as usize;
        let target_channels = target.channels() as usize;
        if source_channels != target_channels && source_channels != 1 && target_channels != 1 {
            return Err(WaveFileError::UnsupportedFormat(format!(
                "cannot remap {} channels to {}",
                source_channels, target_channels
            )));
        }

        // Same encoding and layout: values carry over untouched.
        if self.format.encoding() == target.encoding() && source_channels == target_channels {
            return Ok(SampleBuffer {
                samples: self.samples.clone(),
                format: *target,
            });
        }

        let normalized = self.normalized();
        let remapped = remap_channels(&normalized, source_channels, target_channels);
        let samples = denormalize(remapped, target);
        Ok(SampleBuffer {
            samples,
            format: *target,
        })
    }

    fn normalized(&self) -> Vec<f64> {
        match &self.samples {
            Samples::Int(values) => {
                let scale = self.format.encoding().pcm_scale().unwrap_or(1.0);
                values.iter().map(|&v| v as f64 / scale).collect()
            }
            Samples::Float(values) => values.clone(),
        }
    }
}

fn validate(samples: &Samples, format: &WaveFormat) -> Result<()> {
    if samples.sample_format() != format.sample_format() {
        return Err(WaveFileError::InvalidSamples(format!(
            "{} samples tagged with a {:?} format",
            samples.kind(),
            format.sample_format()
        )));
    }
    let channels = format.channels() as usize;
    if samples.len() % channels != 0 {
        return Err(WaveFileError::InvalidSamples(format!(
            "{} samples do not divide into {}-channel frames",
            samples.len(),
            channels
        )));
    }
    if let (Samples::Int(values), Some((min, max))) = (samples, format.encoding().pcm_range()) {
        if let Some(v) = values.iter().find(|&&v| v < min || v > max) {
            return Err(WaveFileError::InvalidSamples(format!(
                "value {} out of range for {}",
                v,
                format.encoding()
            )));
        }
    }
    Ok(())
}

/// Map interleaved frames from `from` channels to `to` channels.
///
/// Callers guarantee `from == to`, `from == 1`, or `to == 1`.
fn remap_channels(samples: &[f64], from: usize, to: usize) -> Vec<f64> {
    if from == to {
        return samples.to_vec();
    }
    let frame_count = samples.len() / from;
    if from == 1 {
        let mut out = Vec::with_capacity(frame_count * to);
        for &sample in samples {
            out.extend(std::iter::repeat_n(sample, to));
        }
        return out;
    }
    // downmix to mono by averaging each frame
    let scale = 1.0 / from as f64;
    samples
        .chunks_exact(from)
        .map(|frame| frame.iter().sum::<f64>() * scale)
        .collect()
}

fn denormalize(values: Vec<f64>, target: &WaveFormat) -> Samples {
    match (target.encoding().pcm_scale(), target.encoding().pcm_range()) {
        (Some(scale), Some((min, max))) => Samples::Int(
            values
                .into_iter()
                .map(|v| (v * scale).round().clamp(min as f64, max as f64) as i32)
                .collect(),
        ),
        _ => Samples::Float(values),
    }
}
