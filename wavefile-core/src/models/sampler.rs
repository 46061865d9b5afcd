use serde::{Deserialize, Serialize};

/// Direction a sampler loop plays in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopType {
    Forward,
    Alternating,
    Backward,
    Unknown,
}

impl From<u32> for LoopType {
    fn from(val: u32) -> Self {
        match val {
            0 => LoopType::Forward,
            1 => LoopType::Alternating,
            2 => LoopType::Backward,
            _ => LoopType::Unknown,
        }
    }
}

/// One loop region from a `smpl` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerLoop {
    pub id: u32,
    pub loop_type: LoopType,
    pub start_sample_frame: u32,
    /// Last frame of the loop. The frame itself is played.
    pub end_sample_frame: u32,
    /// Sub-frame loop point in `[0.0, 1.0)`.
    pub fraction: f64,
    /// Number of times to play the loop; 0 loops forever.
    pub play_count: u32,
}

impl SamplerLoop {
    pub fn is_infinite(&self) -> bool {
        self.play_count == 0
    }
}

/// SMPTE offset of the first sample, as stored in a `smpl` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SmpteTimecode {
    pub hours: i8,
    pub minutes: u8,
    pub seconds: u8,
    pub frame_count: u8,
}

impl From<u32> for SmpteTimecode {
    /// Unpacks the little-endian `[frames, seconds, minutes, hours]` layout.
    fn from(val: u32) -> Self {
        let [frame_count, seconds, minutes, hours] = val.to_le_bytes();
        Self {
            hours: hours as i8,
            minutes,
            seconds,
            frame_count,
        }
    }
}

/// Instrument tuning and loop metadata from a `smpl` chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerInfo {
    pub manufacturer_id: u32,
    pub product_id: u32,
    /// Duration of one sample in nanoseconds.
    pub sample_nanoseconds: u32,
    /// MIDI note at which the sample plays back at its original pitch.
    pub unity_note: u32,
    /// Fraction of a semitone above `unity_note`, in `[0.0, 1.0)`.
    pub pitch_fraction: f64,
    pub smpte_format: u32,
    pub smpte_offset: SmpteTimecode,
    pub loops: Vec<SamplerLoop>,
    /// Vendor-specific data following the loop records, uninterpreted.
    pub sampler_specific_data: Vec<u8>,
}
