//! # wavefile-core
//!
//! Reading and writing of RIFF WAVE files.
//!
//! Decodes 8/16/24/32-bit integer PCM and 32/64-bit IEEE float audio, with
//! conversion between any two sample formats and simple channel remapping
//! on the way in or out. Writers emit a provisional header up front and
//! patch the final sizes on close, so output can be streamed to any
//! seekable sink.
//!
//! ## Architecture
//!
//! ```text
//! wavefile-core (this crate)
//! ├── traits/       ← ByteSink, ByteSource, IoHandle (owned vs borrowed streams)
//! ├── models/       ← WaveFileError, WaveFormat, SampleEncoding, SamplerInfo
//! ├── processing/   ← SampleBuffer conversion, sample codec, header generation
//! └── storage/      ← WaveWriter, WaveReader, chunk parsers
//! ```

pub mod models;
pub mod processing;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use models::error::{Result, WaveFileError};
pub use models::format::{SampleEncoding, SampleFormat, WaveFormat};
pub use models::sampler::{LoopType, SamplerInfo, SamplerLoop, SmpteTimecode};
pub use processing::buffer::{SampleBuffer, Samples};
pub use storage::chunks::{FormatChunk, FormatExtension};
pub use storage::reader::{Buffers, WaveReader};
pub use storage::writer::WaveWriter;
pub use traits::io_handle::{ByteSink, ByteSource, FileSink, FileSource, IoHandle};
