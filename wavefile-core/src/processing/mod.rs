pub mod buffer;
pub mod sample_codec;
pub mod wav_format;
