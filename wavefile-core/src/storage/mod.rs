pub mod chunks;
pub mod reader;
pub mod writer;
