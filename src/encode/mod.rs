//! Frame sinks: in-memory, PNG sequences and MP4 through the system `ffmpeg`.

pub mod ffmpeg;
pub mod png;
pub mod sink;
