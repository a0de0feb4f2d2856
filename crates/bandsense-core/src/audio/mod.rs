//! Audio input: capture backends and raw buffer decoding

pub mod backend;
pub mod decode;

pub use backend::{AudioBackend, BufferCallback, CaptureError, StreamFormat};
