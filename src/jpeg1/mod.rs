// JPEG 1 (Baseline and Lossless) implementation.
pub mod colour;
pub mod dct;
pub mod quantization;
pub mod huffman;
pub mod lossless;
pub mod encoder;
pub mod decoder;

pub use encoder::Jpeg1Encoder;
pub use decoder::Jpeg1Decoder;
pub use lossless::{Jpeg1LosslessDecoder, Jpeg1LosslessEncoder};
