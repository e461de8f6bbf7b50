//! Image compression with two codecs sharing one container format:
//! a lossless codec (palette reduction followed by LZW coding of the palette
//! indices) and a lossy codec (16x16 blocks approximated by two colors).

pub mod coding;
pub mod compression;
pub mod progress;
pub mod session;
pub mod stats;
pub mod worker;
