use super::format::Mode;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressionError {
    /// The image is too large to be described by the 16-bit header fields.
    #[error("image dimensions {width}x{height} exceed 65535")]
    DimensionOverflow { width: u32, height: u32 },
    /// The block size must be in `[1, 255]`.
    #[error("invalid block size: {0}")]
    InvalidBlockSize(u32),
    /// The palette oracle returned a number of indices other than `width * height`.
    #[error("expected {expected} palette indices, got {actual}")]
    IndexCountMismatch { expected: usize, actual: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum DecompressionError {
    /// The stream ended before the header or payload was complete.
    #[error("truncated stream")]
    TruncatedStream,
    /// The mode byte is neither lossless nor lossy.
    #[error("unrecognized mode: {0}")]
    UnrecognizedMode(u8),
    /// The stream was produced by the other codec.
    #[error("expected a {expected:?} stream, found {found:?}")]
    UnexpectedMode { expected: Mode, found: Mode },
    /// A code that is neither in the dictionary nor the next one to be assigned.
    #[error("invalid LZW code {code} (dictionary size {dictionary_size})")]
    InvalidCode { code: u16, dictionary_size: usize },
    /// A lossy stream declared a block size of zero.
    #[error("invalid block size: {0}")]
    InvalidBlockSize(u8),
    /// The decoded pixel stream does not fit the declared dimensions.
    #[error("expected {expected} pixels, decoded {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("io error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for DecompressionError {
    fn from(err: io::Error) -> DecompressionError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecompressionError::TruncatedStream,
            _ => DecompressionError::Io(err),
        }
    }
}
