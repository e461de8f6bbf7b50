use crate::compression::{
    decode, encode_lossless, encode_lossy, CompressionError, DecompressionError, PaletteOracle,
};
use crate::stats::CompressionStats;
use image::RgbImage;
use log::debug;
use thiserror::Error;

/// The states an editing session goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing loaded.
    Empty,
    /// An image is loaded and can be compressed.
    Loaded,
    /// A compressed stream is held, either produced from the loaded image or
    /// loaded from a file.
    Compressed,
    /// The stream produced from the loaded image has been saved.
    CompressedAndSaved,
    /// A loaded stream has been decompressed.
    Decompressed,
}

/// The operations that move a session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadImage,
    LoadCompressed,
    Compress,
    MarkSaved,
    Decompress,
    Reset,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no image loaded")]
    NoImage,
    #[error("the image has already been compressed")]
    AlreadyCompressed,
    #[error("the image has already been compressed and saved")]
    AlreadyCompressedAndSaved,
    #[error("the stream has already been decompressed")]
    AlreadyDecompressed,
    #[error("there is no compressed image to save")]
    NothingToSave,
    #[error("the session does not hold a compressed file")]
    NotACompressedFile,
    #[error("no compressed data loaded")]
    NoCompressedData,
    #[error("compression failed: {0}")]
    Compression(#[from] CompressionError),
    #[error("decompression failed: {0}")]
    Decompression(#[from] DecompressionError),
}

/// The transition table. `has_source` tells whether the session holds the
/// image its stream was produced from, as opposed to a stream loaded from a
/// file.
pub fn transition(state: State, operation: Operation, has_source: bool) -> Result<State, SessionError> {
    use Operation::*;
    use State::*;

    match (operation, state) {
        (LoadImage, _) => Ok(Loaded),
        (LoadCompressed, _) => Ok(Compressed),
        (Reset, _) => Ok(Empty),

        (Compress, Loaded) => Ok(Compressed),
        (Compress, Compressed) if has_source => Err(SessionError::AlreadyCompressed),
        (Compress, CompressedAndSaved) => Err(SessionError::AlreadyCompressedAndSaved),
        (Compress, Decompressed) => Err(SessionError::AlreadyDecompressed),
        (Compress, Empty | Compressed) => Err(SessionError::NoImage),

        (MarkSaved, Compressed | CompressedAndSaved) if has_source => Ok(CompressedAndSaved),
        (MarkSaved, _) => Err(SessionError::NothingToSave),

        (Decompress, Compressed | CompressedAndSaved) if !has_source => Ok(Decompressed),
        (Decompress, Decompressed) => Err(SessionError::AlreadyDecompressed),
        (Decompress, Empty) => Err(SessionError::NoCompressedData),
        (Decompress, Loaded | Compressed | CompressedAndSaved) => {
            Err(SessionError::NotACompressedFile)
        }
    }
}

/// Holds the image, stream and reconstruction of one editing session and only
/// allows the operations that make sense in its current state.
#[derive(Debug)]
pub struct Session {
    state: State,
    image: Option<RgbImage>,
    original_file_size: Option<u64>,
    compressed: Option<Vec<u8>>,
    decompressed: Option<RgbImage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            state: State::Empty,
            image: None,
            original_file_size: None,
            compressed: None,
            decompressed: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    pub fn compressed(&self) -> Option<&[u8]> {
        self.compressed.as_deref()
    }

    pub fn decompressed(&self) -> Option<&RgbImage> {
        self.decompressed.as_ref()
    }

    fn advance(&self, operation: Operation) -> Result<State, SessionError> {
        let next = transition(self.state, operation, self.image.is_some())?;
        debug!("session {:?}: {:?} -> {:?}", operation, self.state, next);
        Ok(next)
    }

    /// Starts over with `image`. `file_size` is the size of the file it was
    /// read from, if any, and is only used for statistics.
    pub fn load_image(&mut self, image: RgbImage, file_size: Option<u64>) {
        self.state = State::Loaded;
        self.image = Some(image);
        self.original_file_size = file_size;
        self.compressed = None;
        self.decompressed = None;
    }

    /// Starts over with a stream read from a file.
    pub fn load_compressed(&mut self, data: Vec<u8>) {
        self.state = State::Compressed;
        self.image = None;
        self.original_file_size = None;
        self.compressed = Some(data);
        self.decompressed = None;
    }

    pub fn compress_lossless<O>(&mut self, oracle: &O) -> Result<&[u8], SessionError>
    where
        O: PaletteOracle + ?Sized,
    {
        self.compress_with(|image| encode_lossless(image, oracle))
    }

    pub fn compress_lossy(&mut self) -> Result<&[u8], SessionError> {
        self.compress_with(encode_lossy)
    }

    fn compress_with<F>(&mut self, encode: F) -> Result<&[u8], SessionError>
    where
        F: FnOnce(&RgbImage) -> Result<Vec<u8>, CompressionError>,
    {
        let next = self.advance(Operation::Compress)?;
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        let data = encode(image)?;
        self.state = next;
        let data: &[u8] = self.compressed.insert(data);
        Ok(data)
    }

    /// Marks the stream produced from the loaded image as saved and returns the
    /// bytes to persist.
    pub fn mark_saved(&mut self) -> Result<&[u8], SessionError> {
        let next = self.advance(Operation::MarkSaved)?;
        self.state = next;
        self.compressed.as_deref().ok_or(SessionError::NothingToSave)
    }

    /// Decompresses a stream loaded from a file.
    pub fn decompress(&mut self) -> Result<&RgbImage, SessionError> {
        let next = self.advance(Operation::Decompress)?;
        let data = self
            .compressed
            .as_deref()
            .ok_or(SessionError::NoCompressedData)?;
        let image = decode(data)?;
        self.state = next;
        let image: &RgbImage = self.decompressed.insert(image);
        Ok(image)
    }

    pub fn reset(&mut self) {
        *self = Session::new();
    }

    /// Statistics of the stream produced from the loaded image.
    pub fn stats(&self) -> Option<CompressionStats> {
        let image = self.image.as_ref()?;
        let data = self.compressed.as_ref()?;
        let stats = CompressionStats::new(image.width(), image.height(), data.len() as u64);
        Some(match self.original_file_size {
            Some(size) => stats.with_original_file_size(size),
            None => stats,
        })
    }
}
