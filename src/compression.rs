use crate::coding::lzw::{self, LzwDecoder, LzwEncoder};
use crate::progress::Progress;
use byteorder::{ReadBytesExt, WriteBytesExt};
use image::RgbImage;
use log::info;
use std::io::Cursor;

pub use block::{grid, payload_len, reconstruct, record_len, Block, BlockQuantizer, Rect, BLOCK_SIZE};
pub use error::{CompressionError, DecompressionError};
pub use format::{
    peek_mode, read_header, write_header, Header, Mode, LOSSLESS_HEADER_LEN, LOSSY_HEADER_LEN,
};
pub use palette::{ExactPalette, IndexedImage, PaletteOracle, PaletteTable, PALETTE_LEN};

mod block;
mod error;
mod format;
mod palette;

fn no_progress(_: f32) {}

/// Compresses `image` without loss beyond the palette reduction performed by
/// `oracle`.
///
/// The stream holds the header, the 256 entry palette and the LZW codes of
/// the palette indices.
pub fn encode_lossless<O>(image: &RgbImage, oracle: &O) -> Result<Vec<u8>, CompressionError>
where
    O: PaletteOracle + ?Sized,
{
    encode_lossless_with_progress(image, oracle, no_progress)
}

/// Like [`encode_lossless`], reporting the fraction of pixels coded so far.
pub fn encode_lossless_with_progress<O, F>(
    image: &RgbImage,
    oracle: &O,
    mut report: F,
) -> Result<Vec<u8>, CompressionError>
where
    O: PaletteOracle + ?Sized,
    F: FnMut(f32),
{
    // Reject oversized images before running the oracle on them.
    Header::new(Mode::Lossless, image.width(), image.height())?;
    let indexed = oracle.reduce(image);
    encode_indexed(&indexed, &mut report)
}

/// Writes the lossless stream of an image that is already palette reduced.
pub fn encode_indexed(
    indexed: &IndexedImage,
    report: &mut dyn FnMut(f32),
) -> Result<Vec<u8>, CompressionError> {
    let header = Header::new(Mode::Lossless, indexed.width, indexed.height)?;
    let expected = header.pixel_count();
    if indexed.indices.len() != expected {
        return Err(CompressionError::IndexCountMismatch {
            expected,
            actual: indexed.indices.len(),
        });
    }
    info!(
        "lossless encoding of a {}x{} image",
        header.width, header.height
    );

    let mut to = Vec::with_capacity(LOSSLESS_HEADER_LEN + expected);
    write_header(&header, &mut to)?;
    indexed.palette.write(&mut to)?;

    let mut progress = Progress::new(expected, lzw::PROGRESS_INTERVAL, report);
    let count = LzwEncoder::new().encode(&indexed.indices, &mut to, &mut progress)?;

    info!("lossless stream: {} codes, {} bytes", count, to.len());
    Ok(to)
}

/// Decompresses a lossless stream.
pub fn decode_lossless(data: &[u8]) -> Result<RgbImage, DecompressionError> {
    decode_lossless_with_progress(data, no_progress)
}

/// Like [`decode_lossless`], reporting the fraction of codes decoded so far.
pub fn decode_lossless_with_progress<F>(data: &[u8], mut report: F) -> Result<RgbImage, DecompressionError>
where
    F: FnMut(f32),
{
    Ok(decode_indexed(data, &mut report)?.to_rgb())
}

/// Decompresses a lossless stream to its palette indices and table.
pub fn decode_indexed(
    data: &[u8],
    report: &mut dyn FnMut(f32),
) -> Result<IndexedImage, DecompressionError> {
    let mut cursor = Cursor::new(data);
    let header = read_header(&mut cursor)?;
    expect_mode(&header, Mode::Lossless)?;
    let palette = PaletteTable::read(&mut cursor)?;
    info!(
        "lossless decoding of a {}x{} image",
        header.width, header.height
    );

    let codes = &data[LOSSLESS_HEADER_LEN..];
    let expected = header.pixel_count();
    let indices = if expected == 0 && codes.is_empty() {
        Vec::new()
    } else {
        let steps = codes.len() / lzw::CODE_LEN;
        let mut progress = Progress::new(steps, lzw::PROGRESS_INTERVAL, report);
        LzwDecoder::new().decode(codes, &mut progress)?
    };

    if indices.len() != expected {
        return Err(DecompressionError::PixelCountMismatch {
            expected,
            actual: indices.len(),
        });
    }

    Ok(IndexedImage {
        width: header.width as u32,
        height: header.height as u32,
        indices,
        palette,
    })
}

/// Compresses `image` with 16x16 two color blocks.
pub fn encode_lossy(image: &RgbImage) -> Result<Vec<u8>, CompressionError> {
    encode_lossy_with(image, &BlockQuantizer::default(), no_progress)
}

/// Compresses `image` with the given quantizer, reporting the fraction of
/// blocks coded so far.
pub fn encode_lossy_with<F>(
    image: &RgbImage,
    quantizer: &BlockQuantizer,
    mut report: F,
) -> Result<Vec<u8>, CompressionError>
where
    F: FnMut(f32),
{
    let header = Header::new(Mode::Lossy, image.width(), image.height())?;
    info!(
        "lossy encoding of a {}x{} image, block size {}",
        header.width,
        header.height,
        quantizer.block_size()
    );

    let mut to = Vec::new();
    write_header(&header, &mut to)?;
    to.write_u8(quantizer.block_size())?;

    let blocks = quantizer.block_count(image.width(), image.height());
    let mut progress = Progress::new(blocks, block::PROGRESS_INTERVAL, &mut report);
    quantizer.encode(image, &mut to, &mut progress)?;

    info!("lossy stream: {} blocks, {} bytes", blocks, to.len());
    Ok(to)
}

/// Decompresses a lossy stream.
pub fn decode_lossy(data: &[u8]) -> Result<RgbImage, DecompressionError> {
    decode_lossy_with_progress(data, no_progress)
}

/// Like [`decode_lossy`], reporting the fraction of blocks decoded so far.
pub fn decode_lossy_with_progress<F>(data: &[u8], mut report: F) -> Result<RgbImage, DecompressionError>
where
    F: FnMut(f32),
{
    let mut cursor = Cursor::new(data);
    let header = read_header(&mut cursor)?;
    expect_mode(&header, Mode::Lossy)?;
    let block_size = cursor.read_u8()?;
    info!(
        "lossy decoding of a {}x{} image, block size {}",
        header.width, header.height, block_size
    );

    if block_size == 0 {
        return Err(DecompressionError::InvalidBlockSize(block_size));
    }

    // Reject short payloads before the image buffer is allocated.
    let (width, height, size) = (header.width as u32, header.height as u32, block_size as u32);
    let available = (data.len() - LOSSY_HEADER_LEN) as u64;
    if available < payload_len(width, height, size) {
        return Err(DecompressionError::TruncatedStream);
    }

    let blocks = width.div_ceil(size) as usize * height.div_ceil(size) as usize;
    let mut progress = Progress::new(blocks, block::PROGRESS_INTERVAL, &mut report);
    reconstruct(cursor, width, height, block_size, &mut progress)
}

/// Decompresses a stream of either mode, as told by its first byte.
pub fn decode(data: &[u8]) -> Result<RgbImage, DecompressionError> {
    decode_with_progress(data, no_progress)
}

/// Like [`decode`], reporting progress of the selected codec.
pub fn decode_with_progress<F>(data: &[u8], report: F) -> Result<RgbImage, DecompressionError>
where
    F: FnMut(f32),
{
    match peek_mode(data)? {
        Mode::Lossless => decode_lossless_with_progress(data, report),
        Mode::Lossy => decode_lossy_with_progress(data, report),
    }
}

/// LZW codes for a raw byte stream, without any container.
pub fn encode_lossless_raw(indices: &[u8]) -> Vec<u8> {
    let mut to = Vec::with_capacity(indices.len());
    LzwEncoder::new()
        .encode(indices, &mut to, &mut Progress::silent())
        .expect("writing to a Vec cannot fail");
    to
}

/// Inverse of [`encode_lossless_raw`].
pub fn decode_lossless_raw(codes: &[u8]) -> Result<Vec<u8>, DecompressionError> {
    LzwDecoder::new().decode(codes, &mut Progress::silent())
}

fn expect_mode(header: &Header, expected: Mode) -> Result<(), DecompressionError> {
    if header.mode != expected {
        return Err(DecompressionError::UnexpectedMode {
            expected,
            found: header.mode,
        });
    }
    Ok(())
}
