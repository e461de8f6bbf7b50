use super::error::{CompressionError, DecompressionError};
use crate::coding::bit_packing::{packed_len, read_bits, write_bits};
use crate::progress::Progress;
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use image::{GenericImageView, ImageBuffer, Rgb, RgbImage};
use log::debug;
use std::io::{self, Read, Write};

/// The block size used by the lossy codec.
pub const BLOCK_SIZE: u8 = 16;

/// Progress is reported every this many blocks.
pub const PROGRESS_INTERVAL: usize = 100;

/// Luma weights applied to the red, green and blue channels.
const LUMA_WEIGHTS: [f64; 3] = [0.2989, 0.587, 0.114];

fn luma(pixel: &Rgb<u8>) -> f64 {
    pixel
        .0
        .iter()
        .zip(LUMA_WEIGHTS)
        .map(|(&channel, weight)| channel as f64 * weight)
        .sum()
}

/// The area covered by a block. Blocks on the right and bottom edges are
/// clipped to the image and may be smaller than the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Partitions a `width * height` image into blocks, in row-major grid order.
pub fn grid(width: u32, height: u32, block_size: u32) -> impl Iterator<Item = Rect> {
    let rows = height.div_ceil(block_size);
    let columns = width.div_ceil(block_size);

    (0..rows).flat_map(move |by| {
        (0..columns).map(move |bx| {
            let (x, y) = (bx * block_size, by * block_size);
            Rect {
                x,
                y,
                width: block_size.min(width - x),
                height: block_size.min(height - y),
            }
        })
    })
}

/// Number of bytes taken by the record of a block with `pixel_count` pixels.
pub fn record_len(pixel_count: usize) -> usize {
    6 + packed_len(pixel_count)
}

/// Number of bytes taken by the records of all blocks of a `width * height`
/// image. Equal to summing [`record_len`] over [`grid`], without walking it.
///
/// # Panics
///
/// Panics if `block_size` is zero.
pub fn payload_len(width: u32, height: u32, block_size: u32) -> u64 {
    // (side, number of blocks with that side) for full and clipped blocks.
    let sides = |length: u32| {
        [
            (block_size, length / block_size),
            (length % block_size, (length % block_size > 0) as u32),
        ]
    };

    let mut total = 0;
    for (block_width, columns) in sides(width) {
        for (block_height, rows) in sides(height) {
            let pixels = block_width as usize * block_height as usize;
            total += columns as u64 * rows as u64 * record_len(pixels) as u64;
        }
    }
    total
}

/// A two color approximation of a block: every pixel takes either the `low`
/// or the `high` color, as selected by its mask bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub low: Rgb<u8>,
    pub high: Rgb<u8>,
    pub mask: Vec<bool>,
}

impl Block {
    /// Approximates the pixels of `image` inside `rect`.
    ///
    /// Pixels whose luma is at least the block mean go in the high group.
    /// Each color is the per channel mean of its group, truncated; an empty
    /// group takes the mean of the whole block.
    pub fn quantize(image: &RgbImage, rect: Rect) -> Block {
        let view = image.view(rect.x, rect.y, rect.width, rect.height);
        let pixels: Vec<Rgb<u8>> = view.pixels().map(|(_, _, pixel)| pixel).collect();

        let lumas: Vec<f64> = pixels.iter().map(luma).collect();
        let mean = lumas.iter().sum::<f64>() / lumas.len() as f64;
        let mask: Vec<bool> = lumas.iter().map(|&l| l >= mean).collect();

        // Channel sums and pixel counts of the low and high groups.
        let mut sums = [[0u64; 3]; 2];
        let mut counts = [0u64; 2];
        for (pixel, &bit) in pixels.iter().zip(&mask) {
            let group = bit as usize;
            counts[group] += 1;
            for (sum, &channel) in sums[group].iter_mut().zip(pixel.0.iter()) {
                *sum += channel as u64;
            }
        }

        let total = counts[0] + counts[1];
        let overall: [u64; 3] = [0, 1, 2].map(|c| sums[0][c] + sums[1][c]);
        let mean_of = |group: usize| -> Rgb<u8> {
            let (sum, count) = if counts[group] == 0 {
                (overall, total)
            } else {
                (sums[group], counts[group])
            };
            Rgb(sum.map(|s| (s / count.max(1)) as u8))
        };

        Block {
            low: mean_of(0),
            high: mean_of(1),
            mask,
        }
    }

    /// Writes the low color, the high color and the packed mask.
    pub fn write<T>(&self, bitwrite: &mut T) -> io::Result<()>
    where
        T: BitWrite,
    {
        bitwrite.write_bytes(&self.low.0)?;
        bitwrite.write_bytes(&self.high.0)?;
        write_bits(bitwrite, &self.mask)
    }

    /// Reads the record of a block holding `pixel_count` pixels. The padding
    /// bits of the mask are discarded.
    pub fn read<T>(bitread: &mut T, pixel_count: usize) -> io::Result<Block>
    where
        T: BitRead,
    {
        let mut low = [0; 3];
        let mut high = [0; 3];
        bitread.read_bytes(&mut low)?;
        bitread.read_bytes(&mut high)?;
        let mask = read_bits(bitread, pixel_count)?;
        Ok(Block {
            low: Rgb(low),
            high: Rgb(high),
            mask,
        })
    }

    /// Writes the block's pixels into `image` at `rect`.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is out of the image bounds.
    pub fn paint(&self, image: &mut RgbImage, rect: Rect) {
        let mut mask = self.mask.iter();
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let high = mask.next().copied().unwrap_or(false);
                image.put_pixel(x, y, if high { self.high } else { self.low });
            }
        }
    }
}

/// Splits images into blocks and replaces every block with its two color
/// approximation.
#[derive(Debug, Clone, Copy)]
pub struct BlockQuantizer {
    block_size: u8,
}

impl Default for BlockQuantizer {
    fn default() -> Self {
        BlockQuantizer {
            block_size: BLOCK_SIZE,
        }
    }
}

impl BlockQuantizer {
    /// Creates a quantizer for square blocks of `block_size` pixels a side.
    pub fn new(block_size: u32) -> Result<BlockQuantizer, CompressionError> {
        match u8::try_from(block_size) {
            Ok(block_size) if block_size > 0 => Ok(BlockQuantizer { block_size }),
            _ => Err(CompressionError::InvalidBlockSize(block_size)),
        }
    }

    pub fn block_size(&self) -> u8 {
        self.block_size
    }

    /// Number of blocks an image of the given dimensions is split into.
    pub fn block_count(&self, width: u32, height: u32) -> usize {
        let size = self.block_size as u32;
        width.div_ceil(size) as usize * height.div_ceil(size) as usize
    }

    /// Writes the records of all blocks of `image`, in row-major grid order.
    pub fn encode<W>(&self, image: &RgbImage, to: W, progress: &mut Progress) -> io::Result<()>
    where
        W: Write,
    {
        let mut bitwriter: BitWriter<W, BigEndian> = BitWriter::new(to);
        let mut count = 0;
        for rect in grid(image.width(), image.height(), self.block_size as u32) {
            Block::quantize(image, rect).write(&mut bitwriter)?;
            count += 1;
            progress.step(count);
        }
        bitwriter.flush()?;
        debug!("quantized {} blocks of size {}", count, self.block_size);
        Ok(())
    }
}

/// Rebuilds a `width * height` image from block records read from `from`.
///
/// The image buffer is allocated before any record is read. Callers that
/// hold the stream in memory check its length against [`payload_len`] first.
pub fn reconstruct<R>(
    from: R,
    width: u32,
    height: u32,
    block_size: u8,
    progress: &mut Progress,
) -> Result<RgbImage, DecompressionError>
where
    R: Read,
{
    if block_size == 0 {
        return Err(DecompressionError::InvalidBlockSize(block_size));
    }

    let mut bitreader: BitReader<R, BigEndian> = BitReader::new(from);
    let mut image: RgbImage = ImageBuffer::new(width, height);
    let mut count = 0;
    for rect in grid(width, height, block_size as u32) {
        let block = Block::read(&mut bitreader, rect.pixel_count())?;
        block.paint(&mut image, rect);
        count += 1;
        progress.step(count);
    }
    debug!("reconstructed {} blocks of size {}", count, block_size);
    Ok(image)
}
