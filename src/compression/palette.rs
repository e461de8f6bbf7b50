use super::error::DecompressionError;
use image::{ImageBuffer, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::{self, Read, Write};

/// Number of entries in a palette table.
pub const PALETTE_SIZE: usize = 256;

/// Serialized length of a palette table: one RGB triple per entry.
pub const PALETTE_LEN: usize = PALETTE_SIZE * 3;

/// An ordered table of exactly 256 colors. Unused entries are black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteTable {
    colors: [[u8; 3]; PALETTE_SIZE],
}

impl Default for PaletteTable {
    fn default() -> Self {
        PaletteTable {
            colors: [[0; 3]; PALETTE_SIZE],
        }
    }
}

impl PaletteTable {
    /// Builds a table from at most 256 colors, padding the rest with zeros.
    ///
    /// Returns `None` if more than 256 colors are given.
    pub fn from_colors(colors: &[Rgb<u8>]) -> Option<PaletteTable> {
        if colors.len() > PALETTE_SIZE {
            return None;
        }
        let mut table = PaletteTable::default();
        for (entry, color) in table.colors.iter_mut().zip(colors) {
            *entry = color.0;
        }
        Some(table)
    }

    pub fn color(&self, index: u8) -> Rgb<u8> {
        Rgb(self.colors[index as usize])
    }

    pub fn write<T>(&self, mut to: T) -> io::Result<()>
    where
        T: Write,
    {
        for color in &self.colors {
            to.write_all(color)?;
        }
        Ok(())
    }

    pub fn read<T>(mut from: T) -> Result<PaletteTable, DecompressionError>
    where
        T: Read,
    {
        let mut table = PaletteTable::default();
        for color in table.colors.iter_mut() {
            from.read_exact(color)?;
        }
        Ok(table)
    }
}

/// A `width * height` buffer of palette indices, in raster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    pub indices: Vec<u8>,
    pub palette: PaletteTable,
}

impl IndexedImage {
    /// Replaces every index with its palette color.
    ///
    /// # Panics
    ///
    /// Panics if `indices` holds fewer than `width * height` entries.
    pub fn to_rgb(&self) -> RgbImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let index = self.indices[(y as usize) * (self.width as usize) + x as usize];
            self.palette.color(index)
        })
    }
}

/// Reduces an RGB image to at most 256 colors.
///
/// Implementations must return exactly `width * height` indices.
pub trait PaletteOracle {
    fn reduce(&self, image: &RgbImage) -> IndexedImage;
}

impl<F> PaletteOracle for F
where
    F: Fn(&RgbImage) -> IndexedImage,
{
    fn reduce(&self, image: &RgbImage) -> IndexedImage {
        self(image)
    }
}

/// An oracle that assigns palette entries to colors in order of first
/// appearance. It is lossless for images with at most 256 distinct colors;
/// any further color is mapped to the closest entry already in the table.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactPalette;

fn distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&a, &b)| {
            let d = a as i32 - b as i32;
            (d * d) as u32
        })
        .sum()
}

impl PaletteOracle for ExactPalette {
    fn reduce(&self, image: &RgbImage) -> IndexedImage {
        let mut colors: Vec<Rgb<u8>> = Vec::new();
        let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
        let mut indices = Vec::with_capacity(image.as_raw().len() / 3);

        for pixel in image.pixels() {
            let index = match lookup.get(&pixel.0) {
                Some(&index) => index,
                None if colors.len() < PALETTE_SIZE => {
                    let index = colors.len() as u8;
                    colors.push(*pixel);
                    lookup.insert(pixel.0, index);
                    index
                }
                None => {
                    let (index, _) = colors
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, color)| distance(color.0, pixel.0))
                        .unwrap_or((0, pixel));
                    let index = index as u8;
                    lookup.insert(pixel.0, index);
                    index
                }
            };
            indices.push(index);
        }

        IndexedImage {
            width: image.width(),
            height: image.height(),
            indices,
            palette: PaletteTable::from_colors(&colors).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ExactPalette, IndexedImage, PaletteOracle, PaletteTable, PALETTE_LEN};
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn test_palette_is_zero_padded() {
        let table = PaletteTable::from_colors(&[Rgb([1, 2, 3]), Rgb([4, 5, 6])]).unwrap();
        let mut to = Vec::new();
        table.write(&mut to).unwrap();
        assert_eq!(to.len(), PALETTE_LEN);
        assert_eq!(&to[..6], &[1, 2, 3, 4, 5, 6]);
        assert!(to[6..].iter().all(|&b| b == 0));

        assert_eq!(PaletteTable::read(Cursor::new(&to)).unwrap(), table);
    }

    #[test]
    #[should_panic]
    fn test_to_rgb_missing_indices() {
        let indexed = IndexedImage {
            width: 3,
            height: 2,
            indices: vec![0; 5],
            palette: PaletteTable::default(),
        };
        indexed.to_rgb();
    }

    #[test]
    fn test_too_many_colors() {
        let colors = vec![Rgb([0, 0, 0]); 257];
        assert!(PaletteTable::from_colors(&colors).is_none());
    }

    #[test]
    fn test_exact_palette_roundtrip() {
        let image = RgbImage::from_fn(20, 13, |x, y| Rgb([(x * 12) as u8, (y * 19) as u8, 7]));
        let indexed = ExactPalette.reduce(&image);
        assert_eq!(indexed.indices.len(), 20 * 13);
        assert_eq!(indexed.to_rgb(), image);
    }

    #[test]
    fn test_exact_palette_overflow_maps_to_nearest() {
        // 300 distinct colors: the last 44 reuse existing entries.
        let image = RgbImage::from_fn(300, 1, |x, _| Rgb([(x % 256) as u8, (x / 256) as u8, 0]));
        let indexed = ExactPalette.reduce(&image);
        assert!(indexed.indices.iter().all(|&i| (i as usize) < 256));
        assert_eq!(indexed.palette.color(indexed.indices[256]), Rgb([0, 0, 0]));
        assert_eq!(indexed.palette.color(indexed.indices[299]), Rgb([43, 0, 0]));
    }
}
