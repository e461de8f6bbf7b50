use super::error::{CompressionError, DecompressionError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Length of the fields shared by both modes: mode, width and height.
pub const HEADER_LEN: usize = 5;

/// Length of a lossless header, palette included.
pub const LOSSLESS_HEADER_LEN: usize = HEADER_LEN + super::palette::PALETTE_LEN;

/// Length of a lossy header, block size included.
pub const LOSSY_HEADER_LEN: usize = HEADER_LEN + 1;

/// The codec used to produce a stream. The discriminants are the values
/// stored in existing files and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lossless = 0,
    Lossy = 4,
}

impl TryFrom<u8> for Mode {
    type Error = DecompressionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Lossless),
            4 => Ok(Mode::Lossy),
            _ => Err(DecompressionError::UnrecognizedMode(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub mode: Mode,
    pub width: u16,
    pub height: u16,
}

impl Header {
    /// Builds a header, rejecting dimensions that do not fit in 16 bits.
    pub fn new(mode: Mode, width: u32, height: u32) -> Result<Header, CompressionError> {
        match (u16::try_from(width), u16::try_from(height)) {
            (Ok(width), Ok(height)) => Ok(Header {
                mode,
                width,
                height,
            }),
            _ => Err(CompressionError::DimensionOverflow { width, height }),
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

pub fn write_header<T>(header: &Header, mut to: T) -> io::Result<()>
where
    T: Write,
{
    to.write_u8(header.mode as u8)?;
    to.write_u16::<BigEndian>(header.width)?;
    to.write_u16::<BigEndian>(header.height)?;
    Ok(())
}

pub fn read_header<T>(mut from: T) -> Result<Header, DecompressionError>
where
    T: Read,
{
    let mode = from.read_u8()?.try_into()?;
    let width = from.read_u16::<BigEndian>()?;
    let height = from.read_u16::<BigEndian>()?;

    Ok(Header {
        mode,
        width,
        height,
    })
}

/// Returns the mode of a stream without parsing the rest of it.
pub fn peek_mode(data: &[u8]) -> Result<Mode, DecompressionError> {
    let mode = *data.first().ok_or(DecompressionError::TruncatedStream)?;
    mode.try_into()
}

#[cfg(test)]
mod test {
    use super::{peek_mode, read_header, write_header, Header, Mode};
    use crate::compression::{CompressionError, DecompressionError};
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let header = Header::new(Mode::Lossy, 640, 258).unwrap();
        let mut to = Vec::new();
        write_header(&header, &mut to).unwrap();
        assert_eq!(to, vec![4, 0x02, 0x80, 0x01, 0x02]);
        assert_eq!(read_header(Cursor::new(&to)).unwrap(), header);
    }

    #[test]
    fn test_dimension_overflow() {
        assert!(Header::new(Mode::Lossless, 65535, 65535).is_ok());
        assert!(matches!(
            Header::new(Mode::Lossless, 65536, 1),
            Err(CompressionError::DimensionOverflow {
                width: 65536,
                height: 1
            })
        ));
    }

    #[test]
    fn test_unrecognized_mode() {
        let err = read_header(Cursor::new(&[9u8, 0, 1, 0, 1])).unwrap_err();
        assert!(matches!(err, DecompressionError::UnrecognizedMode(9)));
        assert!(matches!(
            peek_mode(&[1]),
            Err(DecompressionError::UnrecognizedMode(1))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let err = read_header(Cursor::new(&[0u8, 0, 1])).unwrap_err();
        assert!(matches!(err, DecompressionError::TruncatedStream));
        assert!(matches!(
            peek_mode(&[]),
            Err(DecompressionError::TruncatedStream)
        ));
    }
}
