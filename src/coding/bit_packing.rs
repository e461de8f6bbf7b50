use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use std::io::{self, Cursor};

/// Writes the bits to the given `BitWrite`, most significant bit first, then
/// pads the last byte with zeros.
pub fn write_bits<T>(bitwrite: &mut T, bits: &[bool]) -> io::Result<()>
where
    T: BitWrite,
{
    for &bit in bits {
        bitwrite.write_bit(bit)?;
    }
    bitwrite.byte_align()?;
    Ok(())
}

/// Reads exactly `count` bits from the given `BitRead` and discards the padding
/// bits left in the last byte.
///
/// Fails with `UnexpectedEof` if the reader runs out of bytes.
pub fn read_bits<T>(bitread: &mut T, count: usize) -> io::Result<Vec<bool>>
where
    T: BitRead,
{
    let mut bits = Vec::with_capacity(count);
    for _ in 0..count {
        bits.push(bitread.read_bit()?);
    }
    bitread.byte_align();
    Ok(bits)
}

/// Number of bytes needed to pack `count` bits.
pub fn packed_len(count: usize) -> usize {
    count.div_ceil(8)
}

/// Groups the bits into bytes of 8, MSB first. A short final group is padded
/// with zeros.
pub fn pack(bits: &[bool]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed_len(bits.len()));
    {
        let mut bitwriter: BitWriter<&mut Vec<u8>, BigEndian> = BitWriter::new(&mut out);
        write_bits(&mut bitwriter, bits).expect("writing to a Vec cannot fail");
    }
    out
}

/// Expands every byte into 8 bits, MSB first. If `limit` is given, the result
/// is truncated to at most `limit` bits.
pub fn unpack(bytes: &[u8], limit: Option<usize>) -> Vec<bool> {
    let available = bytes.len() * 8;
    let count = limit.map_or(available, |limit| limit.min(available));

    let mut bitreader: BitReader<Cursor<&[u8]>, BigEndian> = BitReader::new(Cursor::new(bytes));
    read_bits(&mut bitreader, count).expect("count never exceeds the available bits")
}
