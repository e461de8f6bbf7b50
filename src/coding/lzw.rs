use crate::compression::DecompressionError;
use crate::progress::Progress;
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{self, Write};

/// The dictionary stops growing once it holds this many entries. Codes are
/// therefore always in `[0, MAX_DICTIONARY_SIZE - 1]`.
pub const MAX_DICTIONARY_SIZE: usize = 4096;

/// Every single byte has its own code from the start.
const ALPHABET_SIZE: usize = 256;

/// Number of bytes taken by a serialized code.
pub const CODE_LEN: usize = 2;

/// Progress is reported every this many input bytes (encoding) or codes
/// (decoding).
pub const PROGRESS_INTERVAL: usize = 5000;

/// A struct that is used to encode byte streams using LZW dictionary coding.
///
/// Each code is written as a fixed 16-bit big-endian integer, independently of
/// the current dictionary width. Once the dictionary holds
/// [`MAX_DICTIONARY_SIZE`] entries it is frozen: matching continues against the
/// existing entries and nothing is ever evicted.
///
/// For more information on LZW, see: [Lempel-Ziv-Welch](https://en.wikipedia.org/wiki/Lempel%E2%80%93Ziv%E2%80%93Welch)
pub struct LzwEncoder {
    // Maps (code of the prefix, next byte) to the code of the extended sequence.
    // Single bytes are implicit: their code is the byte value.
    dictionary: HashMap<(u16, u8), u16>,
    size: usize,
}

impl Default for LzwEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LzwEncoder {
    pub fn new() -> LzwEncoder {
        LzwEncoder {
            dictionary: HashMap::with_capacity(MAX_DICTIONARY_SIZE - ALPHABET_SIZE),
            size: ALPHABET_SIZE,
        }
    }

    /// The number of entries currently in the dictionary, single bytes included.
    pub fn dictionary_size(&self) -> usize {
        self.size
    }

    fn reset(&mut self) {
        self.dictionary.clear();
        self.size = ALPHABET_SIZE;
    }

    /// Encodes `input` and writes the codes to `to`. The dictionary is
    /// reinitialized first, so every call produces an independent stream.
    ///
    /// Returns the number of codes written.
    pub fn encode<W>(
        &mut self,
        input: &[u8],
        mut to: W,
        progress: &mut Progress,
    ) -> io::Result<usize>
    where
        W: Write,
    {
        self.reset();

        let mut count = 0;
        // The code of the longest match found so far.
        let mut current: Option<u16> = None;

        for (i, &byte) in input.iter().enumerate() {
            current = match current {
                None => Some(byte as u16),
                Some(prefix) => match self.dictionary.get(&(prefix, byte)) {
                    Some(&code) => Some(code),
                    None => {
                        to.write_u16::<BigEndian>(prefix)?;
                        count += 1;
                        self.insert(prefix, byte);
                        Some(byte as u16)
                    }
                },
            };
            progress.step(i + 1);
        }

        if let Some(prefix) = current {
            to.write_u16::<BigEndian>(prefix)?;
            count += 1;
        }

        debug!(
            "LZW encoded {} bytes into {} codes, dictionary size {}",
            input.len(),
            count,
            self.size
        );
        Ok(count)
    }

    fn insert(&mut self, prefix: u16, byte: u8) {
        if self.size >= MAX_DICTIONARY_SIZE {
            return;
        }
        self.dictionary.insert((prefix, byte), self.size as u16);
        self.size += 1;
        if self.size == MAX_DICTIONARY_SIZE {
            warn!("LZW dictionary is full, further input is matched against a frozen dictionary");
        }
    }
}

/// A struct that is used to decode code streams produced by [`LzwEncoder`].
pub struct LzwDecoder {
    entries: Vec<Vec<u8>>,
}

impl Default for LzwDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LzwDecoder {
    pub fn new() -> LzwDecoder {
        let mut decoder = LzwDecoder {
            entries: Vec::with_capacity(MAX_DICTIONARY_SIZE),
        };
        decoder.reset();
        decoder
    }

    /// The number of entries currently in the dictionary, single bytes included.
    pub fn dictionary_size(&self) -> usize {
        self.entries.len()
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.entries
            .extend((0..ALPHABET_SIZE).map(|byte| vec![byte as u8]));
    }

    /// Decodes a stream of 2-byte big-endian codes.
    ///
    /// The stream must hold at least one code and its first code must be a
    /// single byte. A code that is neither in the dictionary nor the next one
    /// to be assigned is rejected.
    pub fn decode(
        &mut self,
        codes: &[u8],
        progress: &mut Progress,
    ) -> Result<Vec<u8>, DecompressionError> {
        self.reset();

        if codes.is_empty() || codes.len() % CODE_LEN != 0 {
            return Err(DecompressionError::TruncatedStream);
        }

        let mut codes = codes.chunks_exact(CODE_LEN).map(BigEndian::read_u16);
        let mut output = Vec::new();

        let first = codes.next().ok_or(DecompressionError::TruncatedStream)?;
        if first as usize >= ALPHABET_SIZE {
            return Err(DecompressionError::InvalidCode {
                code: first,
                dictionary_size: self.entries.len(),
            });
        }
        let mut previous = self.entries[first as usize].clone();
        output.extend_from_slice(&previous);
        progress.step(1);

        for (i, code) in codes.enumerate() {
            let size = self.entries.len();
            let entry = if (code as usize) < size {
                self.entries[code as usize].clone()
            } else if code as usize == size && size < MAX_DICTIONARY_SIZE {
                // The encoder defined this code in the very step that emitted it.
                let mut entry = previous.clone();
                entry.push(previous[0]);
                entry
            } else {
                return Err(DecompressionError::InvalidCode {
                    code,
                    dictionary_size: size,
                });
            };

            output.extend_from_slice(&entry);
            if size < MAX_DICTIONARY_SIZE {
                let mut added = previous;
                added.push(entry[0]);
                self.entries.push(added);
            }
            previous = entry;
            progress.step(i + 2);
        }

        debug!(
            "LZW decoded {} bytes, dictionary size {}",
            output.len(),
            self.entries.len()
        );
        Ok(output)
    }
}
