//! Byte level reading: a position-tracked cursor over an in-memory MIDI buffer, and a trait for
//! getting such a buffer out of files or owned data

use std::{convert::Infallible, fs, path::Path};

use thiserror::Error;

/// Error returned when a read needs more bytes than the buffer has left
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unexpected end of data")]
pub struct UnexpectedEof;

/// Maximum number of bytes a variable-length quantity may span
const MAX_VLQ_BYTES: usize = 4;

/// A read-only cursor over a borrowed byte buffer.
///
/// Every read advances the position. Failed reads leave the position where it was, so a caller
/// can always tell exactly how far decoding got.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    /// The full buffer being read
    data: &'a [u8],
    /// Offset of the next unread byte
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total length of the underlying buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns true once every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `n` bytes as a borrowed slice
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], UnexpectedEof> {
        if n > self.remaining() {
            return Err(UnexpectedEof);
        }

        let bytes = &self.data[self.position..self.position + n];
        self.position += n;

        Ok(bytes)
    }

    /// Reads `n` bytes (at most 8) as a big-endian unsigned integer
    pub fn read_uint(&mut self, n: usize) -> Result<u64, UnexpectedEof> {
        debug_assert!(n <= 8, "read_uint supports at most 8 bytes");

        let bytes = self.read_bytes(n)?;
        Ok(bytes
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | *byte as u64))
    }

    /// Reads a single byte
    pub fn read_u8(&mut self) -> Result<u8, UnexpectedEof> {
        let byte = *self.data.get(self.position).ok_or(UnexpectedEof)?;
        self.position += 1;

        Ok(byte)
    }

    /// Reads a big-endian u16
    pub fn read_u16(&mut self) -> Result<u16, UnexpectedEof> {
        self.read_uint(2).map(|val| val as u16)
    }

    /// Reads a big-endian u32
    pub fn read_u32(&mut self) -> Result<u32, UnexpectedEof> {
        self.read_uint(4).map(|val| val as u32)
    }

    /// Reads `n` bytes as text, mapping every byte to the character with the same code point
    pub fn read_string(&mut self, n: usize) -> Result<String, UnexpectedEof> {
        let bytes = self.read_bytes(n)?;
        Ok(bytes.iter().map(|byte| *byte as char).collect())
    }

    /// Reads a variable-length quantity.
    ///
    /// Each byte contributes its low 7 bits, most significant group first, and a set high bit
    /// means another byte follows. The quantity never spans more than 4 bytes; the 4th byte
    /// ends it whatever its high bit says.
    pub fn read_var_length(&mut self) -> Result<u32, UnexpectedEof> {
        const MASK: u8 = 0x7F;

        let start = self.position;
        let mut result: u32 = 0;

        for _ in 0..MAX_VLQ_BYTES {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(e) => {
                    self.position = start;
                    return Err(e);
                }
            };

            result = (result << 7) | (byte & MASK) as u32;

            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok(result)
    }

    /// Looks at the next byte without consuming it
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    /// Discards `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<(), UnexpectedEof> {
        self.read_bytes(n).map(|_| ())
    }

    /// Moves the position back by `n` bytes, stopping at the start of the buffer
    pub fn rewind(&mut self, n: usize) {
        self.position = self.position.saturating_sub(n);
    }

    /// Moves to an absolute position, clamped to the end of the buffer
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }
}

/// Trait that allows for different types to be turned into a buffer of MIDI bytes
pub trait MidiReadable {
    /// Error type that may be returned while acquiring the bytes
    type Error;
    /// Collects the full MIDI byte buffer
    fn get_midi_bytes(self) -> Result<Vec<u8>, Self::Error>;
}

/// Wrapper struct to allow passing an owned `Vec<u8>` to the [`MidiReadable`] trait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiData(pub Vec<u8>);

impl MidiReadable for MidiData {
    type Error = Infallible;
    fn get_midi_bytes(self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.0)
    }
}

impl<PATH> MidiReadable for PATH
where
    PATH: AsRef<Path>,
{
    type Error = std::io::Error;
    fn get_midi_bytes(self) -> Result<Vec<u8>, Self::Error> {
        fs::read(self.as_ref())
    }
}
