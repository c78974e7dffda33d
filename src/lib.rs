//! # keyroll
//!
//! A Standard MIDI File decoder built for piano-roll style consumers. It turns a complete `.mid`
//! byte buffer into header metadata, one list of notes per track (pitch, start tick and duration
//! in ticks) and a tempo in beats per minute.
//!
//! ## Overview
//!
//! MIDI files are structured as a series of chunks. Each chunk contains a 4-character ASCII
//! type identifier and a 32-bit length that specifies how many bytes of data follow. The first
//! chunk is always the `MThd` header, followed by one `MTrk` chunk per track holding a stream of
//! delta-timed events.
//!
//! Decoding happens in a few layers:
//!
//! - [`reader::ByteCursor`] reads integers, strings and variable-length quantities.
//! - [`chunk::ChunkParser`] validates the chunks and decodes every track into raw
//!   [`chunk::track::MTrkEvent`]s, resolving running status along the way.
//! - [`notes::NoteReconstructor`] pairs note-on and note-off events into [`notes::Note`]s.
//! - [`tempo::TempoExtractor`] finds the tempo.
//!
//! [`Midi`] ties all of these together.
//!
//! ## Example Usage
//!
//! ```rust
//! use keyroll::Midi;
//!
//! let bytes = [
//!     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0,
//!     b'M', b'T', b'r', b'k', 0, 0, 0, 20,
//!     0x00, 0x90, 60, 100,
//!     0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20,
//!     0x83, 0x60, 0x80, 60, 0,
//!     0x00, 0xFF, 0x2F, 0x00,
//! ];
//!
//! let midi = Midi::parse(&bytes).expect("Parse a single track file");
//! assert_eq!(midi.ticks_per_beat(), Some(480));
//! assert_eq!(midi.bpm(), 120.0);
//!
//! let note = &midi.track(0).expect("First track").notes()[0];
//! assert_eq!((note.midi_number(), note.start_time(), note.duration()), (60, 0, Some(480)));
//! ```
//!
//! ## Extensibility
//!
//! Meta and system exclusive events that have no built-in meaning can be claimed by an
//! [`chunk::track::interpreter::EventInterpreter`] handed to [`MidiParser::with_interpreter`].
//! Without one, their payloads are kept as raw bytes.
//!

pub mod chunk;
pub mod midi;
pub mod notes;
pub mod reader;
pub mod tempo;

pub use chunk::ParseError;
pub use midi::{Midi, MidiParser, ParseOptions};

use reader::{ByteCursor, UnexpectedEof};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a raw MIDI Chunk prefix.
/// A MIDI Chunk consists of a 4-character ASCII type identifier and a 32-bit unsigned integer specifying the length of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chunk {
    /// 4 character ASCII chunk type
    pub chunk_type: [u8; 4],
    /// Length of the data that follows
    length: u32,
}

impl Chunk {
    /// Reads a chunk type and length from the cursor
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, UnexpectedEof> {
        let prefix = cursor.read_uint(8)?;
        Ok(prefix.into())
    }

    /// Gets the length of the chunk as a usize
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Returns if the chunk has no attributed data
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl From<u64> for Chunk {
    fn from(value: u64) -> Self {
        let [a, b, c, d, _, _, _, _] = value.to_be_bytes();

        Self {
            chunk_type: [a, b, c, d],
            length: value as u32,
        }
    }
}
