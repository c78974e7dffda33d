//! Chunk level parsing: the `MThd` header followed by one `MTrk` chunk per track

use header::{HeaderChunk, InvalidFormat};
use thiserror::Error;
use track::{interpreter::EventInterpreter, TrackChunk, TrackError};

use crate::{
    chunk::chunk_types::{HEADER_CHUNK, TRACK_DATA_CHUNK},
    reader::{ByteCursor, UnexpectedEof},
    Chunk,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod chunk_types;
pub mod header;
pub mod track;

/// Minimum length of the header chunk's data
const HEADER_LENGTH: usize = 6;

/// Error type for parsing a MIDI file
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The data does not start with a valid `MThd` chunk
    #[error("Missing or malformed MThd header chunk")]
    InvalidHeader,
    /// Invalid format in parsing a header
    #[error("Invalid Format Specified")]
    InvalidFormat(#[from] InvalidFormat),
    /// A track chunk does not start with `MTrk`
    #[error("Track chunk {index} does not start with MTrk")]
    InvalidTrackChunk {
        /// Index of the offending track
        index: u16,
    },
    /// The data ended inside the header
    #[error("Unexpected end of data while reading the header")]
    UnexpectedEof(#[from] UnexpectedEof),
    /// A status byte that matches no event category
    #[error("Unknown event status byte {status:#04X} in track {track}")]
    UnknownEventType {
        /// Index of the track being decoded
        track: u16,
        /// The offending byte
        status: u8,
    },
}

/// A header paired with the raw events of every decoded track
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawMidi {
    /// The parsed header
    header: HeaderChunk,
    /// One chunk per decoded track, in file order
    tracks: Vec<TrackChunk>,
}

impl RawMidi {
    /// The parsed header
    pub fn header(&self) -> &HeaderChunk {
        &self.header
    }

    /// Decoded tracks, which may be fewer than the header announces
    pub fn tracks(&self) -> &[TrackChunk] {
        &self.tracks
    }

    /// Splits into header and tracks
    pub fn into_parts(self) -> (HeaderChunk, Vec<TrackChunk>) {
        (self.header, self.tracks)
    }
}

/// Where the parser is in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Nothing read yet
    ExpectHeaderChunk,
    /// The header is read, track `index` of `total` comes next
    ExpectTrackChunk {
        /// Index of the next track
        index: u16,
        /// Number of tracks the header announced
        total: u16,
    },
    /// All announced tracks are read, or the data ran out
    Done,
}

/// Walks the chunks of a Standard MIDI File held entirely in memory
pub struct ChunkParser<'a, 'i> {
    /// Cursor over the whole file
    cursor: ByteCursor<'a>,
    /// Current position in the chunk sequence
    state: ParserState,
    /// Strategy for events without built-in decoding
    interpreter: &'i dyn EventInterpreter,
}

impl<'a> ChunkParser<'a, 'static> {
    /// Creates a parser that keeps unknown events as raw bytes
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_interpreter(data, &track::interpreter::RAW_CAPTURE)
    }
}

impl<'a, 'i> ChunkParser<'a, 'i> {
    /// Creates a parser that hands unknown events to `interpreter`
    pub fn with_interpreter(data: &'a [u8], interpreter: &'i dyn EventInterpreter) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            state: ParserState::ExpectHeaderChunk,
            interpreter,
        }
    }

    /// Parses the header and every track the data holds
    pub fn parse(mut self) -> Result<RawMidi, ParseError> {
        let header = self.read_header()?;
        let mut tracks = Vec::with_capacity(header.ntrks() as usize);

        while let Some(track) = self.next_track()? {
            tracks.push(track);
        }

        Ok(RawMidi { header, tracks })
    }

    /// Reads the `MThd` chunk
    pub fn read_header(&mut self) -> Result<HeaderChunk, ParseError> {
        debug_assert_eq!(self.state, ParserState::ExpectHeaderChunk);

        let chunk = Chunk::read(&mut self.cursor).map_err(|_| ParseError::InvalidHeader)?;
        if chunk.chunk_type != HEADER_CHUNK || chunk.len() < HEADER_LENGTH {
            return Err(ParseError::InvalidHeader);
        }

        let format = self.cursor.read_u16()?;
        let ntrks = self.cursor.read_u16()?;
        let division = self.cursor.read_u16()?;

        // Newer revisions may append fields we don't know about
        self.cursor.skip(chunk.len() - HEADER_LENGTH)?;

        let header = HeaderChunk::try_from((format, ntrks, division))?;
        self.state = ParserState::ExpectTrackChunk {
            index: 0,
            total: ntrks,
        };

        Ok(header)
    }

    /// Reads the next `MTrk` chunk, or `None` once every announced track is read or the data
    /// runs out
    pub fn next_track(&mut self) -> Result<Option<TrackChunk>, ParseError> {
        let ParserState::ExpectTrackChunk { index, total } = self.state else {
            return Ok(None);
        };

        if index >= total {
            self.state = ParserState::Done;
            return Ok(None);
        }

        let Ok(magic) = self.cursor.read_bytes(4) else {
            return Ok(self.data_ran_out(index, total));
        };

        if magic != TRACK_DATA_CHUNK.as_slice() {
            return Err(ParseError::InvalidTrackChunk { index });
        }

        let Ok(length) = self.cursor.read_u32() else {
            return Ok(self.data_ran_out(index, total));
        };

        let start = self.cursor.position();
        let track = TrackChunk::decode(&mut self.cursor, self.interpreter).map_err(|e| match e {
            TrackError::UnknownEventType(status) => ParseError::UnknownEventType {
                track: index,
                status,
            },
            TrackError::UnexpectedEof(e) => ParseError::UnexpectedEof(e),
        })?;

        if track.is_truncated() {
            log::warn!(
                "Track {index} ends without an End of Track event after {} events",
                track.events().len()
            );
            self.state = ParserState::Done;
            return Ok(Some(track));
        }

        self.skip_to_chunk_end(index, start, length as usize);
        self.state = ParserState::ExpectTrackChunk {
            index: index + 1,
            total,
        };

        Ok(Some(track))
    }

    /// Ends the track loop early, keeping what was decoded so far
    fn data_ran_out(&mut self, index: u16, total: u16) -> Option<TrackChunk> {
        log::warn!("Header announces {total} tracks but the data ends after {index}");
        self.state = ParserState::Done;
        None
    }

    /// Moves past trailing bytes between End of Track and the declared end of the chunk
    fn skip_to_chunk_end(&mut self, index: u16, start: usize, length: usize) {
        let consumed = self.cursor.position() - start;
        if consumed == length {
            return;
        }

        log::debug!("Track {index} declares {length} bytes but its events span {consumed}");

        let end = start.saturating_add(length);
        if consumed < length && end <= self.cursor.len() {
            self.cursor.seek(end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{header::Format, ChunkParser, ParseError};
    use crate::reader::UnexpectedEof;

    /// Builds a header chunk followed by the given raw track chunks
    fn file(format: u16, ntrks: u16, tracks: &[&[u8]]) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend(6u32.to_be_bytes());
        bytes.extend(format.to_be_bytes());
        bytes.extend(ntrks.to_be_bytes());
        bytes.extend(96u16.to_be_bytes());

        for events in tracks {
            bytes.extend(b"MTrk");
            bytes.extend((events.len() as u32).to_be_bytes());
            bytes.extend(events.iter());
        }

        bytes
    }

    /// A note on/off pair followed by End of Track
    const TRACK: &[u8] = &[
        0x00, 0x90, 0x3C, 0x64, //
        0x60, 0x80, 0x3C, 0x40, //
        0x00, 0xFF, 0x2F, 0x00,
    ];

    #[test]
    fn parses_header_and_tracks() {
        let data = file(1, 2, &[TRACK, TRACK]);
        let midi = ChunkParser::new(&data).parse().expect("Parse well formed file");

        assert_eq!(midi.header().format(), Format::One);
        assert_eq!(midi.header().ticks_per_beat(), Some(96));
        assert_eq!(midi.tracks().len(), 2);
        assert_eq!(midi.tracks()[1].events().len(), 3);
    }

    #[test]
    fn bad_magic_is_invalid_header() {
        let mut data = file(0, 1, &[TRACK]);
        data[0] = b'X';

        assert_eq!(
            ChunkParser::new(&data).parse(),
            Err(ParseError::InvalidHeader)
        );
        assert_eq!(
            ChunkParser::new(b"MT").parse(),
            Err(ParseError::InvalidHeader)
        );
    }

    #[test]
    fn short_header_length_is_invalid() {
        let mut data = file(0, 1, &[TRACK]);
        data[7] = 4;

        assert_eq!(
            ChunkParser::new(&data).parse(),
            Err(ParseError::InvalidHeader)
        );
    }

    #[test]
    fn header_cut_short_is_eof() {
        let data = file(0, 1, &[]);
        assert_eq!(
            ChunkParser::new(&data[..11]).parse(),
            Err(ParseError::UnexpectedEof(UnexpectedEof))
        );
    }

    #[test]
    fn header_surplus_is_skipped() {
        let mut data = b"MThd".to_vec();
        data.extend(8u32.to_be_bytes());
        data.extend([0x00, 0x00, 0x00, 0x01, 0x00, 0x60, 0xAA, 0xBB]);
        data.extend(b"MTrk");
        data.extend((TRACK.len() as u32).to_be_bytes());
        data.extend(TRACK);

        let midi = ChunkParser::new(&data).parse().expect("Parse extended header");
        assert_eq!(midi.tracks().len(), 1);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let data = file(9, 1, &[TRACK]);
        assert!(matches!(
            ChunkParser::new(&data).parse(),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn missing_tracks_yield_partial_result() {
        let data = file(1, 3, &[TRACK]);
        let midi = ChunkParser::new(&data).parse().expect("Parse partial file");

        assert_eq!(midi.header().ntrks(), 3);
        assert_eq!(midi.tracks().len(), 1);
    }

    #[test]
    fn bad_track_magic_aborts() {
        let mut data = file(1, 2, &[TRACK, TRACK]);
        let second = data.len() - TRACK.len() - 8;
        data[second] = b'X';

        assert_eq!(
            ChunkParser::new(&data).parse(),
            Err(ParseError::InvalidTrackChunk { index: 1 })
        );
    }

    #[test]
    fn bad_magic_in_last_bytes_aborts() {
        let mut data = file(1, 2, &[TRACK]);
        data.extend(b"JUNK");

        assert_eq!(
            ChunkParser::new(&data).parse(),
            Err(ParseError::InvalidTrackChunk { index: 1 })
        );

        data.extend([0x00, 0x00, 0x00, 0x04]);
        assert_eq!(
            ChunkParser::new(&data).parse(),
            Err(ParseError::InvalidTrackChunk { index: 1 })
        );
    }

    #[test]
    fn magic_without_length_yields_partial_result() {
        let mut data = file(1, 2, &[TRACK]);
        data.extend(b"MTrk");
        data.extend([0x00, 0x00]);

        let midi = ChunkParser::new(&data).parse().expect("Parse file cut inside a prefix");
        assert_eq!(midi.tracks().len(), 1);

        let mut data = file(1, 2, &[TRACK]);
        data.extend(b"MT");

        let midi = ChunkParser::new(&data).parse().expect("Parse file cut inside a magic");
        assert_eq!(midi.tracks().len(), 1);
    }

    #[test]
    fn unknown_event_aborts_parse() {
        let data = file(0, 1, &[&[0x00, 0x12, 0x34]]);
        assert_eq!(
            ChunkParser::new(&data).parse(),
            Err(ParseError::UnknownEventType {
                track: 0,
                status: 0x12
            })
        );
    }

    #[test]
    fn trailing_track_bytes_are_skipped() {
        let mut padded = TRACK.to_vec();
        padded.extend([0x00, 0x00, 0x00]);

        let data = file(1, 2, &[&padded, TRACK]);
        let midi = ChunkParser::new(&data).parse().expect("Parse padded track");

        assert_eq!(midi.tracks().len(), 2);
        assert_eq!(midi.tracks()[0], midi.tracks()[1]);
    }

    #[test]
    fn overlong_events_continue_from_where_they_end() {
        // Declared length covers only the first event
        let mut data = file(1, 2, &[]);
        data.extend(b"MTrk");
        data.extend(4u32.to_be_bytes());
        data.extend(TRACK);
        data.extend(b"MTrk");
        data.extend((TRACK.len() as u32).to_be_bytes());
        data.extend(TRACK);

        let midi = ChunkParser::new(&data).parse().expect("Parse understated track");
        assert_eq!(midi.tracks().len(), 2);
        assert_eq!(midi.tracks()[0], midi.tracks()[1]);
    }

    #[test]
    fn declared_end_past_buffer_is_ignored() {
        let mut data = file(0, 1, &[]);
        data.extend(b"MTrk");
        data.extend(1000u32.to_be_bytes());
        data.extend(TRACK);

        let midi = ChunkParser::new(&data).parse().expect("Parse overstated track");
        assert_eq!(midi.tracks().len(), 1);
        assert!(!midi.tracks()[0].is_truncated());
        assert_eq!(midi.tracks()[0].events().len(), 3);
    }

    #[test]
    fn truncated_track_ends_parsing() {
        let data = file(1, 2, &[TRACK, TRACK]);
        let cut = &data[..data.len() - 6];

        let midi = ChunkParser::new(cut).parse().expect("Parse truncated file");
        assert_eq!(midi.tracks().len(), 2);
        assert!(!midi.tracks()[0].is_truncated());
        assert!(midi.tracks()[1].is_truncated());
        assert_eq!(midi.tracks()[1].events().len(), 1);
    }
}
