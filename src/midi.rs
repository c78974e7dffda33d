//! The complete pipeline: chunks, notes and tempo bundled into a single [`Midi`] value

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::{
        header::{Format, HeaderChunk},
        track::{
            interpreter::{EventInterpreter, RAW_CAPTURE},
            TrackChunk,
        },
        ChunkParser, ParseError,
    },
    notes::{NoteReconstructor, NoteTrack, RetriggerPolicy},
    tempo::{bpm_from_micros, TempoExtractor, DEFAULT_BPM},
};

/// Options that change how notes are rebuilt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParseOptions {
    /// Handling of a key struck again while still held
    pub retrigger: RetriggerPolicy,
}

/// Configurable entry point for parsing
pub struct MidiParser<'i> {
    /// Note reconstruction options
    options: ParseOptions,
    /// Strategy for events without built-in decoding
    interpreter: &'i dyn EventInterpreter,
}

impl Default for MidiParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiParser<'static> {
    /// A parser with default options that keeps unknown events raw
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            interpreter: &RAW_CAPTURE,
        }
    }
}

impl<'i> MidiParser<'i> {
    /// Replaces all options at once
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets how retriggered keys are handled
    pub fn retrigger(mut self, policy: RetriggerPolicy) -> Self {
        self.options.retrigger = policy;
        self
    }

    /// Hands meta and sysex events without built-in decoding to `interpreter`
    pub fn with_interpreter<'j>(self, interpreter: &'j dyn EventInterpreter) -> MidiParser<'j> {
        MidiParser {
            options: self.options,
            interpreter,
        }
    }

    /// The options in use
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parses a complete file held in memory
    pub fn parse(&self, data: &[u8]) -> Result<Midi, ParseError> {
        let (header, raw_tracks) = ChunkParser::with_interpreter(data, self.interpreter)
            .parse()?
            .into_parts();

        let reconstructor = NoteReconstructor::new(self.options.retrigger);
        let tracks = raw_tracks
            .iter()
            .map(|track| reconstructor.reconstruct(track.events()))
            .collect();

        let tempo = TempoExtractor::from_tracks(&raw_tracks).tempo();

        Ok(Midi {
            header,
            tracks,
            raw_tracks,
            tempo,
        })
    }
}

/// A parsed file: header metadata, notes per track and tempo
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Midi {
    /// The parsed header
    header: HeaderChunk,
    /// Notes of every decoded track
    tracks: Vec<NoteTrack>,
    /// Raw events of every decoded track
    raw_tracks: Vec<TrackChunk>,
    /// Last tempo found, microseconds per quarter note
    tempo: Option<u32>,
}

impl Midi {
    /// Parses a complete file with default options
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        MidiParser::new().parse(data)
    }

    /// The parsed header
    pub fn header(&self) -> &HeaderChunk {
        &self.header
    }

    /// The file's format
    pub fn format(&self) -> Format {
        self.header.format()
    }

    /// Number of tracks the header announces (may exceed [`Midi::tracks`] for cut-off files)
    pub fn track_count(&self) -> u16 {
        self.header.ntrks()
    }

    /// Ticks per quarter note, or `None` for SMPTE based timing
    pub fn ticks_per_beat(&self) -> Option<u16> {
        self.header.ticks_per_beat()
    }

    /// Last Set Tempo value in the file, in microseconds per quarter note
    pub fn tempo(&self) -> Option<u32> {
        self.tempo
    }

    /// Tempo in beats per minute, 120 when the file sets none
    pub fn bpm(&self) -> f64 {
        self.tempo
            .and_then(bpm_from_micros)
            .unwrap_or(DEFAULT_BPM)
    }

    /// Notes of every decoded track
    pub fn tracks(&self) -> &[NoteTrack] {
        &self.tracks
    }

    /// Notes of the track at `index`
    pub fn track(&self, index: usize) -> Option<&NoteTrack> {
        self.tracks.get(index)
    }

    /// Raw events of every decoded track
    pub fn raw_tracks(&self) -> &[TrackChunk] {
        &self.raw_tracks
    }

    /// Length in ticks of the first track, 0 when there is none
    pub fn track_length(&self) -> u64 {
        self.tracks.first().map_or(0, NoteTrack::length)
    }

    /// Length in ticks of the longest track
    pub fn len(&self) -> u64 {
        self.tracks.iter().map(NoteTrack::length).max().unwrap_or(0)
    }

    /// True when no track has a playable length, even if it holds open or zero length notes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{Midi, MidiParser};
    use crate::{chunk::header::Format, notes::RetriggerPolicy, tempo::DEFAULT_BPM};

    /// Wraps raw event bytes into a single track format 0 file
    fn single_track(events: &[u8]) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend([0, 0, 0, 6, 0, 0, 0, 1, 0x00, 0x60]);
        bytes.extend(b"MTrk");
        bytes.extend((events.len() as u32).to_be_bytes());
        bytes.extend(events);
        bytes
    }

    #[test]
    fn defaults_to_120_bpm() {
        let data = single_track(&[
            0x00, 0x90, 0x3C, 0x64, //
            0x60, 0x80, 0x3C, 0x00, //
            0x00, 0xFF, 0x2F, 0x00,
        ]);
        let midi = Midi::parse(&data).expect("Parse file");

        assert_eq!(midi.format(), Format::Zero);
        assert_eq!(midi.track_count(), 1);
        assert_eq!(midi.tempo(), None);
        assert_eq!(midi.bpm(), DEFAULT_BPM);
        assert_eq!(midi.track_length(), 0x60);
        assert_eq!(midi.len(), 0x60);
        assert!(!midi.is_empty());
        assert!(midi.track(1).is_none());
    }

    #[test]
    fn open_notes_have_no_playable_length() {
        let data = single_track(&[
            0x00, 0x90, 0x3C, 0x64, //
            0x00, 0xFF, 0x2F, 0x00,
        ]);
        let midi = Midi::parse(&data).expect("Parse file");

        assert!(midi.is_empty());
        assert_eq!(midi.len(), 0);
        assert_eq!(midi.track(0).map(|track| track.len()), Some(1));
    }

    #[test]
    fn retrigger_policy_reaches_reconstruction() {
        let data = single_track(&[
            0x00, 0x90, 0x3C, 0x64, //
            0x10, 0x3C, 0x64, // running status retrigger
            0x10, 0x3C, 0x00, // release
            0x00, 0xFF, 0x2F, 0x00,
        ]);

        let default = Midi::parse(&data).expect("Parse file");
        let track = default.track(0).expect("First track");
        assert_eq!(track.open().count(), 1);

        let strict = MidiParser::new()
            .retrigger(RetriggerPolicy::CloseAndReopen)
            .parse(&data)
            .expect("Parse file");
        let track = strict.track(0).expect("First track");
        assert_eq!(track.open().count(), 0);
        assert_eq!(track.notes()[0].duration(), Some(0x10));
    }
}
