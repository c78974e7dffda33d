//! Tempo recovery from Set Tempo meta events

use crate::chunk::track::{meta::MetaEvent, Event, TrackChunk};

/// Microseconds per quarter note a file plays at until told otherwise
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Beats per minute matching [`DEFAULT_TEMPO`]
pub const DEFAULT_BPM: f64 = 120.0;

/// Microseconds in one minute
const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Converts microseconds per quarter note to beats per minute, `None` for a zero tempo
pub fn bpm_from_micros(micros_per_quarter: u32) -> Option<f64> {
    (micros_per_quarter > 0).then(|| MICROS_PER_MINUTE / micros_per_quarter as f64)
}

/// Collects the tempo of a file.
///
/// Only one tempo is kept: every Set Tempo event overwrites the previous one, so the result is
/// the last tempo in file order, whatever tick it was set at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TempoExtractor {
    /// Last tempo seen, in microseconds per quarter note
    micros_per_quarter: Option<u32>,
}

impl TempoExtractor {
    /// Creates an extractor that has seen no tempo yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every event of a track
    pub fn scan(&mut self, track: &TrackChunk) {
        for event in track.events() {
            if let Event::MetaEvent(MetaEvent::Tempo(micros)) = event.event() {
                self.micros_per_quarter = Some(*micros);
            }
        }
    }

    /// Scans tracks in order and returns the extractor
    pub fn from_tracks<'t>(tracks: impl IntoIterator<Item = &'t TrackChunk>) -> Self {
        let mut extractor = Self::new();
        for track in tracks {
            extractor.scan(track);
        }

        extractor
    }

    /// The last tempo seen, in microseconds per quarter note
    pub fn tempo(&self) -> Option<u32> {
        self.micros_per_quarter
    }

    /// The last tempo seen, in beats per minute
    pub fn bpm(&self) -> Option<f64> {
        self.micros_per_quarter.and_then(bpm_from_micros)
    }
}
