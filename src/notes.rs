//! Rebuilding notes from note-on/note-off event pairs

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chunk::track::{
    event::{MidiStatus, NoteMeta},
    Event, MTrkEvent,
};

/// Pitch class names, starting at C
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name of a MIDI note number ("C4" for 60), or `None` above 127
pub fn note_name(midi_number: u8) -> Option<String> {
    if midi_number > 127 {
        return None;
    }

    let octave = (midi_number / 12) as i8 - 1;
    Some(format!("{}{octave}", NOTE_NAMES[(midi_number % 12) as usize]))
}

/// A single note with its onset and length in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Note {
    /// MIDI key number, 0-127
    midi_number: u8,
    /// Absolute tick the note starts at
    start_time: u64,
    /// Length in ticks, `None` while the note is still open
    duration: Option<u64>,
    /// Channel of the note on event
    channel: u8,
    /// Velocity of the note on event
    velocity: u8,
}

impl Note {
    /// MIDI key number
    pub fn midi_number(&self) -> u8 {
        self.midi_number
    }

    /// Absolute start tick
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Length in ticks once a release was seen
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// Absolute tick the note ends at, once resolved
    pub fn end_time(&self) -> Option<u64> {
        self.duration.map(|duration| self.start_time + duration)
    }

    /// Channel the note was played on
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Velocity the note was struck with
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// True until a matching release resolves the duration
    pub fn is_open(&self) -> bool {
        self.duration.is_none()
    }

    /// Scientific pitch name, e.g. "A4"
    pub fn name(&self) -> Option<String> {
        note_name(self.midi_number)
    }
}

/// What to do when a pitch is struck again while a note of that pitch is still open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RetriggerPolicy {
    /// Append a new note and leave the earlier one open for good
    #[default]
    Append,
    /// Close the earlier note at the retrigger tick, then append the new one
    CloseAndReopen,
}

/// The notes of one track, in the order their note on events appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoteTrack {
    /// Every note, open ones included
    notes: Vec<Note>,
    /// Latest end tick among resolved notes
    length: u64,
}

impl NoteTrack {
    /// All notes in onset order, including ones that never got a release
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Notes with a resolved duration
    pub fn resolved(&self) -> impl Iterator<Item = &Note> + '_ {
        self.notes.iter().filter(|note| !note.is_open())
    }

    /// Notes that were never released
    pub fn open(&self) -> impl Iterator<Item = &Note> + '_ {
        self.notes.iter().filter(|note| note.is_open())
    }

    /// Playback end boundary: the latest end tick of any resolved note
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Number of notes, open ones included
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// True when the track has no notes at all
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Takes the note list
    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }
}

/// Pairs note on and note off events of a single track into [`Note`]s.
///
/// Matching is by pitch only: a release closes the most recently started open note with the
/// same key, whatever its channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteReconstructor {
    /// Retrigger handling
    policy: RetriggerPolicy,
}

impl NoteReconstructor {
    /// Creates a reconstructor with the given retrigger handling
    pub fn new(policy: RetriggerPolicy) -> Self {
        Self { policy }
    }

    /// Walks the events of one track, in file order
    pub fn reconstruct<'e>(&self, events: impl IntoIterator<Item = &'e MTrkEvent>) -> NoteTrack {
        let mut notes: Vec<Note> = vec![];
        let mut time: u64 = 0;

        for event in events {
            time += event.delta_time() as u64;

            let Event::MidiEvent(midi) = event.event() else {
                continue;
            };

            match midi.status() {
                MidiStatus::NoteOn(NoteMeta { key, velocity }) if velocity > 0 => {
                    if let Some(open) = Self::last_open(&notes, key) {
                        match self.policy {
                            RetriggerPolicy::Append => {
                                log::debug!(
                                    "Key {key} struck again at tick {time} while open since tick {}",
                                    notes[open].start_time
                                );
                            }
                            RetriggerPolicy::CloseAndReopen => {
                                notes[open].duration = Some(time - notes[open].start_time);
                            }
                        }
                    }

                    notes.push(Note {
                        midi_number: key,
                        start_time: time,
                        duration: None,
                        channel: midi.channel(),
                        velocity,
                    });
                }

                MidiStatus::NoteOn(NoteMeta { key, .. })
                | MidiStatus::NoteOff(NoteMeta { key, .. }) => match Self::last_open(&notes, key) {
                    Some(open) => notes[open].duration = Some(time - notes[open].start_time),
                    None => {
                        log::debug!("Dropping release of key {key} at tick {time}, no open note")
                    }
                },

                _ => {}
            }
        }

        let length = notes.iter().filter_map(Note::end_time).max().unwrap_or(0);

        NoteTrack { notes, length }
    }

    /// Index of the most recently appended open note with this key
    fn last_open(notes: &[Note], key: u8) -> Option<usize> {
        notes
            .iter()
            .rposition(|note| note.midi_number == key && note.is_open())
    }
}
