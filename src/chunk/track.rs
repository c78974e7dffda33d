//! Track chunk data enums and structs

use event::MidiEvent;
use interpreter::EventInterpreter;
use meta::MetaEvent;
use sysex::SysexEvent;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::reader::{ByteCursor, UnexpectedEof};

pub mod event;
pub mod interpreter;
pub mod meta;
pub mod sysex;

/// Error types from decoding a single track event
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackError {
    /// Ran out of bytes in the middle of an event
    #[error("Reached end of data before done parsing an event")]
    UnexpectedEof(#[from] UnexpectedEof),
    /// The status byte does not belong to any known event category
    #[error("Unknown event status byte {0:#04X}")]
    UnknownEventType(u8),
}

/// A track chunk, containing one or more MTrk events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackChunk {
    /// All associated track events to this chunk
    mtrk_events: Vec<MTrkEvent>,
    /// True when the data ran out before an End of Track event
    truncated: bool,
}

impl TrackChunk {
    /// Decodes events until End of Track or the end of the data.
    ///
    /// Running out of data is not an error here: every event decoded before that point is kept
    /// and the chunk is flagged as truncated.
    pub fn decode(
        cursor: &mut ByteCursor<'_>,
        interpreter: &dyn EventInterpreter,
    ) -> Result<Self, TrackError> {
        let mut decoder = EventDecoder::new(interpreter);
        let mut mtrk_events = vec![];

        loop {
            match decoder.decode(cursor) {
                Ok(event) => {
                    let end = event.is_end_of_track();
                    mtrk_events.push(event);

                    if end {
                        return Ok(Self {
                            mtrk_events,
                            truncated: false,
                        });
                    }
                }
                Err(TrackError::UnexpectedEof(_)) => {
                    return Ok(Self {
                        mtrk_events,
                        truncated: true,
                    })
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// The decoded events, in file order
    pub fn events(&self) -> &[MTrkEvent] {
        &self.mtrk_events
    }

    /// True when the track ended without an End of Track event
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Iterates over events paired with their absolute time in ticks
    pub fn timed_events(&self) -> impl Iterator<Item = (u64, &MTrkEvent)> + '_ {
        self.mtrk_events.iter().scan(0u64, |time, event| {
            *time += event.delta_time as u64;
            Some((*time, event))
        })
    }
}

/// A MIDI Event with a DeltaTime and an attached Event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MTrkEvent {
    /// Delta time is a variable-length representation of how much time to wait in ticks before the
    /// event follows.
    delta_time: u32,
    /// The event that occurs after the delta time is waited for
    event: Event,
}

impl MTrkEvent {
    /// Pairs an event with the ticks elapsed since the previous one
    pub fn new(delta_time: u32, event: Event) -> Self {
        Self { delta_time, event }
    }

    /// Ticks since the previous event
    pub fn delta_time(&self) -> u32 {
        self.delta_time
    }

    /// The event itself
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// True for the End of Track meta event
    pub fn is_end_of_track(&self) -> bool {
        matches!(self.event, Event::MetaEvent(MetaEvent::EndOfTrack))
    }
}

/// Any event that may occur
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Event {
    /// A midi event
    MidiEvent(MidiEvent),
    /// A system exclusive event
    SysexEvent(SysexEvent),
    /// Specifies non-MIDI information useful to this format or to sequencers
    MetaEvent(MetaEvent),
}

/// Decodes one delta-timed event at a time, remembering the last status byte for running status.
///
/// A decoder is tied to a single track; running status never carries over between tracks.
pub struct EventDecoder<'i> {
    /// Last status byte seen in this track
    running_status: Option<u8>,
    /// Strategy for events without built-in decoding
    interpreter: &'i dyn EventInterpreter,
}

impl<'i> EventDecoder<'i> {
    /// Creates a decoder with no running status
    pub fn new(interpreter: &'i dyn EventInterpreter) -> Self {
        Self {
            running_status: None,
            interpreter,
        }
    }

    /// Decodes the next event. On failure the cursor is left at the start of the event.
    pub fn decode(&mut self, cursor: &mut ByteCursor<'_>) -> Result<MTrkEvent, TrackError> {
        let start = cursor.position();
        let result = self.decode_inner(cursor);

        if result.is_err() {
            cursor.seek(start);
        }

        result
    }

    /// Reads delta time, status and the event body
    fn decode_inner(&mut self, cursor: &mut ByteCursor<'_>) -> Result<MTrkEvent, TrackError> {
        let delta_time = cursor.read_var_length()?;
        let mut status = cursor.read_u8()?;

        if status >= 0x80 {
            self.running_status = Some(status);
        } else {
            // A data byte: reuse the previous status and read this byte again as data
            status = self
                .running_status
                .ok_or(TrackError::UnknownEventType(status))?;
            cursor.rewind(1);
        }

        let event = match status {
            0xFF => Event::MetaEvent(MetaEvent::decode(cursor, self.interpreter)?),
            0x80..=0xEF => Event::MidiEvent(MidiEvent::decode(status, cursor)?),
            0xF0..=0xFE => {
                Event::SysexEvent(SysexEvent::decode(status, cursor, self.interpreter)?)
            }
            _ => return Err(TrackError::UnknownEventType(status)),
        };

        Ok(MTrkEvent { delta_time, event })
    }
}
