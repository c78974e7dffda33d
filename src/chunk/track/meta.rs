//! Meta Event Structs and Parsing

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    interpreter::{EventInterpreter, Interpreted},
    TrackError,
};
use crate::reader::ByteCursor;

/// Largest integer payload (in bytes) decoded as a number rather than kept raw
const MAX_INTEGER_PAYLOAD: usize = 4;

/// A meta level event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MetaEvent {
    /// Text metadata, tag 0x01
    Text(String),
    /// Copyright, tag 0x02
    Copyright(String),
    /// Track name, tag 0x03
    TrackName(String),
    /// Instrument name, tag 0x04
    InstrumentName(String),
    /// Lyric, tag 0x05
    Lyric(String),
    /// Marker, tag 0x06
    Marker(String),
    /// Cue Point, tag 0x07
    CuePoint(String),
    /// Midi Port, tag 0x21
    MidiPort(u32),
    /// End of Track Identifier, tag 0x2F
    EndOfTrack,
    /// Tempo in microseconds per quarter note, tag 0x51
    Tempo(u32),
    /// Smpte Offset, tag 0x54
    SmpteOffset(SmpteOffset),
    /// Time signature, tag 0x58
    TimeSignature(TimeSignature),
    /// Key Signature as its raw big-endian payload, tag 0x59
    KeySignature(u32),
    /// A meta event claimed by an [`EventInterpreter`]
    Interpreted(u8, Interpreted),
    /// A meta event with no built-in meaning, payload kept raw
    Unknown(u8, Vec<u8>),
}

impl MetaEvent {
    /// Returns the specific event's tag
    pub fn get_tag(&self) -> u8 {
        match self {
            Self::Text(_) => 0x01,
            Self::Copyright(_) => 0x02,
            Self::TrackName(_) => 0x03,
            Self::InstrumentName(_) => 0x04,
            Self::Lyric(_) => 0x05,
            Self::Marker(_) => 0x06,
            Self::CuePoint(_) => 0x07,
            Self::MidiPort(_) => 0x21,
            Self::EndOfTrack => 0x2F,
            Self::Tempo(_) => 0x51,
            Self::SmpteOffset(_) => 0x54,
            Self::TimeSignature(_) => 0x58,
            Self::KeySignature(_) => 0x59,
            Self::Interpreted(tag, _) => *tag,
            Self::Unknown(tag, _) => *tag,
        }
    }

    /// Splits a key signature payload into its sharps/flats count and mode
    pub fn key_signature(&self) -> Option<KeySignature> {
        match self {
            Self::KeySignature(raw) => Some(KeySignature {
                sharps_flats: (*raw >> 8) as u8 as i8,
                minor: *raw & 0xFF != 0,
            }),
            _ => None,
        }
    }

    /// Decodes a meta event, with the cursor placed just after the 0xFF status byte
    pub(crate) fn decode(
        cursor: &mut ByteCursor<'_>,
        interpreter: &dyn EventInterpreter,
    ) -> Result<Self, TrackError> {
        let event_tag = cursor.read_u8()?;
        let length = cursor.read_var_length()? as usize;

        match event_tag {
            0x2F => {
                cursor.skip(length)?;
                Ok(MetaEvent::EndOfTrack)
            }

            0x01..=0x07 => {
                let text = cursor.read_string(length)?;
                Ok(match event_tag {
                    0x01 => MetaEvent::Text(text),
                    0x02 => MetaEvent::Copyright(text),
                    0x03 => MetaEvent::TrackName(text),
                    0x04 => MetaEvent::InstrumentName(text),
                    0x05 => MetaEvent::Lyric(text),
                    0x06 => MetaEvent::Marker(text),
                    _ => MetaEvent::CuePoint(text),
                })
            }

            0x21 | 0x51 | 0x59 if length <= MAX_INTEGER_PAYLOAD => {
                let value = cursor.read_uint(length)? as u32;
                Ok(match event_tag {
                    0x21 => MetaEvent::MidiPort(value),
                    0x51 => MetaEvent::Tempo(value),
                    _ => MetaEvent::KeySignature(value),
                })
            }

            0x54 => {
                let data = Self::read_fixed::<5>(cursor, length)?;
                Ok(MetaEvent::SmpteOffset(SmpteOffset {
                    hours: data[0],
                    minutes: data[1],
                    seconds: data[2],
                    frames: data[3],
                    subframes: data[4],
                }))
            }

            0x58 => {
                let data = Self::read_fixed::<4>(cursor, length)?;
                Ok(MetaEvent::TimeSignature(TimeSignature {
                    numerator: data[0],
                    denominator_power: data[1],
                    clocks_per_click: data[2],
                    thirty_second_notes_per_quarter: data[3],
                }))
            }

            _ => {
                let data = cursor.read_bytes(length)?;
                match interpreter.interpret_meta(event_tag, data) {
                    Some(value) => Ok(MetaEvent::Interpreted(event_tag, value)),
                    None => {
                        log::trace!(
                            "Keeping {length} raw bytes of meta event {event_tag:#04X}"
                        );
                        Ok(MetaEvent::Unknown(event_tag, data.to_vec()))
                    }
                }
            }
        }
    }

    /// Reads exactly `N` bytes, then skips whatever the declared length has beyond them
    fn read_fixed<const N: usize>(
        cursor: &mut ByteCursor<'_>,
        length: usize,
    ) -> Result<[u8; N], TrackError> {
        let mut data = [0u8; N];
        data.copy_from_slice(cursor.read_bytes(N)?);
        cursor.skip(length.saturating_sub(N))?;

        Ok(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A key signature
pub struct KeySignature {
    /// Number of sharps (positive) or flats (negative)
    pub sharps_flats: i8,
    /// True if in a minor key
    pub minor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// An SMPTE Offset
pub struct SmpteOffset {
    /// Hours of offset
    pub hours: u8,
    /// Minutes of offset
    pub minutes: u8,
    /// Seconds of offset
    pub seconds: u8,
    /// Frames of offset
    pub frames: u8,
    /// Subframes of offset
    pub subframes: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A Time Signature, kept as the four bytes it was written as
pub struct TimeSignature {
    /// The time signature's numerator
    pub numerator: u8,
    /// The denominator as a power of two
    pub denominator_power: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,
    /// Thirty second notes per quarter
    pub thirty_second_notes_per_quarter: u8,
}

impl TimeSignature {
    /// The time signature's denominator
    pub fn denominator(&self) -> u32 {
        1u32.checked_shl(self.denominator_power as u32).unwrap_or(0)
    }
}
