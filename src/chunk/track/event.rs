//! Channel voice messages

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::TrackError;
use crate::reader::ByteCursor;

/// A channel voice event: a status nibble, a channel and its data bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MidiEvent {
    /// Channel the message is addressed to, 0-15
    channel: u8,
    /// The message itself
    status: MidiStatus,
}

impl MidiEvent {
    /// Creates an event on the given channel (only the low nibble is kept)
    pub fn new(channel: u8, status: MidiStatus) -> Self {
        Self {
            channel: channel & 0x0F,
            status,
        }
    }

    /// Channel the message is addressed to
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// The decoded message
    pub fn status(&self) -> MidiStatus {
        self.status
    }

    /// Number of data bytes that follow a channel voice status byte
    pub(crate) fn data_length(status: u8) -> Option<usize> {
        match status >> 4 {
            0x8 | 0x9 | 0xA | 0xB | 0xE => Some(2),
            0xC | 0xD => Some(1),
            _ => None,
        }
    }

    /// Reads the data bytes for `status` and builds the event
    pub(crate) fn decode(status: u8, cursor: &mut ByteCursor<'_>) -> Result<Self, TrackError> {
        let len = Self::data_length(status).ok_or(TrackError::UnknownEventType(status))?;
        let data = cursor.read_bytes(len)?;
        let channel = status & 0x0F;

        let status = match status >> 4 {
            0x8 => MidiStatus::NoteOff(NoteMeta {
                key: data[0],
                velocity: data[1],
            }),
            0x9 => MidiStatus::NoteOn(NoteMeta {
                key: data[0],
                velocity: data[1],
            }),
            0xA => MidiStatus::PolyphonicKeyPressure(NoteMeta {
                key: data[0],
                velocity: data[1],
            }),
            0xB => MidiStatus::ControlChange(ControlChange {
                controller_number: data[0],
                new_value: data[1],
            }),
            0xC => MidiStatus::ProgramChange(data[0]),
            0xD => MidiStatus::ChannelPressure(data[0]),
            // Least significant 7 bits come first
            _ => MidiStatus::PitchWheelChange(
                ((data[1] as u16 & 0x7F) << 7) | (data[0] as u16 & 0x7F),
            ),
        };

        Ok(Self { channel, status })
    }
}

/// A MIDI Message Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MidiStatus {
    /// Turn Off event
    /// This message is sent when a note is released
    NoteOff(NoteMeta),
    /// Turn On event
    /// This message is sent when a note is depressed
    NoteOn(NoteMeta),
    /// Polyphonic Key Pressure
    /// This message is most often sent by pressing down a key after it "bottoms out"
    PolyphonicKeyPressure(NoteMeta),
    /// Control change
    /// This message is sent when a controller value changes. Controllers include devices such as
    /// pedals and levers. Certain controller numbers are reserved.
    ControlChange(ControlChange),
    /// Program change.
    /// This message is sent when the patch number changes
    ProgramChange(u8),
    /// Channel Pressure
    /// This message is most often sent by pressing down on a key after it "bottoms out"
    ChannelPressure(u8),
    /// Pitch Wheel Change
    /// This message is sent to indicate a change in the pitch wheel as measured by a fourteen bit
    /// value.
    PitchWheelChange(u16),
}

/// Key and velocity of a note message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoteMeta {
    /// Note key
    pub key: u8,
    /// Note velocity
    pub velocity: u8,
}

/// Metadata for changing a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlChange {
    /// Controller number
    pub controller_number: u8,
    /// New value
    pub new_value: u8,
}

#[cfg(test)]
mod tests {
    use super::{ControlChange, MidiEvent, MidiStatus, NoteMeta};
    use crate::{chunk::track::TrackError, reader::ByteCursor};

    #[test]
    fn midi_event_status_parsing() {
        let key = 0b01010101;
        let velocity = 0b01111111;

        let data = [key, velocity];
        let mut cursor = ByteCursor::new(&data);
        let event = MidiEvent::decode(0b10001111, &mut cursor).expect("Parse off note signal");

        let expected = MidiEvent::new(0x0F, MidiStatus::NoteOff(NoteMeta { key, velocity }));

        assert_eq!(event, expected)
    }

    #[test]
    fn one_data_byte_messages() {
        let data = [0x05, 0x40];
        let mut cursor = ByteCursor::new(&data);

        let event = MidiEvent::decode(0xC3, &mut cursor).expect("Parse program change");
        assert_eq!(event.channel(), 3);
        assert_eq!(event.status(), MidiStatus::ProgramChange(0x05));

        let event = MidiEvent::decode(0xD0, &mut cursor).expect("Parse channel pressure");
        assert_eq!(event.status(), MidiStatus::ChannelPressure(0x40));
        assert!(cursor.is_empty());
    }

    #[test]
    fn controller_and_pitch_wheel() {
        let data = [0x40, 0x7F, 0x00, 0x40];
        let mut cursor = ByteCursor::new(&data);

        let event = MidiEvent::decode(0xB1, &mut cursor).expect("Parse control change");
        assert_eq!(
            event.status(),
            MidiStatus::ControlChange(ControlChange {
                controller_number: 0x40,
                new_value: 0x7F
            })
        );

        let event = MidiEvent::decode(0xE1, &mut cursor).expect("Parse pitch wheel");
        assert_eq!(event.status(), MidiStatus::PitchWheelChange(0x2000));
    }

    #[test]
    fn truncated_data_is_eof() {
        let data = [0x3C];
        let mut cursor = ByteCursor::new(&data);

        let event = MidiEvent::decode(0x90, &mut cursor);
        assert!(matches!(event, Err(TrackError::UnexpectedEof(_))));
    }

    #[test]
    fn non_channel_status_is_rejected() {
        let mut cursor = ByteCursor::new(&[]);
        let event = MidiEvent::decode(0xF8, &mut cursor);

        assert_eq!(event, Err(TrackError::UnknownEventType(0xF8)));
    }
}
