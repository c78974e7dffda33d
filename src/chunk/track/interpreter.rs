//! Pluggable decoding for events the decoder has no built-in meaning for

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A value produced by an [`EventInterpreter`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Interpreted {
    /// The payload read as a number
    Integer(u64),
    /// The payload read as text
    Text(String),
    /// Any other representation the interpreter wants to keep
    Bytes(Vec<u8>),
}

/// Strategy for decoding meta and system exclusive events the decoder itself leaves raw.
///
/// Returning `None` from a method keeps the default behavior of storing the raw payload.
///
/// ```rust
/// use keyroll::{
///     chunk::track::interpreter::{EventInterpreter, Interpreted},
///     MidiParser,
/// };
///
/// /// Reads sequencer specific events (0x7F) as a manufacturer id
/// struct SequencerId;
///
/// impl EventInterpreter for SequencerId {
///     fn interpret_meta(&self, meta_type: u8, payload: &[u8]) -> Option<Interpreted> {
///         (meta_type == 0x7F)
///             .then(|| payload.first().map(|id| Interpreted::Integer(*id as u64)))
///             .flatten()
///     }
/// }
///
/// let parser = MidiParser::new().with_interpreter(&SequencerId);
/// # let _ = parser;
/// ```
pub trait EventInterpreter {
    /// Called for meta events whose type has no built-in decoding
    fn interpret_meta(&self, _meta_type: u8, _payload: &[u8]) -> Option<Interpreted> {
        None
    }

    /// Called for every system exclusive event with its status byte and payload
    fn interpret_sysex(&self, _status: u8, _payload: &[u8]) -> Option<Interpreted> {
        None
    }
}

/// The default interpreter, which declines everything so raw bytes are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawCapture;

impl EventInterpreter for RawCapture {}

/// Shared instance used when no interpreter is supplied
pub(crate) static RAW_CAPTURE: RawCapture = RawCapture;

#[cfg(test)]
mod tests {
    use super::{EventInterpreter, RawCapture};

    #[test]
    fn raw_capture_declines_everything() {
        assert_eq!(RawCapture.interpret_meta(0x7F, &[1, 2, 3]), None);
        assert_eq!(RawCapture.interpret_sysex(0xF0, &[0x43, 0xF7]), None);
    }
}
