//! System Exclusive Messages

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    interpreter::{EventInterpreter, Interpreted},
    TrackError,
};
use crate::reader::ByteCursor;

/// A system exclusive (or escape) event: any 0xF0-0xFE status followed by a length-prefixed
/// payload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SysexEvent {
    /// The status byte that introduced the event
    status: u8,
    /// Data payload to be parsed on a per-system basis
    payload: Vec<u8>,
    /// What an [`EventInterpreter`] made of the payload, if anything
    interpreted: Option<Interpreted>,
}

impl SysexEvent {
    /// The status byte that introduced the event
    pub fn status(&self) -> u8 {
        self.status
    }

    /// Raw payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The interpreter's reading of the payload
    pub fn interpreted(&self) -> Option<&Interpreted> {
        self.interpreted.as_ref()
    }

    /// Decodes the payload, with the cursor placed just after the status byte
    pub(crate) fn decode(
        status: u8,
        cursor: &mut ByteCursor<'_>,
        interpreter: &dyn EventInterpreter,
    ) -> Result<Self, TrackError> {
        let length = cursor.read_var_length()? as usize;
        let payload = cursor.read_bytes(length)?;

        Ok(Self {
            status,
            interpreted: interpreter.interpret_sysex(status, payload),
            payload: payload.to_vec(),
        })
    }
}
