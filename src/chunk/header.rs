//! Header Chunk Enum and Struct Definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use thiserror::Error;

/// Header chunk data, including format, ntrks and division as 3 16 bit unsigned integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeaderChunk {
    /// The MIDI format
    format: Format,
    /// Number of tracks
    ntrks: u16,
    /// Time signature/division
    division: Division,
}

impl HeaderChunk {
    /// The overall organization of the file
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of track chunks the header announces
    pub fn ntrks(&self) -> u16 {
        self.ntrks
    }

    /// How delta times map to musical or wall clock time
    pub fn division(&self) -> Division {
        self.division
    }

    /// Ticks per quarter note, when the division is metrical
    pub fn ticks_per_beat(&self) -> Option<u16> {
        match self.division {
            Division::Metrical(ticks) => Some(ticks),
            Division::TimeCodeBased(_) => None,
        }
    }
}

impl TryFrom<(u16, u16, u16)> for HeaderChunk {
    type Error = InvalidFormat;
    fn try_from(value: (u16, u16, u16)) -> Result<Self, Self::Error> {
        let (format, ntrks, division) = value;

        Ok(Self {
            format: format.try_into()?,
            ntrks,
            division: division.into(),
        })
    }
}

/// The overall organization of the MIDI file. Only three values are valid, making most of the 16
/// bits irrelevant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// The file contains a single multi-channel track
    Zero,
    /// The file contains one or more simultaneous tracks (or MIDI outputs) of a sequence
    One,
    /// The file contains one or more sequentially independent single-track patterns
    Two,
}

impl From<Format> for u16 {
    fn from(value: Format) -> Self {
        match value {
            Format::Zero => 0,
            Format::One => 1,
            Format::Two => 2,
        }
    }
}

/// Error struct representing an invalid format specifier
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid header format {0}")]
pub struct InvalidFormat(pub u16);

impl TryFrom<u16> for Format {
    type Error = InvalidFormat;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Format::Zero),
            1 => Ok(Format::One),
            2 => Ok(Format::Two),
            other => Err(InvalidFormat(other)),
        }
    }
}

/// The meaning of the delta-times in the MIDI sequence,
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Division {
    /// When bit 15 is a 0, bits 14-0 represent ticks per quarter note
    Metrical(u16),
    /// When bit 15 is 1, bits 15-8 hold the negative SMPTE format,
    /// and bits 7-0 represent ticks per frame
    TimeCodeBased(SmpteTicks),
}

/// Division defined by time-code-based time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmpteTicks {
    /// Negative frame rate, stored as the two's complement byte it was written as
    smpte: i8,
    /// 8 bits of ticks per frame
    tpf: u8,
}

impl SmpteTicks {
    /// Frames per second (24, 25, 29 for 30 drop-frame, or 30 in well-formed files)
    pub fn frames_per_second(&self) -> u8 {
        self.smpte.unsigned_abs()
    }

    /// Ticks within each frame
    pub fn ticks_per_frame(&self) -> u8 {
        self.tpf
    }
}

impl From<u16> for Division {
    fn from(value: u16) -> Self {
        const MASK: u16 = 0x7FFF;
        let [high, low] = value.to_be_bytes();

        if high & 0x80 == 0 {
            Division::Metrical(value & MASK)
        } else {
            // The high byte is already a negative two's complement number
            Division::TimeCodeBased(SmpteTicks {
                smpte: high as i8,
                tpf: low,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Division, Format, HeaderChunk, InvalidFormat, SmpteTicks};

    #[test]
    fn parsing_division_to_metrical_works() {
        let test: Division = (0x000au16).into();
        let expected = Division::Metrical(10);

        assert_eq!(test, expected);

        let test: Division = (0x01E0u16).into();
        assert_eq!(test, Division::Metrical(480))
    }

    #[test]
    fn parsing_division_to_timecode_works() {
        let test: Division = (0xE828u16).into();
        let expected = Division::TimeCodeBased(SmpteTicks {
            smpte: -24,
            tpf: 40,
        });

        assert_eq!(test, expected);

        let test: Division = (0xE250u16).into();
        let Division::TimeCodeBased(ticks) = test else {
            panic!("Expected a time code based division, got {test:?}");
        };

        assert_eq!(ticks.frames_per_second(), 30);
        assert_eq!(ticks.ticks_per_frame(), 80)
    }

    #[test]
    fn header_chunk_reads_properly() {
        let header_chunk =
            HeaderChunk::try_from((1u16, 10u16, 384u16)).expect("Parse header chunk from packets");
        let expected = HeaderChunk {
            format: Format::One,
            ntrks: 10,
            division: Division::Metrical(384),
        };

        assert_eq!(expected, header_chunk);
        assert_eq!(header_chunk.ticks_per_beat(), Some(384));
        assert_eq!(u16::from(header_chunk.format()), 1);
    }

    #[test]
    fn smpte_header_has_no_ticks_per_beat() {
        let header_chunk =
            HeaderChunk::try_from((0u16, 1u16, 0xE728u16)).expect("Parse header chunk from packets");

        assert_eq!(header_chunk.ticks_per_beat(), None);
        assert_eq!(header_chunk.ntrks(), 1);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result = HeaderChunk::try_from((7u16, 1u16, 96u16));
        assert_eq!(result, Err(InvalidFormat(7)))
    }
}
