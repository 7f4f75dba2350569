use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Microstepping divisor selectable on the DRV8825 driver stage.
///
/// The discriminant is the raw divisor transmitted in byte 3 of a move
/// packet. Serde round-trips through that integer, so an unsupported value
/// in a persisted record fails at parse time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u8)]
pub enum MicrostepDivisor {
    Full = 1,
    Half = 2,
    Quarter = 4,
    Eighth = 8,
    Sixteenth = 16,
    ThirtySecond = 32,
}

impl MicrostepDivisor {
    /// Every divisor the firmware accepts, coarsest first.
    pub const ALL: [Self; 6] = [
        Self::Full,
        Self::Half,
        Self::Quarter,
        Self::Eighth,
        Self::Sixteenth,
        Self::ThirtySecond,
    ];

    /// Raw divisor byte as it appears on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Selector label matching the driver's resolution settings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Half => "1/2",
            Self::Quarter => "1/4",
            Self::Eighth => "1/8",
            Self::Sixteenth => "1/16",
            Self::ThirtySecond => "1/32",
        }
    }
}

impl TryFrom<u16> for MicrostepDivisor {
    type Error = ProtocolError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Full),
            2 => Ok(Self::Half),
            4 => Ok(Self::Quarter),
            8 => Ok(Self::Eighth),
            16 => Ok(Self::Sixteenth),
            32 => Ok(Self::ThirtySecond),
            other => Err(ProtocolError::UnsupportedDivisor(other)),
        }
    }
}

impl From<MicrostepDivisor> for u16 {
    fn from(divisor: MicrostepDivisor) -> Self {
        Self::from(divisor.code())
    }
}

impl fmt::Display for MicrostepDivisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_supported() {
        for divisor in MicrostepDivisor::ALL {
            let raw = u16::from(divisor);
            assert_eq!(MicrostepDivisor::try_from(raw).unwrap(), divisor);
        }
    }

    #[test]
    fn test_try_from_rejects_unsupported() {
        for raw in [0u16, 3, 7, 64, 255] {
            let result = MicrostepDivisor::try_from(raw);
            assert_eq!(result, Err(ProtocolError::UnsupportedDivisor(raw)));
        }
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(MicrostepDivisor::Full.code(), 1);
        assert_eq!(MicrostepDivisor::ThirtySecond.code(), 32);
    }
}
