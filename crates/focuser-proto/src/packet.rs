use crate::direction::Direction;
use crate::divisor::MicrostepDivisor;
use crate::errors::ProtocolError;

/// Length of every command packet the firmware accepts.
pub const MOVE_PACKET_LEN: usize = 5;

/// An encoded command, ready for the serial link.
pub type MovePacket = [u8; MOVE_PACKET_LEN];

const TAG_MOVE: u8 = 0x01;

/// One relative move request.
///
/// Constructed fresh per operator action and consumed by [`encode`].
///
/// [`encode`]: MoveCommand::encode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveCommand {
    pub direction: Direction,
    /// Microsteps to issue, before the direction sign is applied.
    pub microstep_count: u16,
    /// Divisor forwarded verbatim to the driver stage.
    pub divisor: MicrostepDivisor,
}

impl MoveCommand {
    /// Builds the five-byte move packet.
    ///
    /// Layout: `0x01` tag, little-endian two's-complement step delta,
    /// raw divisor, additive checksum. The checksum covers bytes 0..=2
    /// only; the divisor byte is not part of the sum the firmware checks.
    ///
    /// # Errors
    /// Returns [`ProtocolError::StepCountOutOfRange`] when the signed
    /// delta does not fit 16 bits, or when the count is zero.
    pub fn encode(&self) -> Result<MovePacket, ProtocolError> {
        let delta = self.direction.sign() * i32::from(self.microstep_count);
        if delta == 0 {
            return Err(ProtocolError::StepCountOutOfRange(0));
        }
        let delta = i16::try_from(delta).map_err(|_| ProtocolError::StepCountOutOfRange(delta))?;
        let [lo, hi] = delta.to_le_bytes();

        let mut packet = [TAG_MOVE, lo, hi, self.divisor.code(), 0];
        packet[4] = checksum(&packet[..3]);
        Ok(packet)
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        assert_eq!(0x21, checksum(&[0x01, 0x20, 0x00]));
        assert_eq!(0xE0, checksum(&[0x01, 0xE0, 0xFF]));
    }

    #[test]
    fn test_encode_outward_move() {
        let cmd = MoveCommand {
            direction: Direction::Out,
            microstep_count: 32,
            divisor: MicrostepDivisor::ThirtySecond,
        };
        assert_eq!(cmd.encode().unwrap(), [0x01, 0x20, 0x00, 0x20, 0x21]);
    }

    #[test]
    fn test_encode_inward_move() {
        let cmd = MoveCommand {
            direction: Direction::In,
            microstep_count: 32,
            divisor: MicrostepDivisor::Sixteenth,
        };
        // -32 = 0xFFE0, checksum (0x01 + 0xE0 + 0xFF) & 0xFF = 0xE0
        assert_eq!(cmd.encode().unwrap(), [0x01, 0xE0, 0xFF, 0x10, 0xE0]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let cmd = MoveCommand {
            direction: Direction::Out,
            microstep_count: 160,
            divisor: MicrostepDivisor::Sixteenth,
        };
        assert_eq!(cmd.encode().unwrap(), cmd.encode().unwrap());
    }

    #[test]
    fn test_payload_round_trips_signed_delta() {
        for (direction, count) in [
            (Direction::Out, 1u16),
            (Direction::Out, 320),
            (Direction::Out, 32_767),
            (Direction::In, 1),
            (Direction::In, 320),
            (Direction::In, 32_767),
        ] {
            let packet = MoveCommand {
                direction,
                microstep_count: count,
                divisor: MicrostepDivisor::ThirtySecond,
            }
            .encode()
            .unwrap();

            let delta = i16::from_le_bytes([packet[1], packet[2]]);
            assert_eq!(i32::from(delta), direction.sign() * i32::from(count));
            assert_eq!(
                packet[4],
                packet[0].wrapping_add(packet[1]).wrapping_add(packet[2])
            );
        }
    }

    #[test]
    fn test_encode_rejects_overflowing_delta() {
        let cmd = MoveCommand {
            direction: Direction::Out,
            microstep_count: 32_768,
            divisor: MicrostepDivisor::Full,
        };
        assert_eq!(
            cmd.encode(),
            Err(ProtocolError::StepCountOutOfRange(32_768))
        );

        // -32768 still fits two's complement.
        let cmd = MoveCommand {
            direction: Direction::In,
            microstep_count: 32_768,
            divisor: MicrostepDivisor::Full,
        };
        let packet = cmd.encode().unwrap();
        assert_eq!(i16::from_le_bytes([packet[1], packet[2]]), i16::MIN);
    }

    #[test]
    fn test_encode_rejects_empty_move() {
        let cmd = MoveCommand {
            direction: Direction::Out,
            microstep_count: 0,
            divisor: MicrostepDivisor::Full,
        };
        assert_eq!(cmd.encode(), Err(ProtocolError::StepCountOutOfRange(0)));
    }
}
