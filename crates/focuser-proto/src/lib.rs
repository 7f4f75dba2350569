//! Wire protocol for the focuser drive firmware.
//!
//! This crate generates the fixed five-byte move packets understood by the
//! stepper firmware. It is transport-agnostic: callers get a byte buffer to
//! push over whatever serial link they hold. Nothing here performs I/O.

pub mod direction;
pub mod divisor;
mod errors;
pub mod packet;
pub mod policy;

pub use direction::Direction;
pub use divisor::MicrostepDivisor;
pub use errors::ProtocolError;
pub use packet::{MoveCommand, MovePacket, MOVE_PACKET_LEN};
pub use policy::{effective_step_count, CoarseMultiplier};
