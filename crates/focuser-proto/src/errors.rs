use thiserror::Error;

/// Errors produced while building wire packets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The signed step delta does not fit the packet's 16-bit field.
    #[error("step delta {0} outside the signed 16-bit packet field")]
    StepCountOutOfRange(i32),
    /// Divisor value the firmware does not accept.
    #[error("unsupported microstep divisor {0}, expected one of 1, 2, 4, 8, 16, 32")]
    UnsupportedDivisor(u16),
}
