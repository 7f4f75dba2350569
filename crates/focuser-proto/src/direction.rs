/// Focuser travel direction, as seen from the telescope side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum Direction {
    /// Rack the drawtube outward (positive step delta).
    Out = 1,
    /// Rack the drawtube inward (negative step delta).
    In = -1,
}

impl Direction {
    /// Signed unit carried into the packet's step-delta field.
    #[must_use]
    pub const fn sign(self) -> i32 {
        self as i8 as i32
    }
}
