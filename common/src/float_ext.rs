pub trait FloatExt {
    /// Absolute comparison against [`crate::EPSILON`].
    fn approximately_eq(self, other: Self) -> bool;

    /// Relative comparison, scaled by the larger magnitude (at least 1).
    fn relative_eq(self, other: Self, tolerance: Self) -> bool;
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn relative_eq(self, other: Self, tolerance: Self) -> bool {
        let scale = self.abs().max(other.abs()).max(1.0);
        (self - other).abs() <= tolerance * scale
    }
}
