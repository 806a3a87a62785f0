use num_traits::{Float, NumAssignOps};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// A trait representing the element types a computation graph can hold.
///
/// One graph uses a single precision throughout. `f32` is the default
/// element type; `f64` is handy for finite-difference checks where `f32`
/// loses too many digits.
pub trait GraphFloat:
    Float // Includes Num + Copy + NumCast + comparison
    + NumAssignOps
    + Sum
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + 'static
{
    /// Size of one element in the persisted byte layout.
    const BYTES: usize;

    /// Converts an `f64` literal or hyper-parameter into this precision.
    fn cast(value: f64) -> Self;

    /// Widens to `f64` for diagnostics and gradient checking.
    fn widen(self) -> f64;

    /// Appends the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes one element from exactly `Self::BYTES` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

impl GraphFloat for f32 {
    const BYTES: usize = 4;

    fn cast(value: f64) -> Self {
        value as f32
    }

    fn widen(self) -> f64 {
        self as f64
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[..4]);
        f32::from_le_bytes(raw)
    }
}

impl GraphFloat for f64 {
    const BYTES: usize = 8;

    fn cast(value: f64) -> Self {
        value
    }

    fn widen(self) -> f64 {
        self
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(raw)
    }
}
