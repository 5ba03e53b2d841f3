use core::fmt::Debug;

/// An unsigned channel value stored in an 8- or 16-bit container.
pub trait Sample: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Container width in bits.
    const BITS: u32;
    const MAX: u32;

    fn to_u32(self) -> u32;

    /// Converts back into the container, saturating at [`Sample::MAX`].
    fn from_u32(v: u32) -> Self;
}

impl Sample for u8 {
    const BITS: u32 = 8;
    const MAX: u32 = u8::MAX as u32;

    #[inline]
    fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    fn from_u32(v: u32) -> Self {
        v.min(<Self as Sample>::MAX) as u8
    }
}

impl Sample for u16 {
    const BITS: u32 = 16;
    const MAX: u32 = u16::MAX as u32;

    #[inline]
    fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    fn from_u32(v: u32) -> Self {
        v.min(<Self as Sample>::MAX) as u16
    }
}
