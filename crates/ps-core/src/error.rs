#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("out of bounds")]
    OutOfBounds,
    #[error("invalid stride")]
    InvalidStride,
    #[error("unsupported channel count {0}, expected 1..=4")]
    InvalidChannels(usize),
    #[error("failed to allocate {0} samples")]
    Allocation(usize),
}
