use std::sync::OnceLock;

use ps_core::{AddressMode, Error, Plane, Texture};

/// Side length of the square dither matrix.
pub const DITHER_SIZE: usize = 64;
/// Precision of the dither thresholds.
pub const DITHER_BITS: u32 = 16;

const ORDER: u32 = DITHER_SIZE.trailing_zeros();

/// Ordered (Bayer) thresholds spread over the full 16-bit range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DitherMatrix {
    values: Vec<u16>,
}

impl DitherMatrix {
    /// Process-wide matrix, built on first use.
    pub fn shared() -> &'static DitherMatrix {
        static MATRIX: OnceLock<DitherMatrix> = OnceLock::new();
        MATRIX.get_or_init(DitherMatrix::bayer)
    }

    fn bayer() -> Self {
        let level_shift = DITHER_BITS - 2 * ORDER;
        let mut values = Vec::with_capacity(DITHER_SIZE * DITHER_SIZE);
        for y in 0..DITHER_SIZE {
            for x in 0..DITHER_SIZE {
                values.push((bayer_index(x, y) << level_shift) as u16);
            }
        }
        Self { values }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.values[(y % DITHER_SIZE) * DITHER_SIZE + (x % DITHER_SIZE)]
    }

    pub fn values(&self) -> &[u16] {
        &self.values
    }
}

/// Rank of `(x, y)` in the recursive Bayer ordering of a
/// `DITHER_SIZE x DITHER_SIZE` matrix.
fn bayer_index(x: usize, y: usize) -> u32 {
    let (x, y) = (x as u32, y as u32);
    let mut v = 0u32;
    for bit in 0..ORDER {
        let xy = ((x ^ y) >> bit) & 1;
        let yb = (y >> bit) & 1;
        let shift = 2 * (ORDER - 1 - bit);
        v |= (xy << (shift + 1)) | (yb << shift);
    }
    v
}

/// Read-only copy of the matrix that kernels sample with point filtering.
///
/// Uploaded once per scaling configuration and shared by every launch.
#[derive(Debug, Clone)]
pub struct DitherTable {
    plane: Plane<u16>,
}

impl DitherTable {
    pub fn upload() -> Result<Self, Error> {
        let matrix = DitherMatrix::shared();
        let mut plane = Plane::with_stride(DITHER_SIZE, DITHER_SIZE, 1, DITHER_SIZE, 0u16)?;
        plane.data_mut().copy_from_slice(matrix.values());
        tracing::debug!(size = DITHER_SIZE, "uploaded dither table");
        Ok(Self { plane })
    }

    pub fn texture(&self) -> Texture<'_, u16> {
        Texture::new(self.plane.as_view(), AddressMode::Clamp)
    }
}

/// Bias added before discarding the low `discarded_bits` of a four-tap sum.
///
/// Spans `[0, 2^discarded_bits)` so that, averaged over the matrix, the
/// truncation rounds to nearest.
#[inline]
pub fn dither_bias(threshold: u32, discarded_bits: u32) -> u32 {
    (1 + threshold) >> DITHER_BITS.saturating_sub(discarded_bits)
}
