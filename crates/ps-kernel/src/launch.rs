use ps_core::{AddressMode, PlaneView, PlaneViewMut, Sample};

use crate::dither::DitherTable;

/// Work-items per block along x.
pub const BLOCK_X: usize = 32;
/// Work-items per block along y. One row of blocks is one parallel band.
pub const BLOCK_Y: usize = 16;

/// Block tiling of one launch: one work-item per destination pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchGrid {
    pub grid_x: usize,
    pub grid_y: usize,
}

impl LaunchGrid {
    pub fn for_dims(dst_width: usize, dst_height: usize) -> Self {
        Self {
            grid_x: dst_width.div_ceil(BLOCK_X),
            grid_y: dst_height.div_ceil(BLOCK_Y),
        }
    }

    pub fn blocks(&self) -> usize {
        self.grid_x * self.grid_y
    }

    /// Work-items launched, including idle ones past the plane edge.
    pub fn work_items(&self) -> usize {
        self.blocks() * BLOCK_X * BLOCK_Y
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SourcePlane<'a> {
    U8(PlaneView<'a, u8>),
    U16(PlaneView<'a, u16>),
}

impl SourcePlane<'_> {
    pub fn bits(&self) -> u32 {
        match self {
            Self::U8(_) => u8::BITS,
            Self::U16(_) => u16::BITS,
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::U8(v) => v.channels(),
            Self::U16(v) => v.channels(),
        }
    }
}

#[derive(Debug)]
pub enum DestPlane<'a> {
    U8(PlaneViewMut<'a, u8>),
    U16(PlaneViewMut<'a, u16>),
}

impl DestPlane<'_> {
    pub fn bits(&self) -> u32 {
        match self {
            Self::U8(_) => u8::BITS,
            Self::U16(_) => u16::BITS,
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::U8(v) => v.channels(),
            Self::U16(v) => v.channels(),
        }
    }
}

/// Recovers the typed plane behind a [`SourcePlane`] / [`DestPlane`].
pub trait KernelSample: Sample {
    fn source<'p, 'a>(plane: &'p SourcePlane<'a>) -> Option<&'p PlaneView<'a, Self>>;
    fn dest<'p, 'a>(plane: &'p mut DestPlane<'a>) -> Option<&'p mut PlaneViewMut<'a, Self>>;
}

impl KernelSample for u8 {
    fn source<'p, 'a>(plane: &'p SourcePlane<'a>) -> Option<&'p PlaneView<'a, Self>> {
        match plane {
            SourcePlane::U8(v) => Some(v),
            SourcePlane::U16(_) => None,
        }
    }

    fn dest<'p, 'a>(plane: &'p mut DestPlane<'a>) -> Option<&'p mut PlaneViewMut<'a, Self>> {
        match plane {
            DestPlane::U8(v) => Some(v),
            DestPlane::U16(_) => None,
        }
    }
}

impl KernelSample for u16 {
    fn source<'p, 'a>(plane: &'p SourcePlane<'a>) -> Option<&'p PlaneView<'a, Self>> {
        match plane {
            SourcePlane::U16(v) => Some(v),
            SourcePlane::U8(_) => None,
        }
    }

    fn dest<'p, 'a>(plane: &'p mut DestPlane<'a>) -> Option<&'p mut PlaneViewMut<'a, Self>> {
        match plane {
            DestPlane::U16(v) => Some(v),
            DestPlane::U8(_) => None,
        }
    }
}

/// Scalar arguments of one kernel launch.
#[derive(Debug, Clone, Copy)]
pub struct LaunchParams<'a> {
    pub dst_width: usize,
    pub dst_height: usize,
    pub src_width: usize,
    pub src_height: usize,
    pub address_mode: AddressMode,
    pub dither: Option<&'a DitherTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("source plane holds {actual}-bit samples, kernel reads {expected}-bit")]
    SourceDepth { expected: u32, actual: u32 },
    #[error("destination plane holds {actual}-bit samples, kernel writes {expected}-bit")]
    DestDepth { expected: u32, actual: u32 },
    #[error("source plane has {actual} channels, kernel reads {expected}")]
    SourceChannels { expected: usize, actual: usize },
    #[error("destination plane has {actual} channels, kernel writes {expected}")]
    DestChannels { expected: usize, actual: usize },
    #[error("empty source plane for a {dst_width}x{dst_height} destination")]
    EmptySource { dst_width: usize, dst_height: usize },
    #[error("dithered kernel launched without a dither table")]
    MissingDither,
    #[error("launch region does not fit the plane: {0}")]
    Region(#[from] ps_core::Error),
}

#[cfg(test)]
mod tests {
    use super::{BLOCK_X, BLOCK_Y, LaunchGrid};

    #[test]
    fn grid_rounds_up_to_whole_blocks() {
        let grid = LaunchGrid::for_dims(1920, 1080);
        assert_eq!(grid.grid_x, 60);
        assert_eq!(grid.grid_y, 68);

        let odd = LaunchGrid::for_dims(33, 17);
        assert_eq!((odd.grid_x, odd.grid_y), (2, 2));
        assert_eq!(odd.work_items(), 4 * BLOCK_X * BLOCK_Y);

        assert_eq!(LaunchGrid::for_dims(0, 0).blocks(), 0);
    }
}
