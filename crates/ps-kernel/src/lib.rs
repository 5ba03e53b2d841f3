//! Bilinear box-filter resampling kernels.
//!
//! Each destination pixel reads four bilinear texture taps placed around its
//! center in source space. The tap displacement grows with the downscale
//! ratio, so two taps per axis reproduce a `{w, 1, w}` box filter and
//! shrinking by more than 2x does not alias. The four-tap sum is then biased
//! (fixed rounding or ordered dither) and shifted to the destination bit
//! depth.
//!
//! Variant policy:
//! - Channel count, source/destination container depth, destination layout
//!   and dithering are compile-time parameters of one generic body.
//! - [`Kernel::select`] resolves a [`VariantKey`] to its monomorphized
//!   function once; nothing inside the per-pixel loop branches on format.
//! - Dithering only exists for narrowing variants.

mod dither;
mod filter;
mod kernel;
mod launch;
mod table;

pub use dither::{DITHER_BITS, DITHER_SIZE, DitherMatrix, DitherTable, dither_bias};
pub use filter::{Taps, tap_offset, tap_weight};
pub use kernel::{Combined, Interleave, Layout, Split};
pub use launch::{
    BLOCK_X, BLOCK_Y, DestPlane, KernelSample, LaunchError, LaunchGrid, LaunchParams, SourcePlane,
};
pub use table::{BitDepth, Component, DstLayout, Kernel, KernelFn, VariantKey};
