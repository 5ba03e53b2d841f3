use core::marker::PhantomData;

use ps_core::{PlaneViewMut, Sample, Texture};
use rayon::prelude::*;

use crate::dither::{DITHER_SIZE, dither_bias};
use crate::filter::Taps;
use crate::launch::{BLOCK_Y, DestPlane, KernelSample, LaunchError, LaunchGrid, LaunchParams, SourcePlane};

/// Where the `CH` filtered channels of one work-item land in the
/// destination row.
pub trait Layout: Send + Sync + 'static {
    /// Destination channels per pixel when `src_channels` are read.
    fn dst_channels(src_channels: usize) -> usize;

    fn store<D: Sample, const CH: usize>(row: &mut [D], x: usize, px: [D; CH]);
}

/// `CH` channels in, the same `CH` channels out.
pub struct Combined;

/// One channel in, written to slot `COMP` of a two-channel destination.
pub struct Interleave<const COMP: usize>;

/// Two channels in, channel `COMP` written to a one-channel destination.
pub struct Split<const COMP: usize>;

impl Layout for Combined {
    fn dst_channels(src_channels: usize) -> usize {
        src_channels
    }

    #[inline(always)]
    fn store<D: Sample, const CH: usize>(row: &mut [D], x: usize, px: [D; CH]) {
        row[x * CH..(x + 1) * CH].copy_from_slice(&px);
    }
}

impl<const COMP: usize> Layout for Interleave<COMP> {
    fn dst_channels(_src_channels: usize) -> usize {
        2
    }

    #[inline(always)]
    fn store<D: Sample, const CH: usize>(row: &mut [D], x: usize, px: [D; CH]) {
        row[x * 2 + COMP] = px[0];
    }
}

impl<const COMP: usize> Layout for Split<COMP> {
    fn dst_channels(_src_channels: usize) -> usize {
        1
    }

    #[inline(always)]
    fn store<D: Sample, const CH: usize>(row: &mut [D], x: usize, px: [D; CH]) {
        row[x] = px[COMP];
    }
}

/// Bit-depth conversion of a source/destination pair, fixed at compile time.
struct Depth<S, D>(PhantomData<(S, D)>);

impl<S: Sample, D: Sample> Depth<S, D> {
    /// Positive when narrowing, negative when widening.
    const SHIFT: i32 = S::BITS as i32 - D::BITS as i32;
    const NARROWS_SUM: bool = Self::SHIFT > -2;
    /// Low bits dropped from the four-tap sum when shifting right.
    const DISCARDED: u32 = if Self::NARROWS_SUM { (2 + Self::SHIFT) as u32 } else { 0 };
    const WIDEN: u32 = if Self::NARROWS_SUM { 0 } else { (-Self::SHIFT - 2) as u32 };

    /// Quantizes a four-tap sum. `bias` replaces the fixed rounding bias
    /// when the variant is dithered.
    #[inline(always)]
    fn finish<const DITHER: bool>(sum: u32, bias: u32) -> D {
        if Self::NARROWS_SUM {
            let bias = if DITHER { bias } else { 2 };
            D::from_u32((sum + bias) >> Self::DISCARDED)
        } else {
            D::from_u32(sum << Self::WIDEN)
        }
    }
}

/// Generic body of every kernel variant.
///
/// Checks the planes against the variant once, then runs one work-item per
/// destination pixel with rows grouped into bands of [`BLOCK_Y`] processed
/// in parallel.
pub(crate) fn run<S, D, const CH: usize, L, const DITHER: bool>(
    src: &SourcePlane<'_>,
    dst: &mut DestPlane<'_>,
    params: &LaunchParams<'_>,
) -> Result<(), LaunchError>
where
    S: KernelSample,
    D: KernelSample,
    L: Layout,
{
    let src_bits = src.bits();
    let src_view = S::source(src).ok_or(LaunchError::SourceDepth {
        expected: S::BITS,
        actual: src_bits,
    })?;
    let dst_bits = dst.bits();
    let dst_channels = dst.channels();
    let dst_view = D::dest(dst).ok_or(LaunchError::DestDepth {
        expected: D::BITS,
        actual: dst_bits,
    })?;

    if src_view.channels() != CH {
        return Err(LaunchError::SourceChannels {
            expected: CH,
            actual: src_view.channels(),
        });
    }
    if dst_channels != L::dst_channels(CH) {
        return Err(LaunchError::DestChannels {
            expected: L::dst_channels(CH),
            actual: dst_channels,
        });
    }
    if params.dst_width == 0 || params.dst_height == 0 {
        return Ok(());
    }
    if params.src_width == 0 || params.src_height == 0 {
        return Err(LaunchError::EmptySource {
            dst_width: params.dst_width,
            dst_height: params.dst_height,
        });
    }

    let dither = if DITHER {
        Some(params.dither.ok_or(LaunchError::MissingDither)?.texture())
    } else {
        None
    };

    let tex = Texture::new(
        src_view.subview(0, 0, params.src_width, params.src_height)?,
        params.address_mode,
    );
    let mut out = dst_view.subview_mut(0, 0, params.dst_width, params.dst_height)?;
    let taps = Taps::new(
        params.src_width,
        params.src_height,
        params.dst_width,
        params.dst_height,
    );

    let grid = LaunchGrid::for_dims(params.dst_width, params.dst_height);
    tracing::trace!(
        grid_x = grid.grid_x,
        grid_y = grid.grid_y,
        dx = taps.dx,
        dy = taps.dy,
        "launching bilinear subsample"
    );

    out.bands_mut(BLOCK_Y)
        .into_par_iter()
        .enumerate()
        .for_each(|(band_idx, mut band)| {
            subsample_band::<S, D, CH, L, DITHER>(
                &tex,
                &mut band,
                band_idx * BLOCK_Y,
                &taps,
                dither.as_ref(),
            );
        });

    Ok(())
}

fn subsample_band<S, D, const CH: usize, L, const DITHER: bool>(
    tex: &Texture<'_, S>,
    band: &mut PlaneViewMut<'_, D>,
    y_offset: usize,
    taps: &Taps,
    dither: Option<&Texture<'_, u16>>,
) where
    S: Sample,
    D: Sample,
    L: Layout,
{
    let width = band.width();
    for by in 0..band.height() {
        let yo = y_offset + by;
        let row = band.row_mut(by);
        for xo in 0..width {
            let (cx, cy) = taps.center(xo, yo);
            let t0 = tex.fetch_bilinear::<CH>(cx - taps.dx, cy - taps.dy);
            let t1 = tex.fetch_bilinear::<CH>(cx + taps.dx, cy - taps.dy);
            let t2 = tex.fetch_bilinear::<CH>(cx - taps.dx, cy + taps.dy);
            let t3 = tex.fetch_bilinear::<CH>(cx + taps.dx, cy + taps.dy);

            let bias = if DITHER {
                dither.map_or(0, |d| {
                    let [threshold] = d.fetch_point::<1>(
                        (xo % DITHER_SIZE) as isize,
                        (yo % DITHER_SIZE) as isize,
                    );
                    dither_bias(threshold, Depth::<S, D>::DISCARDED)
                })
            } else {
                0
            };

            let mut px = [D::default(); CH];
            for c in 0..CH {
                let sum = t0[c] + t1[c] + t2[c] + t3[c];
                px[c] = Depth::<S, D>::finish::<DITHER>(sum, bias);
            }
            L::store::<D, CH>(row, xo, px);
        }
    }
}
