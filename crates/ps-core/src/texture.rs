use crate::address::{AddressMode, map_index};
use crate::plane::PlaneView;
use crate::sample::Sample;

/// Fractional precision of bilinear weights, matching texture hardware.
pub const FILTER_FRAC_BITS: u32 = 8;

const ONE: u64 = 1 << FILTER_FRAC_BITS;
const WEIGHT_SHIFT: u32 = 2 * FILTER_FRAC_BITS;

/// Read-only plane sampled in unnormalized texel coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Texture<'a, T> {
    view: PlaneView<'a, T>,
    mode: AddressMode,
}

impl<'a, T: Sample> Texture<'a, T> {
    pub fn new(view: PlaneView<'a, T>, mode: AddressMode) -> Self {
        Self { view, mode }
    }

    pub fn width(&self) -> usize {
        self.view.width()
    }

    pub fn height(&self) -> usize {
        self.view.height()
    }

    pub fn channels(&self) -> usize {
        self.view.channels()
    }

    pub fn address_mode(&self) -> AddressMode {
        self.mode
    }

    /// Point-filtered integer read of texel `(x, y)`.
    ///
    /// `CH` must not exceed [`Texture::channels`].
    #[inline]
    pub fn fetch_point<const CH: usize>(&self, x: isize, y: isize) -> [u32; CH] {
        debug_assert!(CH <= self.view.channels());
        let mut out = [0u32; CH];
        let Some(px) = self.texel(x, y) else {
            out.fill(self.border_value());
            return out;
        };
        for (o, s) in out.iter_mut().zip(px) {
            *o = s.to_u32();
        }
        out
    }

    /// Bilinear-filtered read at `(u, v)`; texel `i` is centered at `i + 0.5`.
    ///
    /// Weights are quantized to [`FILTER_FRAC_BITS`] and the interpolated
    /// value is rounded to the nearest integer, so a constant neighborhood
    /// always reads back exactly.
    #[inline]
    pub fn fetch_bilinear<const CH: usize>(&self, u: f32, v: f32) -> [u32; CH] {
        debug_assert!(CH <= self.view.channels());
        let xb = u - 0.5;
        let yb = v - 0.5;
        let x0f = xb.floor();
        let y0f = yb.floor();
        let ax = quantize_frac(xb - x0f);
        let ay = quantize_frac(yb - y0f);
        let x0 = x0f as isize;
        let y0 = y0f as isize;

        let p00 = self.fetch_point::<CH>(x0, y0);
        let p10 = self.fetch_point::<CH>(x0 + 1, y0);
        let p01 = self.fetch_point::<CH>(x0, y0 + 1);
        let p11 = self.fetch_point::<CH>(x0 + 1, y0 + 1);

        let mut out = [0u32; CH];
        for c in 0..CH {
            let top = (ONE - ax) * p00[c] as u64 + ax * p10[c] as u64;
            let bottom = (ONE - ax) * p01[c] as u64 + ax * p11[c] as u64;
            let acc = (ONE - ay) * top + ay * bottom;
            out[c] = ((acc + (1 << (WEIGHT_SHIFT - 1))) >> WEIGHT_SHIFT) as u32;
        }
        out
    }

    #[inline]
    fn texel(&self, x: isize, y: isize) -> Option<&'a [T]> {
        let mx = map_index(x, self.view.width(), self.mode)?;
        let my = map_index(y, self.view.height(), self.mode)?;
        self.view.pixel(mx, my)
    }

    #[inline]
    fn border_value(&self) -> u32 {
        match self.mode {
            AddressMode::Border(v) => (v as u32).min(T::MAX),
            AddressMode::Clamp | AddressMode::Mirror => 0,
        }
    }
}

#[inline]
fn quantize_frac(f: f32) -> u64 {
    ((f * ONE as f32).round() as u64).min(ONE)
}

#[cfg(test)]
mod tests {
    use super::Texture;
    use crate::{AddressMode, Plane};

    #[test]
    fn bilinear_at_texel_centers_is_exact() {
        let plane = Plane::from_vec(3, 2, 1, vec![0u8, 10, 20, 30, 40, 50]).expect("valid plane");
        let tex = Texture::new(plane.as_view(), AddressMode::Clamp);

        assert_eq!(tex.fetch_bilinear::<1>(0.5, 0.5), [0]);
        assert_eq!(tex.fetch_bilinear::<1>(2.5, 0.5), [20]);
        assert_eq!(tex.fetch_bilinear::<1>(1.5, 1.5), [40]);
    }

    #[test]
    fn bilinear_between_texels_and_border_modes() {
        let plane = Plane::from_vec(2, 2, 1, vec![0u16, 10, 20, 30]).expect("valid plane");
        let clamp = Texture::new(plane.as_view(), AddressMode::Clamp);

        // Midpoint of all four texels.
        assert_eq!(clamp.fetch_bilinear::<1>(1.0, 1.0), [15]);
        // Quarter of the way from texel 0 to texel 1: 2.5 rounds to 3.
        assert_eq!(clamp.fetch_bilinear::<1>(0.75, 0.5), [3]);
        // Clamped far outside.
        assert_eq!(clamp.fetch_bilinear::<1>(-4.0, -4.0), [0]);
        assert_eq!(clamp.fetch_bilinear::<1>(9.0, 9.0), [30]);

        let border = Texture::new(plane.as_view(), AddressMode::Border(100));
        // Half border (100) and half texel 0 along x.
        assert_eq!(border.fetch_bilinear::<1>(0.0, 0.5), [50]);
    }

    #[test]
    fn multi_channel_fetch_keeps_channels_apart() {
        let plane = Plane::from_vec(2, 1, 2, vec![10u8, 200, 30, 100]).expect("valid plane");
        let tex = Texture::new(plane.as_view(), AddressMode::Clamp);

        assert_eq!(tex.fetch_point::<2>(1, 0), [30, 100]);
        assert_eq!(tex.fetch_bilinear::<2>(1.0, 0.5), [20, 150]);
    }

    #[test]
    fn constant_neighborhood_reads_back_exactly() {
        let plane = Plane::new_fill(5, 5, 1, 65535u16);
        let tex = Texture::new(plane.as_view(), AddressMode::Clamp);

        for &(u, v) in &[(0.1, 0.2), (1.37, 2.91), (4.99, 0.01), (2.5, 2.5)] {
            assert_eq!(tex.fetch_bilinear::<1>(u, v), [65535]);
        }
    }
}
