//! Two-tap approximation of the `{w, 1, w}` box filter.
//!
//! A bilinear tap placed `d` texels off center weighs the center texel by
//! `1 - d` and its neighbor by `d`. Two taps at `center - d` and
//! `center + d` therefore reproduce `{w, 1, w}` (up to normalization) when
//! `d = w / (0.5 + w)`.

/// Side weight of the 3-tap filter for a `src / dst` ratio.
///
/// Zero at or below 1:1 (plain bilinear), growing to 1 at a 3:1
/// downscale.
#[inline]
pub fn tap_weight(scale: f32) -> f32 {
    (0.5 * (scale - 1.0)).clamp(0.0, 1.0)
}

/// Displacement of the two bilinear taps reproducing weight `w`.
#[inline]
pub fn tap_offset(weight: f32) -> f32 {
    weight / (0.5 + weight)
}

/// Per-launch filter geometry. Identical for every destination pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Taps {
    pub hscale: f32,
    pub vscale: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Taps {
    pub fn new(src_width: usize, src_height: usize, dst_width: usize, dst_height: usize) -> Self {
        let hscale = src_width as f32 / dst_width as f32;
        let vscale = src_height as f32 / dst_height as f32;
        Self {
            hscale,
            vscale,
            dx: tap_offset(tap_weight(hscale)),
            dy: tap_offset(tap_weight(vscale)),
        }
    }

    /// Center of destination pixel `(x, y)` in source texel coordinates.
    #[inline]
    pub fn center(&self, x: usize, y: usize) -> (f32, f32) {
        ((x as f32 + 0.5) * self.hscale, (y as f32 + 0.5) * self.vscale)
    }
}

#[cfg(test)]
mod tests {
    use super::{Taps, tap_offset, tap_weight};

    #[test]
    fn unit_scale_collapses_taps() {
        assert_eq!(tap_weight(1.0), 0.0);
        assert_eq!(tap_offset(0.0), 0.0);

        let taps = Taps::new(640, 480, 640, 480);
        assert_eq!(taps.dx, 0.0);
        assert_eq!(taps.dy, 0.0);
        assert_eq!(taps.center(3, 7), (3.5, 7.5));
    }

    #[test]
    fn weight_is_monotone_and_bounded() {
        let mut prev_w = 0.0f32;
        let mut scale = 1.0f32;
        while scale < 8.0 {
            let w = tap_weight(scale);
            let d = tap_offset(w);
            assert!((0.0..=1.0).contains(&w), "w={w} at scale {scale}");
            assert!(w >= prev_w, "w decreased at scale {scale}");
            assert!((0.0..=2.0 / 3.0 + 1e-6).contains(&d), "d={d} at scale {scale}");
            prev_w = w;
            scale += 0.05;
        }
        assert_eq!(tap_weight(3.0), 1.0);
        assert!((tap_offset(1.0) - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn upscale_is_plain_bilinear() {
        let taps = Taps::new(100, 50, 400, 200);
        assert_eq!(taps.dx, 0.0);
        assert_eq!(taps.dy, 0.0);
        assert_eq!(taps.hscale, 0.25);
        assert_eq!(taps.center(0, 0), (0.125, 0.125));
    }

    #[test]
    fn half_downscale_offsets_half_a_texel() {
        // w = 0.5 at 2:1, so d = 0.5.
        let taps = Taps::new(1920, 1080, 960, 540);
        assert!((taps.dx - 0.5).abs() < 1e-6);
        assert!((taps.dy - 0.5).abs() < 1e-6);
        assert_eq!(taps.center(0, 0), (1.0, 1.0));
    }
}
