use core::fmt;

use ps_core::Plane;
use ps_kernel::{BitDepth, DestPlane, SourcePlane};
use serde::{Deserialize, Serialize};

use crate::error::ScaleError;
use crate::format::PixelFormat;

/// Row alignment of frames allocated here, in samples.
pub const FRAME_ALIGN: usize = 32;

/// Reduced fraction; `0/1` means unknown.
///
/// Both terms are kept within `i32::MAX`. Fractions that do not fit are
/// replaced by their closest approximation that does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    pub const UNKNOWN: Self = Self { num: 0, den: 1 };

    pub fn new(num: i64, den: i64) -> Self {
        Self::reduce(num as i128, den as i128)
    }

    pub fn is_unknown(self) -> bool {
        self.num == 0
    }

    pub fn mul(self, other: Self) -> Self {
        Self::reduce(
            self.num as i128 * other.num as i128,
            self.den as i128 * other.den as i128,
        )
    }

    fn reduce(num: i128, den: i128) -> Self {
        if num == 0 || den == 0 {
            return Self::UNKNOWN;
        }
        let negative = (num < 0) != (den < 0);
        let (n, d) = approximate(num.unsigned_abs(), den.unsigned_abs(), i32::MAX as u128);
        if n == 0 {
            return Self::UNKNOWN;
        }
        let num = n as i64;
        Self {
            num: if negative { -num } else { num },
            den: d as i64,
        }
    }
}

/// Best approximation of `num/den` with both terms at most `max`, by
/// continued fraction expansion with a final semiconvergent.
fn approximate(num: u128, den: u128, max: u128) -> (u128, u128) {
    let g = gcd(num, den);
    let (mut num, mut den) = (num / g, den / g);
    if num <= max && den <= max {
        return (num, den);
    }

    let (mut a0, mut a1) = ((0u128, 1u128), (1u128, 0u128));
    while den != 0 {
        let x = num / den;
        let rem = num - den * x;
        let next = (
            x.saturating_mul(a1.0).saturating_add(a0.0),
            x.saturating_mul(a1.1).saturating_add(a0.1),
        );
        if next.0 > max || next.1 > max {
            let mut x = x;
            if a1.0 != 0 {
                x = (max - a0.0) / a1.0;
            }
            if a1.1 != 0 {
                x = x.min((max - a0.1) / a1.1);
            }
            let lhs = den.saturating_mul(2 * x * a1.1 + a0.1);
            if lhs > num.saturating_mul(a1.1) {
                a1 = (x * a1.0 + a0.0, x * a1.1 + a0.1);
            }
            break;
        }
        a0 = a1;
        a1 = next;
        num = den;
        den = rem;
    }
    a1
}

impl Default for Rational {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.den)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// One plane of a frame in its sample container.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneBuf {
    U8(Plane<u8>),
    U16(Plane<u16>),
}

impl PlaneBuf {
    /// Zeroed plane with the row length rounded up to [`FRAME_ALIGN`].
    pub fn alloc(
        depth: BitDepth,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, ps_core::Error> {
        let row_len = width
            .checked_mul(channels)
            .ok_or(ps_core::Error::InvalidStride)?;
        let stride = row_len.div_ceil(FRAME_ALIGN) * FRAME_ALIGN;
        match depth {
            BitDepth::Eight => Plane::with_stride(width, height, channels, stride, 0u8).map(Self::U8),
            BitDepth::Sixteen => {
                Plane::with_stride(width, height, channels, stride, 0u16).map(Self::U16)
            }
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::U8(p) => p.width(),
            Self::U16(p) => p.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::U8(p) => p.height(),
            Self::U16(p) => p.height(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::U8(p) => p.channels(),
            Self::U16(p) => p.channels(),
        }
    }

    pub fn depth(&self) -> BitDepth {
        match self {
            Self::U8(_) => BitDepth::Eight,
            Self::U16(_) => BitDepth::Sixteen,
        }
    }

    pub fn source(&self) -> SourcePlane<'_> {
        match self {
            Self::U8(p) => SourcePlane::U8(p.as_view()),
            Self::U16(p) => SourcePlane::U16(p.as_view()),
        }
    }

    pub fn dest(&mut self) -> DestPlane<'_> {
        match self {
            Self::U8(p) => DestPlane::U8(p.as_view_mut()),
            Self::U16(p) => DestPlane::U16(p.as_view_mut()),
        }
    }

    /// Copies the visible samples of a plane with the same geometry and
    /// container.
    pub fn copy_from(&mut self, other: &PlaneBuf) -> Result<(), ps_core::Error> {
        match (self, other) {
            (Self::U8(d), Self::U8(s)) => d.as_view_mut().copy_from(&s.as_view()),
            (Self::U16(d), Self::U16(s)) => d.as_view_mut().copy_from(&s.as_view()),
            (d, s) => Err(ps_core::Error::SizeMismatch {
                expected: d.width() * d.height() * d.channels(),
                actual: s.width() * s.height() * s.channels(),
            }),
        }
    }
}

/// A picture in one of the supported [`PixelFormat`]s plus the properties
/// carried from input to output.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    format: PixelFormat,
    width: usize,
    height: usize,
    planes: Vec<PlaneBuf>,
    pts: Option<i64>,
    sample_aspect_ratio: Rational,
}

impl Frame {
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Result<Self, ScaleError> {
        let planes = (0..format.num_planes())
            .map(|i| {
                let (w, h) = format.plane_dims(i, width, height);
                PlaneBuf::alloc(format.container(), w, h, format.plane_channels(i))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(ScaleError::Allocation)?;

        Ok(Self {
            format,
            width,
            height,
            planes,
            pts: None,
            sample_aspect_ratio: Rational::UNKNOWN,
        })
    }

    /// Wraps caller-owned planes after checking them against `format`.
    pub fn from_planes(
        format: PixelFormat,
        width: usize,
        height: usize,
        planes: Vec<PlaneBuf>,
    ) -> Result<Self, ScaleError> {
        let layout_err = |plane| ScaleError::PlaneLayout {
            format,
            width,
            height,
            plane,
        };
        if planes.len() != format.num_planes() {
            return Err(layout_err(planes.len()));
        }
        for (i, p) in planes.iter().enumerate() {
            let (w, h) = format.plane_dims(i, width, height);
            if p.width() != w
                || p.height() != h
                || p.channels() != format.plane_channels(i)
                || p.depth() != format.container()
            {
                return Err(layout_err(i));
            }
        }

        Ok(Self {
            format,
            width,
            height,
            planes,
            pts: None,
            sample_aspect_ratio: Rational::UNKNOWN,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn planes(&self) -> &[PlaneBuf] {
        &self.planes
    }

    pub fn plane(&self, index: usize) -> Option<&PlaneBuf> {
        self.planes.get(index)
    }

    pub fn plane_mut(&mut self, index: usize) -> Option<&mut PlaneBuf> {
        self.planes.get_mut(index)
    }

    pub fn into_planes(self) -> Vec<PlaneBuf> {
        self.planes
    }

    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    pub fn set_pts(&mut self, pts: Option<i64>) {
        self.pts = pts;
    }

    pub fn sample_aspect_ratio(&self) -> Rational {
        self.sample_aspect_ratio
    }

    pub fn set_sample_aspect_ratio(&mut self, sar: Rational) {
        self.sample_aspect_ratio = sar;
    }

    pub(crate) fn describe(&self) -> String {
        describe(self.format, self.width, self.height)
    }
}

pub(crate) fn describe(format: PixelFormat, width: usize, height: usize) -> String {
    format!("{format} {width}x{height}")
}
