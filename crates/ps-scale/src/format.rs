use core::fmt;
use core::str::FromStr;

use ps_kernel::BitDepth;
use serde::{Deserialize, Serialize};

use crate::error::ScaleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Gray8,
    Gray16,
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Nv12,
    P010,
    P016,
    Rgb24,
    Rgba,
    Rgba64,
}

/// How the components of a format are spread over planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneLayout {
    /// One plane of `n` interleaved channels (gray, packed RGB).
    Packed(usize),
    /// Luma plus two one-channel chroma planes.
    Planar,
    /// Luma plus one interleaved two-channel chroma plane.
    SemiPlanar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDesc {
    pub name: &'static str,
    /// Significant bits per component.
    pub depth: u32,
    pub log2_chroma_w: u32,
    pub log2_chroma_h: u32,
    pub layout: PlaneLayout,
}

const fn desc(
    name: &'static str,
    depth: u32,
    log2_chroma_w: u32,
    log2_chroma_h: u32,
    layout: PlaneLayout,
) -> FormatDesc {
    FormatDesc {
        name,
        depth,
        log2_chroma_w,
        log2_chroma_h,
        layout,
    }
}

const GRAY8: FormatDesc = desc("gray8", 8, 0, 0, PlaneLayout::Packed(1));
const GRAY16: FormatDesc = desc("gray16", 16, 0, 0, PlaneLayout::Packed(1));
const YUV420P: FormatDesc = desc("yuv420p", 8, 1, 1, PlaneLayout::Planar);
const YUV422P: FormatDesc = desc("yuv422p", 8, 1, 0, PlaneLayout::Planar);
const YUV444P: FormatDesc = desc("yuv444p", 8, 0, 0, PlaneLayout::Planar);
const NV12: FormatDesc = desc("nv12", 8, 1, 1, PlaneLayout::SemiPlanar);
const P010: FormatDesc = desc("p010", 10, 1, 1, PlaneLayout::SemiPlanar);
const P016: FormatDesc = desc("p016", 16, 1, 1, PlaneLayout::SemiPlanar);
const RGB24: FormatDesc = desc("rgb24", 8, 0, 0, PlaneLayout::Packed(3));
const RGBA: FormatDesc = desc("rgba", 8, 0, 0, PlaneLayout::Packed(4));
const RGBA64: FormatDesc = desc("rgba64", 16, 0, 0, PlaneLayout::Packed(4));

impl PixelFormat {
    pub const ALL: [PixelFormat; 11] = [
        Self::Gray8,
        Self::Gray16,
        Self::Yuv420p,
        Self::Yuv422p,
        Self::Yuv444p,
        Self::Nv12,
        Self::P010,
        Self::P016,
        Self::Rgb24,
        Self::Rgba,
        Self::Rgba64,
    ];

    pub fn desc(self) -> &'static FormatDesc {
        match self {
            Self::Gray8 => &GRAY8,
            Self::Gray16 => &GRAY16,
            Self::Yuv420p => &YUV420P,
            Self::Yuv422p => &YUV422P,
            Self::Yuv444p => &YUV444P,
            Self::Nv12 => &NV12,
            Self::P010 => &P010,
            Self::P016 => &P016,
            Self::Rgb24 => &RGB24,
            Self::Rgba => &RGBA,
            Self::Rgba64 => &RGBA64,
        }
    }

    pub fn name(self) -> &'static str {
        self.desc().name
    }

    pub fn depth(self) -> u32 {
        self.desc().depth
    }

    /// Sample container of every plane.
    pub fn container(self) -> BitDepth {
        if self.depth() > 8 {
            BitDepth::Sixteen
        } else {
            BitDepth::Eight
        }
    }

    pub fn num_planes(self) -> usize {
        match self.desc().layout {
            PlaneLayout::Packed(_) => 1,
            PlaneLayout::Planar => 3,
            PlaneLayout::SemiPlanar => 2,
        }
    }

    pub fn plane_channels(self, plane: usize) -> usize {
        match (self.desc().layout, plane) {
            (PlaneLayout::Packed(n), _) => n,
            (PlaneLayout::SemiPlanar, 1) => 2,
            _ => 1,
        }
    }

    /// Pixel dimensions of `plane` for a `width x height` image.
    pub fn plane_dims(self, plane: usize, width: usize, height: usize) -> (usize, usize) {
        if plane == 0 {
            return (width, height);
        }
        let d = self.desc();
        chroma_dims(width, height, d.log2_chroma_w, d.log2_chroma_h)
    }
}

/// Chroma plane size for luma `width x height`, rounding up so odd luma
/// sizes keep their last chroma sample.
pub fn chroma_dims(width: usize, height: usize, log2_w: u32, log2_h: u32) -> (usize, usize) {
    (ceil_rshift(width, log2_w), ceil_rshift(height, log2_h))
}

fn ceil_rshift(v: usize, s: u32) -> usize {
    (v + (1 << s) - 1) >> s
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScaleError::UnknownFormat(s.to_string()))
    }
}

/// Requested output format; `same` keeps the input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    #[default]
    Same,
    Format(PixelFormat),
}

impl OutputFormat {
    pub fn resolve(self, input: PixelFormat) -> PixelFormat {
        match self {
            Self::Same => input,
            Self::Format(f) => f,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("same") {
            return Ok(Self::Same);
        }
        s.parse().map(Self::Format)
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ScaleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Same => "same".to_string(),
            OutputFormat::Format(f) => f.name().to_string(),
        }
    }
}
