use ps_kernel::LaunchError;

use crate::format::PixelFormat;

#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    #[error("unrecognized pixel format '{0}'")]
    UnknownFormat(String),
    #[error("no kernel converts {from} to {to}")]
    UnsupportedConversion { from: PixelFormat, to: PixelFormat },
    #[error("invalid dimension expression '{expr}': {reason}")]
    DimensionExpr { expr: String, reason: String },
    #[error("invalid output size {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("rescaled value for width or height is too big ({width}x{height} from {in_width}x{in_height})")]
    DimensionsTooLarge {
        width: i64,
        height: i64,
        in_width: usize,
        in_height: usize,
    },
    #[error("frame is {actual}, scaler was configured for {expected}")]
    FrameMismatch { expected: String, actual: String },
    #[error("plane {plane} does not fit {format} at {width}x{height}")]
    PlaneLayout {
        format: PixelFormat,
        width: usize,
        height: usize,
        plane: usize,
    },
    #[error("frame allocation failed")]
    Allocation(#[source] ps_core::Error),
    #[error("kernel {kernel} failed on plane {plane}")]
    Launch {
        plane: usize,
        kernel: &'static str,
        #[source]
        source: LaunchError,
    },
}
