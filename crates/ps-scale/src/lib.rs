//! Multi-plane frame scaling on top of the `ps-kernel` variants.
//!
//! A [`Scaler`] is configured once for an input stream: it evaluates the
//! output size expressions, maps the input planes onto the output planes,
//! picks one kernel variant per destination launch and uploads the dither
//! table when the output loses precision. Processing a frame is then a
//! fixed sequence of launches, or a plain copy in passthrough mode.
//!
//! Plane mapping by layout:
//! - planar to planar: one launch per plane.
//! - planar to semi-planar: both chroma planes interleave into the UV plane.
//! - semi-planar to semi-planar: the UV plane is filtered as two channels.
//! - semi-planar to planar: the UV plane is split into two planes.
//! - packed formats keep their channel count.

mod config;
mod dims;
mod error;
mod format;
mod frame;
mod progress;
mod scaler;

pub use config::ScaleConfig;
pub use dims::eval_dimensions;
pub use error::ScaleError;
pub use format::{FormatDesc, OutputFormat, PixelFormat, PlaneLayout, chroma_dims};
pub use frame::{FRAME_ALIGN, Frame, PlaneBuf, Rational};
pub use progress::{FrameReport, NullSink, ProgressSink, ScaleSummary, TracingSink};
pub use scaler::{FrameProps, InputProps, OutputProps, POOL_SIZE, Scaler};
