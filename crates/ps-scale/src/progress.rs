use std::time::Duration;

use serde::Serialize;

use crate::format::PixelFormat;
use crate::frame::Rational;

/// What a [`crate::Scaler`] was configured to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleSummary {
    pub in_format: PixelFormat,
    pub in_width: usize,
    pub in_height: usize,
    pub out_format: PixelFormat,
    pub out_width: usize,
    pub out_height: usize,
    pub sample_aspect_ratio: Rational,
    pub passthrough: bool,
    pub dithered: bool,
    /// Kernel variant per destination plane launch, in launch order.
    pub kernels: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// Zero-based count of frames processed by this scaler.
    pub index: u64,
    pub pts: Option<i64>,
    pub elapsed: Duration,
    pub passthrough: bool,
}

/// Receives scaler progress. Both hooks default to doing nothing.
pub trait ProgressSink: Send + Sync {
    fn configured(&self, _summary: &ScaleSummary) {}

    fn frame_done(&self, _report: &FrameReport) {}
}

pub struct NullSink;

impl ProgressSink for NullSink {}

/// Forwards progress to `tracing` events.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn configured(&self, s: &ScaleSummary) {
        tracing::debug!(
            in_format = %s.in_format,
            out_format = %s.out_format,
            out_width = s.out_width,
            out_height = s.out_height,
            sar = %s.sample_aspect_ratio,
            passthrough = s.passthrough,
            dithered = s.dithered,
            kernels = ?s.kernels,
            "scaler configured"
        );
    }

    fn frame_done(&self, r: &FrameReport) {
        tracing::debug!(
            frame = r.index,
            pts = ?r.pts,
            elapsed_us = r.elapsed.as_micros() as u64,
            passthrough = r.passthrough,
            "frame scaled"
        );
    }
}
