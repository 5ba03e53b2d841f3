use std::sync::Arc;
use std::time::Instant;

use ps_core::AddressMode;
use ps_kernel::{Component, DitherTable, DstLayout, Kernel, LaunchParams, VariantKey};

use crate::config::ScaleConfig;
use crate::dims::eval_dimensions;
use crate::error::ScaleError;
use crate::format::{PixelFormat, PlaneLayout};
use crate::frame::{Frame, Rational, describe};
use crate::progress::{FrameReport, NullSink, ProgressSink, ScaleSummary};

/// Output frames kept for reuse.
pub const POOL_SIZE: usize = 2;

/// Format, size and sample aspect ratio of a frame stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProps {
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
    pub sample_aspect_ratio: Rational,
}

pub type InputProps = FrameProps;
pub type OutputProps = FrameProps;

impl FrameProps {
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Self {
        Self {
            format,
            width,
            height,
            sample_aspect_ratio: Rational::UNKNOWN,
        }
    }

    fn matches(&self, frame: &Frame) -> bool {
        frame.format() == self.format && frame.width() == self.width && frame.height() == self.height
    }
}

/// One kernel launch per frame: source plane in, destination plane out.
#[derive(Debug, Clone, Copy)]
struct PlaneJob {
    kernel: Kernel,
    src_plane: usize,
    dst_plane: usize,
    src_dims: (usize, usize),
    dst_dims: (usize, usize),
}

/// Scales a stream of frames of one input format and size.
///
/// Kernel variants, output geometry and the dither table are fixed by
/// [`Scaler::new`]; [`Scaler::process`] only launches.
pub struct Scaler {
    input: InputProps,
    output: OutputProps,
    address_mode: AddressMode,
    jobs: Vec<PlaneJob>,
    passthrough: bool,
    dither: Option<DitherTable>,
    pool: Vec<Frame>,
    sink: Arc<dyn ProgressSink>,
    frames: u64,
}

impl Scaler {
    pub fn new(config: &ScaleConfig, input: InputProps) -> Result<Self, ScaleError> {
        Self::configure(config, input).inspect_err(|err| {
            tracing::error!(error = %err, input = %describe(input.format, input.width, input.height), "cannot configure scaler");
        })
    }

    fn configure(config: &ScaleConfig, input: InputProps) -> Result<Self, ScaleError> {
        if input.width == 0 || input.height == 0 {
            return Err(ScaleError::InvalidDimensions {
                width: input.width as i64,
                height: input.height as i64,
            });
        }

        let out_format = config.format.resolve(input.format);
        let (out_w, out_h) =
            eval_dimensions(&config.width, &config.height, &input, out_format)?;

        let unsupported = || ScaleError::UnsupportedConversion {
            from: input.format,
            to: out_format,
        };
        let dithered = config.dither && input.format.depth() > out_format.depth();
        let Some(routes) = plane_routes(input.format, out_format, dithered) else {
            return Err(unsupported());
        };

        let mut jobs = Vec::with_capacity(routes.len());
        for (src_plane, dst_plane, key) in routes {
            let Some(kernel) = Kernel::select(key) else {
                return Err(unsupported());
            };
            jobs.push(PlaneJob {
                kernel,
                src_plane,
                dst_plane,
                src_dims: input.format.plane_dims(src_plane, input.width, input.height),
                dst_dims: out_format.plane_dims(dst_plane, out_w, out_h),
            });
        }

        // Uploaded whenever the logical depth narrows, even if the container
        // stays the same and no selected kernel reads it (P016 to P010).
        let dither = if dithered {
            Some(DitherTable::upload().map_err(ScaleError::Allocation)?)
        } else {
            None
        };

        let passthrough = config.passthrough
            && out_format == input.format
            && (out_w, out_h) == (input.width, input.height);

        if out_w > input.width || out_h > input.height {
            tracing::warn!(
                in_width = input.width,
                in_height = input.height,
                out_width = out_w,
                out_height = out_h,
                "upscaling falls back to single bilinear taps"
            );
        }

        let output = OutputProps {
            format: out_format,
            width: out_w,
            height: out_h,
            sample_aspect_ratio: rescale_sar(
                input.sample_aspect_ratio,
                (input.width, input.height),
                (out_w, out_h),
            ),
        };

        tracing::info!(
            in_format = %input.format,
            out_format = %out_format,
            "w:{} h:{} -> w:{} h:{}",
            input.width,
            input.height,
            out_w,
            out_h
        );

        Ok(Self {
            input,
            output,
            address_mode: config.address_mode,
            jobs,
            passthrough,
            dither,
            pool: Vec::with_capacity(POOL_SIZE),
            sink: Arc::new(NullSink),
            frames: 0,
        })
    }

    /// Installs a progress sink and reports the configuration to it.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        sink.configured(&self.summary());
        self.sink = sink;
        self
    }

    pub fn input_props(&self) -> InputProps {
        self.input
    }

    pub fn output_props(&self) -> OutputProps {
        self.output
    }

    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    pub fn summary(&self) -> ScaleSummary {
        ScaleSummary {
            in_format: self.input.format,
            in_width: self.input.width,
            in_height: self.input.height,
            out_format: self.output.format,
            out_width: self.output.width,
            out_height: self.output.height,
            sample_aspect_ratio: self.output.sample_aspect_ratio,
            passthrough: self.passthrough,
            dithered: self.jobs.iter().any(|j| j.kernel.key().dither),
            kernels: self.jobs.iter().map(|j| j.kernel.name()).collect(),
        }
    }

    /// Scales one frame. The output carries the input's pts and a sample
    /// aspect ratio adjusted for the new size.
    pub fn process(&mut self, frame: &Frame) -> Result<Frame, ScaleError> {
        let start = Instant::now();
        if !self.input.matches(frame) {
            let err = ScaleError::FrameMismatch {
                expected: describe(self.input.format, self.input.width, self.input.height),
                actual: frame.describe(),
            };
            tracing::error!(error = %err, "rejecting frame");
            return Err(err);
        }

        let mut out = self.take_frame()?;
        let result = if self.passthrough {
            copy_planes(frame, &mut out)
        } else {
            self.launch_planes(frame, &mut out)
        };
        if let Err(err) = result {
            self.recycle(out);
            return Err(err);
        }

        out.set_pts(frame.pts());
        out.set_sample_aspect_ratio(rescale_sar(
            frame.sample_aspect_ratio(),
            (self.input.width, self.input.height),
            (self.output.width, self.output.height),
        ));

        let report = FrameReport {
            index: self.frames,
            pts: frame.pts(),
            elapsed: start.elapsed(),
            passthrough: self.passthrough,
        };
        self.frames += 1;
        self.sink.frame_done(&report);
        Ok(out)
    }

    /// Hands an output frame back for reuse. Frames of another geometry and
    /// frames beyond [`POOL_SIZE`] are dropped.
    pub fn recycle(&mut self, frame: Frame) {
        if self.output.matches(&frame) && self.pool.len() < POOL_SIZE {
            self.pool.push(frame);
        }
    }

    fn take_frame(&mut self) -> Result<Frame, ScaleError> {
        match self.pool.pop() {
            Some(frame) => Ok(frame),
            None => Frame::new(self.output.format, self.output.width, self.output.height),
        }
    }

    fn launch_planes(&self, src: &Frame, dst: &mut Frame) -> Result<(), ScaleError> {
        for job in &self.jobs {
            let missing = |plane| ScaleError::PlaneLayout {
                format: src.format(),
                width: src.width(),
                height: src.height(),
                plane,
            };
            let src_plane = src.plane(job.src_plane).ok_or_else(|| missing(job.src_plane))?;
            let dst_plane = dst
                .plane_mut(job.dst_plane)
                .ok_or_else(|| missing(job.dst_plane))?;

            let params = LaunchParams {
                dst_width: job.dst_dims.0,
                dst_height: job.dst_dims.1,
                src_width: job.src_dims.0,
                src_height: job.src_dims.1,
                address_mode: self.address_mode,
                dither: self.dither.as_ref(),
            };
            job.kernel
                .launch(&src_plane.source(), &mut dst_plane.dest(), &params)
                .map_err(|source| {
                    tracing::error!(kernel = job.kernel.name(), plane = job.dst_plane, error = %source, "launch failed");
                    ScaleError::Launch {
                        plane: job.dst_plane,
                        kernel: job.kernel.name(),
                        source,
                    }
                })?;
        }
        Ok(())
    }
}

fn copy_planes(src: &Frame, dst: &mut Frame) -> Result<(), ScaleError> {
    let (format, width, height) = (dst.format(), dst.width(), dst.height());
    for (i, plane) in src.planes().iter().enumerate() {
        let copied = dst.plane_mut(i).map(|d| d.copy_from(plane));
        if !matches!(copied, Some(Ok(()))) {
            return Err(ScaleError::PlaneLayout {
                format,
                width,
                height,
                plane: i,
            });
        }
    }
    Ok(())
}

/// `(src plane, dst plane, variant)` for every launch converting `from`
/// into `to`, or `None` when the plane layouts do not map onto each other.
fn plane_routes(
    from: PixelFormat,
    to: PixelFormat,
    dither: bool,
) -> Option<Vec<(usize, usize, VariantKey)>> {
    use Component::{First, Second};
    use DstLayout::{Combined, Interleave, Split};
    use PlaneLayout::{Packed, Planar, SemiPlanar};

    let routes: &[(usize, usize, usize, DstLayout)] = match (from.desc().layout, to.desc().layout) {
        (Packed(1), Packed(1)) => &[(0, 0, 1, Combined)],
        (Packed(3), Packed(3)) => &[(0, 0, 3, Combined)],
        (Packed(4), Packed(4)) => &[(0, 0, 4, Combined)],
        (Planar, Planar) => &[(0, 0, 1, Combined), (1, 1, 1, Combined), (2, 2, 1, Combined)],
        (Planar, SemiPlanar) => &[
            (0, 0, 1, Combined),
            (1, 1, 1, Interleave(First)),
            (2, 1, 1, Interleave(Second)),
        ],
        (SemiPlanar, SemiPlanar) => &[(0, 0, 1, Combined), (1, 1, 2, Combined)],
        (SemiPlanar, Planar) => &[
            (0, 0, 1, Combined),
            (1, 1, 2, Split(First)),
            (1, 2, 2, Split(Second)),
        ],
        _ => return None,
    };

    Some(
        routes
            .iter()
            .map(|&(src, dst, channels, layout)| {
                let key = VariantKey {
                    src_channels: channels,
                    src_depth: from.container(),
                    dst_depth: to.container(),
                    dither,
                    layout,
                };
                (src, dst, key)
            })
            .collect(),
    )
}

/// Keeps the display aspect ratio when the storage size changes.
fn rescale_sar(sar: Rational, (in_w, in_h): (usize, usize), (out_w, out_h): (usize, usize)) -> Rational {
    if sar.is_unknown() {
        return Rational::UNKNOWN;
    }
    sar.mul(Rational::new(
        (out_h * in_w) as i64,
        (out_w * in_h) as i64,
    ))
}
