use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use planescale::{
    BitDepth, Frame, InputProps, OutputFormat, PixelFormat, Plane, PlaneBuf, ScaleConfig,
    ScaleSummary, Scaler, TracingSink,
};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "ps_scale")]
#[command(about = "Scale images and raw video frames with the planescale kernels")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "image")]
    Image(ImageArgs),
    #[command(name = "raw")]
    Raw(RawArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, required = true)]
    out: PathBuf,
    /// Output width expression, e.g. `iw/2`, `1280` or `-2`.
    #[arg(long)]
    width: Option<String>,
    #[arg(long)]
    height: Option<String>,
    /// JSON scaler config; flags given on the command line win.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    no_dither: bool,
}

#[derive(Args, Debug, Clone)]
struct ImageArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Output bits per channel; defaults to the input's.
    #[arg(long, value_parser = ["8", "16"])]
    depth: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct RawArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, required = true)]
    in_format: PixelFormat,
    /// Input frame size as `WxH`.
    #[arg(long, required = true, value_parser = parse_size)]
    size: (usize, usize),
    /// Output pixel format or `same`.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaImage {
    input: String,
    output: String,
    config: ScaleConfig,
    summary: ScaleSummary,
}

#[derive(Debug, Clone, Serialize)]
struct MetaRaw {
    input: String,
    output: String,
    config: ScaleConfig,
    summary: ScaleSummary,
    frames: usize,
    in_frame_bytes: usize,
    out_frame_bytes: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Image(args) => run_image(args),
        Command::Raw(args) => run_raw(args),
    }
}

fn run_image(args: ImageArgs) -> Result<()> {
    ensure_file_exists(&args.common.input, "input")?;
    let frame = load_image_frame(&args.common.input)?;
    let in_format = frame.format();

    let mut config = build_config(&args.common)?;
    if let Some(depth) = args.depth.as_deref() {
        let wide = depth == "16";
        config.format = OutputFormat::Format(packed_with_depth(in_format, wide)?);
    }

    let mut scaler = Scaler::new(
        &config,
        InputProps::new(in_format, frame.width(), frame.height()),
    )
    .with_context(|| format!("configuring scaler for {}", args.common.input.display()))?
    .with_progress(Arc::new(TracingSink));

    let out = scaler
        .process(&frame)
        .with_context(|| format!("scaling {}", args.common.input.display()))?;

    ensure_parent_dir(&args.common.out)?;
    save_image_frame(&args.common.out, &out)?;

    write_json(
        meta_path(&args.common.out),
        &MetaImage {
            input: args.common.input.display().to_string(),
            output: args.common.out.display().to_string(),
            config,
            summary: scaler.summary(),
        },
    )
}

fn run_raw(args: RawArgs) -> Result<()> {
    ensure_file_exists(&args.common.input, "input")?;
    let (width, height) = args.size;

    let mut config = build_config(&args.common)?;
    if let Some(format) = args.format {
        config.format = format;
    }

    let mut scaler = Scaler::new(&config, InputProps::new(args.in_format, width, height))
        .context("configuring raw scaler")?
        .with_progress(Arc::new(TracingSink));
    let out_props = scaler.output_props();

    let in_frame_bytes = frame_bytes(args.in_format, width, height);
    let out_frame_bytes = frame_bytes(out_props.format, out_props.width, out_props.height);

    let input = fs::File::open(&args.common.input)
        .with_context(|| format!("opening {}", args.common.input.display()))?;
    let mut reader = BufReader::new(input);

    ensure_parent_dir(&args.common.out)?;
    let file = fs::File::create(&args.common.out)
        .with_context(|| format!("creating {}", args.common.out.display()))?;
    let mut writer = BufWriter::new(file);

    let limit = args.frames.unwrap_or(usize::MAX);
    let mut chunk = vec![0u8; in_frame_bytes];
    let mut written = 0;
    while written < limit {
        let filled = fill_chunk(&mut reader, &mut chunk)
            .with_context(|| format!("reading frame {written}"))?;
        if filled < in_frame_bytes {
            if written == 0 {
                bail!(
                    "input holds {} bytes, one {} {}x{} frame needs {}.",
                    filled,
                    args.in_format,
                    width,
                    height,
                    in_frame_bytes
                );
            }
            if filled > 0 {
                tracing::warn!(trailing = filled, "ignoring partial frame at end of input");
            }
            break;
        }

        let index = written;
        let mut frame = read_raw_frame(args.in_format, width, height, &chunk)
            .with_context(|| format!("decoding frame {index}"))?;
        frame.set_pts(Some(index as i64));

        let out = scaler
            .process(&frame)
            .with_context(|| format!("scaling frame {index}"))?;
        write_raw_frame(&out, &mut writer).with_context(|| format!("writing frame {index}"))?;
        scaler.recycle(out);
        written += 1;
    }
    writer.flush().context("flushing output")?;
    tracing::info!(frames = written, out = %args.common.out.display(), "raw scaling done");

    write_json(
        meta_path(&args.common.out),
        &MetaRaw {
            input: args.common.input.display().to_string(),
            output: args.common.out.display().to_string(),
            config,
            summary: scaler.summary(),
            frames: written,
            in_frame_bytes,
            out_frame_bytes,
        },
    )
}

fn build_config(common: &CommonArgs) -> Result<ScaleConfig> {
    let mut config = match &common.config {
        Some(path) => {
            ensure_file_exists(path, "config")?;
            read_json::<ScaleConfig>(path)
                .with_context(|| format!("reading scaler config at {}", path.display()))?
        }
        None => ScaleConfig::default(),
    };
    if let Some(w) = &common.width {
        config.width.clone_from(w);
    }
    if let Some(h) = &common.height {
        config.height.clone_from(h);
    }
    if common.no_dither {
        config.dither = false;
    }
    Ok(config)
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w = w.trim().parse().map_err(|_| format!("bad width in '{s}'"))?;
    let h = h.trim().parse().map_err(|_| format!("bad height in '{s}'"))?;
    Ok((w, h))
}

fn packed_with_depth(format: PixelFormat, wide: bool) -> Result<PixelFormat> {
    Ok(match (format, wide) {
        (PixelFormat::Gray8 | PixelFormat::Gray16, false) => PixelFormat::Gray8,
        (PixelFormat::Gray8 | PixelFormat::Gray16, true) => PixelFormat::Gray16,
        (PixelFormat::Rgb24, false) => PixelFormat::Rgb24,
        (PixelFormat::Rgba | PixelFormat::Rgba64, false) => PixelFormat::Rgba,
        (PixelFormat::Rgba | PixelFormat::Rgba64, true) => PixelFormat::Rgba64,
        _ => bail!("no {}-bit counterpart for {}.", if wide { 16 } else { 8 }, format),
    })
}

/// Loads a PNG (or any format `image` decodes) as a packed frame.
fn load_image_frame(path: &Path) -> Result<Frame> {
    let img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let (w, h) = (img.width() as usize, img.height() as usize);

    let (format, plane) = match img {
        DynamicImage::ImageLuma8(buf) => (
            PixelFormat::Gray8,
            PlaneBuf::U8(Plane::from_vec(w, h, 1, buf.into_raw())?),
        ),
        DynamicImage::ImageLuma16(buf) => (
            PixelFormat::Gray16,
            PlaneBuf::U16(Plane::from_vec(w, h, 1, buf.into_raw())?),
        ),
        DynamicImage::ImageRgb8(buf) => (
            PixelFormat::Rgb24,
            PlaneBuf::U8(Plane::from_vec(w, h, 3, buf.into_raw())?),
        ),
        DynamicImage::ImageRgba8(buf) => (
            PixelFormat::Rgba,
            PlaneBuf::U8(Plane::from_vec(w, h, 4, buf.into_raw())?),
        ),
        other if other.color().bytes_per_pixel() > other.color().channel_count() => (
            PixelFormat::Rgba64,
            PlaneBuf::U16(Plane::from_vec(w, h, 4, other.to_rgba16().into_raw())?),
        ),
        other => (
            PixelFormat::Rgba,
            PlaneBuf::U8(Plane::from_vec(w, h, 4, other.to_rgba8().into_raw())?),
        ),
    };

    Frame::from_planes(format, w, h, vec![plane])
        .with_context(|| format!("building frame from {}", path.display()))
}

fn save_image_frame(path: &Path, frame: &Frame) -> Result<()> {
    let (w, h) = (frame.width() as u32, frame.height() as u32);
    let plane = frame.plane(0).context("output frame has no planes")?;

    let img = match (frame.format(), plane) {
        (PixelFormat::Gray8, PlaneBuf::U8(p)) => DynamicImage::ImageLuma8(
            ImageBuffer::<Luma<u8>, _>::from_raw(w, h, packed_samples(p)).context("gray8 buffer")?,
        ),
        (PixelFormat::Gray16, PlaneBuf::U16(p)) => DynamicImage::ImageLuma16(
            ImageBuffer::<Luma<u16>, _>::from_raw(w, h, packed_samples(p))
                .context("gray16 buffer")?,
        ),
        (PixelFormat::Rgb24, PlaneBuf::U8(p)) => DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, packed_samples(p)).context("rgb24 buffer")?,
        ),
        (PixelFormat::Rgba, PlaneBuf::U8(p)) => DynamicImage::ImageRgba8(
            ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, packed_samples(p)).context("rgba buffer")?,
        ),
        (PixelFormat::Rgba64, PlaneBuf::U16(p)) => DynamicImage::ImageRgba16(
            ImageBuffer::<Rgba<u16>, _>::from_raw(w, h, packed_samples(p))
                .context("rgba64 buffer")?,
        ),
        (format, _) => bail!("cannot save {} frames as an image.", format),
    };

    img.save(path)
        .with_context(|| format!("saving image {}", path.display()))
}

/// Visible samples of a plane without row padding.
fn packed_samples<T: Copy>(plane: &Plane<T>) -> Vec<T> {
    let view = plane.as_view();
    let mut out = Vec::with_capacity(view.row_len() * view.height());
    for y in 0..view.height() {
        out.extend_from_slice(view.row(y));
    }
    out
}

/// Bytes of one tightly packed frame; 16-bit samples are little-endian.
fn frame_bytes(format: PixelFormat, width: usize, height: usize) -> usize {
    let sample = match format.container() {
        BitDepth::Eight => 1,
        BitDepth::Sixteen => 2,
    };
    (0..format.num_planes())
        .map(|i| {
            let (w, h) = format.plane_dims(i, width, height);
            w * h * format.plane_channels(i) * sample
        })
        .sum()
}

/// Reads until `buf` is full or the input ends; returns the bytes read.
fn fill_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_raw_frame(format: PixelFormat, width: usize, height: usize, bytes: &[u8]) -> Result<Frame> {
    if bytes.len() != frame_bytes(format, width, height) {
        bail!(
            "raw {} {}x{} frame needs {} bytes, got {}.",
            format,
            width,
            height,
            frame_bytes(format, width, height),
            bytes.len()
        );
    }

    let mut planes = Vec::with_capacity(format.num_planes());
    let mut rest = bytes;
    for i in 0..format.num_planes() {
        let (w, h) = format.plane_dims(i, width, height);
        let ch = format.plane_channels(i);
        let n = w * h * ch;
        let plane = match format.container() {
            BitDepth::Eight => {
                let (head, tail) = rest.split_at(n);
                rest = tail;
                PlaneBuf::U8(Plane::from_vec(w, h, ch, head.to_vec())?)
            }
            BitDepth::Sixteen => {
                let (head, tail) = rest.split_at(n * 2);
                rest = tail;
                let samples = head
                    .chunks_exact(2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]))
                    .collect();
                PlaneBuf::U16(Plane::from_vec(w, h, ch, samples)?)
            }
        };
        planes.push(plane);
    }

    Ok(Frame::from_planes(format, width, height, planes)?)
}

fn write_raw_frame(frame: &Frame, out: &mut impl Write) -> Result<()> {
    for plane in frame.planes() {
        match plane {
            PlaneBuf::U8(p) => out.write_all(&packed_samples(p))?,
            PlaneBuf::U16(p) => {
                let bytes: Vec<u8> = packed_samples(p)
                    .into_iter()
                    .flat_map(u16::to_le_bytes)
                    .collect();
                out.write_all(&bytes)?;
            }
        }
    }
    Ok(())
}

fn meta_path(out: &Path) -> PathBuf {
    out.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("meta.json"), |p| p.join("meta.json"))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    Ok(())
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
