//! Example: scale one synthetic 10-bit frame down a resolution ladder.
//!
//! Builds a P010 test pattern (luma ramp, constant chroma), scales it to
//! each rung as NV12 with and without dithering, and reports timing plus
//! the number of distinct luma codes per output. Dithering keeps more codes
//! alive in smooth ramps.
//!
//! Run from the workspace root:
//!   cargo run -p planescale --example ladder -- --help
//!   cargo run -p planescale --example ladder -- --out ladder.json

use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use planescale::{
    Frame, InputProps, OutputFormat, PixelFormat, PlaneBuf, ScaleConfig, Scaler,
};
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Scale a synthetic P010 frame down a resolution ladder")]
struct Args {
    #[arg(long, default_value_t = 3840)]
    width: usize,

    #[arg(long, default_value_t = 2160)]
    height: usize,

    /// Output heights; widths follow the aspect ratio, rounded to even.
    #[arg(long, value_delimiter = ',', default_value = "1080,720,480,240")]
    rungs: Vec<usize>,

    /// Output JSON path; results are only printed when absent.
    #[arg(long)]
    out: Option<String>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RungResult {
    width: usize,
    height: usize,
    dither: bool,
    kernels: Vec<&'static str>,
    /// Wall-clock time for one frame, in milliseconds.
    elapsed_ms: f64,
    distinct_luma: usize,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Horizontal luma ramp over the full 10-bit range, MSB-aligned.
fn ramp_frame(width: usize, height: usize) -> Result<Frame> {
    let mut frame = Frame::new(PixelFormat::P010, width, height).context("allocating P010")?;
    if let Some(PlaneBuf::U16(luma)) = frame.plane_mut(0) {
        let mut view = luma.as_view_mut();
        for y in 0..view.height() {
            for (x, s) in view.row_mut(y).iter_mut().enumerate() {
                *s = (((x * 1023) / width.max(2).saturating_sub(1)) as u16) << 6;
            }
        }
    }
    if let Some(PlaneBuf::U16(uv)) = frame.plane_mut(1) {
        uv.as_view_mut().fill(512 << 6);
    }
    Ok(frame)
}

fn distinct_luma(frame: &Frame) -> usize {
    let Some(PlaneBuf::U8(luma)) = frame.plane(0) else {
        return 0;
    };
    let view = luma.as_view();
    (0..view.height())
        .flat_map(|y| view.row(y).iter().copied())
        .collect::<BTreeSet<u8>>()
        .len()
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    let input = ramp_frame(args.width, args.height)?;
    println!("source: P010 {}x{}", args.width, args.height);

    let mut results = Vec::new();
    for &rung in &args.rungs {
        for dither in [false, true] {
            let cfg = ScaleConfig {
                format: OutputFormat::Format(PixelFormat::Nv12),
                dither,
                ..ScaleConfig::with_size("-2", rung.to_string())
            };
            let mut scaler = Scaler::new(
                &cfg,
                InputProps::new(PixelFormat::P010, args.width, args.height),
            )
            .with_context(|| format!("configuring rung {rung}"))?;

            let t0 = Instant::now();
            let out = scaler.process(&input).context("scaling")?;
            let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

            let summary = scaler.summary();
            let distinct = distinct_luma(&out);
            println!(
                "  {}x{} dither={dither}: {distinct} luma codes ({elapsed_ms:.2} ms)",
                summary.out_width, summary.out_height
            );
            results.push(RungResult {
                width: summary.out_width,
                height: summary.out_height,
                dither,
                kernels: summary.kernels,
                elapsed_ms,
                distinct_luma: distinct,
            });
        }
    }

    if let Some(path) = args.out {
        let json = serde_json::to_string_pretty(&results).context("serializing results")?;
        std::fs::write(&path, json).with_context(|| format!("writing {path}"))?;
        println!("results written to {path}");
    }
    Ok(())
}
