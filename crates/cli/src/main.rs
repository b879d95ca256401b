use snapfit_core::{
    config::Config,
    geometry::ImageRegion,
    init,
    pipeline::OutputFormat,
    resize::{ResizeRequest, SizeTargeting},
    session::crop_region,
    stats, SnapFit,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to crop and resize
    input: PathBuf,

    /// Output file (default: <stem>_resized.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Scale both sides by a percentage instead of giving a size
    #[arg(long, conflicts_with_all = ["width", "height"])]
    scale: Option<u32>,

    /// Output format: jpeg, png, webp, avif
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Encoder quality in (0, 1], used when no target size is given
    #[arg(short, long)]
    quality: Option<f32>,

    /// Target file size, e.g. 200KB or 1.5MB (plain numbers are KB)
    #[arg(short, long)]
    target_size: Option<String>,

    /// Crop region in image pixels before resizing: X,Y,W,H
    #[arg(long, value_parser = parse_region)]
    crop: Option<ImageRegion>,

    /// Open the editor window instead of processing headlessly
    #[arg(short, long, default_value_t = false)]
    interactive: bool,
}

fn parse_region(s: &str) -> std::result::Result<ImageRegion, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("expected X,Y,W,H: {e}"))?;
    match parts[..] {
        [x, y, w, h] => Ok(ImageRegion::new(x, y, w, h)),
        _ => Err(format!("expected 4 values X,Y,W,H, got {}", parts.len())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config::load().context("Failed to load configuration")?;
    let app = SnapFit::with_config(config);

    let source = app
        .open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let format = args
        .format
        .or_else(|| format_from_extension(args.output.as_deref()))
        .unwrap_or(app.config().default_format);
    let output = args.output.clone().unwrap_or_else(|| {
        let name = stats::output_file_name(&args.input, format);
        args.input.with_file_name(name)
    });

    if args.interactive {
        match app.run_interactive(source).context("Editor failed")? {
            Some(result) => {
                let output = args.output.clone().unwrap_or_else(|| {
                    args.input
                        .with_file_name(stats::output_file_name(&args.input, result.format))
                });
                std::fs::write(&output, &result.bytes)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                println!("{}", result.status_message());
                println!("Saved {} ({})", output.display(), stats::format_file_size(result.size()));
            }
            None => println!("Closed without resizing"),
        }
        return Ok(());
    }

    // Crop
    let image = match args.crop {
        Some(region) => crop_region(&source.image, region).context("Invalid --crop region")?,
        None => source.image,
    };
    let dims = (image.width(), image.height());

    // Size
    let (width, height) = match (args.scale, args.width, args.height) {
        (Some(pct), _, _) => {
            if pct == 0 {
                bail!("--scale must be greater than zero");
            }
            stats::ResizePreset::Percent(pct).apply(dims, true)
        }
        (None, Some(w), Some(h)) => (w, h),
        (None, Some(w), None) => (w, stats::height_for_width(w, dims)),
        (None, None, Some(h)) => (stats::width_for_height(h, dims), h),
        (None, None, None) => dims,
    };

    let quality = args.quality.unwrap_or(app.config().default_quality);
    if !(quality > 0.0 && quality <= 1.0) {
        bail!("--quality must be in (0, 1], got {quality}");
    }
    let target_bytes = args
        .target_size
        .as_deref()
        .map(stats::parse_target_size)
        .transpose()
        .context("Invalid --target-size")?;

    if let Some(target) = target_bytes {
        println!(
            "{}",
            stats::TargetHint::new(target, format, source.file_size).message(format)
        );
    }

    let request = ResizeRequest {
        width,
        height,
        format,
        quality,
        target_bytes,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(format!("Resizing to {}x{} {}...", width, height, format));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = app.resize(Arc::new(image), &request).await;
    spinner.finish_and_clear();
    let result = outcome.context("Resize failed")?;

    std::fs::write(&output, &result.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", result.status_message());
    println!(
        "Saved {} ({}, {})",
        output.display(),
        stats::format_file_size(result.size()),
        stats::PixelChange::between(dims, (result.width, result.height)).label()
    );
    if let SizeTargeting::ClosestAchievable { .. } = result.targeting {
        eprintln!("Warning: target size was not reachable, output is larger than requested");
    }

    Ok(())
}

fn format_from_extension(path: Option<&Path>) -> Option<OutputFormat> {
    path?.extension()?.to_str()?.parse().ok()
}
