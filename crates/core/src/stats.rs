//! Human-readable numbers and small sizing rules shared by the editor and CLI.

use crate::error::{AppError, Result};
use crate::pipeline::OutputFormat;
use std::path::Path;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// `1.5 MB` above one mebibyte, otherwise `12.3 KB`.
pub fn format_file_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b > MIB {
        format!("{:.2} MB", b / MIB)
    } else {
        format!("{:.1} KB", b / KIB)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Reduced aspect ratio (`16:9`), or `2.35:1` when the terms get unwieldy.
pub fn format_aspect(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "-".to_string();
    }
    let g = gcd(width, height);
    let (rw, rh) = (width / g, height / g);
    if rw <= 30 && rh <= 30 {
        format!("{rw}:{rh}")
    } else {
        format!("{:.2}:1", width as f64 / height as f64)
    }
}

/// `2.1 MP`, `480K` or the plain count.
pub fn format_pixels(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1} MP", count as f64 / 1_000_000.0)
    } else if count >= 1000 {
        format!("{:.0}K", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}

/// Pixel-count change from the source to the requested size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelChange {
    Fewer { percent: u32 },
    More { percent: u32 },
    Same,
}

impl PixelChange {
    pub fn between(source: (u32, u32), target: (u32, u32)) -> Self {
        let src = source.0 as f64 * source.1 as f64;
        let dst = target.0 as f64 * target.1 as f64;
        if src == 0.0 {
            return Self::Same;
        }
        let ratio = dst / src;
        if ratio < 0.995 {
            Self::Fewer {
                percent: ((1.0 - ratio) * 100.0).round() as u32,
            }
        } else if ratio > 1.005 {
            Self::More {
                percent: ((ratio - 1.0) * 100.0).round() as u32,
            }
        } else {
            Self::Same
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Fewer { percent } => format!("↓ {percent}% fewer pixels"),
            Self::More { percent } => format!("↑ {percent}% more pixels"),
            Self::Same => "Same size".to_string(),
        }
    }
}

/// Average of the per-axis scale factors, in percent.
pub fn scale_percent(source: (u32, u32), target: (u32, u32)) -> u32 {
    if source.0 == 0 || source.1 == 0 {
        return 0;
    }
    let avg = (target.0 as f64 / source.0 as f64 + target.1 as f64 / source.1 as f64) / 2.0;
    (avg * 100.0).round() as u32
}

/// Parses a target size such as `200KB`, `1.5 MB` or `300` (kilobytes).
///
/// # Errors
///
/// Returns [`AppError::InvalidTarget`] for unparseable, zero or negative sizes.
pub fn parse_target_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    let (number, multiplier) = if let Some(n) = lower.strip_suffix("mb") {
        (n, MIB)
    } else if let Some(n) = lower.strip_suffix("kb") {
        (n, KIB)
    } else {
        (lower.as_str(), KIB)
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidTarget(format!("cannot parse '{trimmed}' as a size")))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::InvalidTarget(format!(
            "'{trimmed}' must be a positive size"
        )));
    }
    Ok((value * multiplier).round() as u64)
}

/// How a target size relates to the chosen format and the original file.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetHint {
    /// Lossless format, the target cannot be honoured.
    Lossless,
    /// Target is at least the original size; maximum quality will do.
    LargerThanOriginal { original_bytes: u64 },
    /// Target is smaller than the original by this percentage.
    Reduction { target_bytes: u64, percent: u32 },
}

impl TargetHint {
    pub fn new(target_bytes: u64, format: OutputFormat, original_bytes: u64) -> Self {
        if format.is_lossless() {
            Self::Lossless
        } else if target_bytes >= original_bytes {
            Self::LargerThanOriginal { original_bytes }
        } else {
            let percent = ((1.0 - target_bytes as f64 / original_bytes as f64) * 100.0).round();
            Self::Reduction {
                target_bytes,
                percent: percent as u32,
            }
        }
    }

    pub fn message(&self, format: OutputFormat) -> String {
        match self {
            Self::Lossless => format!(
                "{format} is lossless, so quality won't reduce size. Use JPEG or AVIF for a target file size."
            ),
            Self::LargerThanOriginal { original_bytes } => format!(
                "Target is larger than original ({}). Will use max quality.",
                format_file_size(*original_bytes)
            ),
            Self::Reduction {
                target_bytes,
                percent,
            } => format!(
                "Target: {} ({}% smaller than original). Quality will auto-adjust.",
                format_file_size(*target_bytes),
                percent
            ),
        }
    }
}

/// A one-click output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePreset {
    /// Percentage of the source dimensions.
    Percent(u32),
    /// Fixed width; height follows the aspect ratio when locked.
    Width { width: u32, height: u32 },
}

impl ResizePreset {
    pub fn label(&self) -> String {
        match self {
            Self::Percent(p) => format!("{p}%"),
            Self::Width { width, .. } => format!("{width}w"),
        }
    }

    /// Output dimensions for a source of `source` pixels.
    pub fn apply(&self, source: (u32, u32), aspect_locked: bool) -> (u32, u32) {
        match *self {
            Self::Percent(p) => {
                let f = p as f64 / 100.0;
                (
                    ((source.0 as f64 * f).round() as u32).max(1),
                    ((source.1 as f64 * f).round() as u32).max(1),
                )
            }
            Self::Width { width, height } => {
                if aspect_locked {
                    (width, height_for_width(width, source))
                } else {
                    (width, height)
                }
            }
        }
    }
}

pub const RESIZE_PRESETS: &[ResizePreset] = &[
    ResizePreset::Percent(25),
    ResizePreset::Percent(50),
    ResizePreset::Percent(75),
    ResizePreset::Width {
        width: 1920,
        height: 1080,
    },
    ResizePreset::Width {
        width: 1280,
        height: 720,
    },
    ResizePreset::Width {
        width: 800,
        height: 600,
    },
];

/// Height matching `width` at the source's aspect ratio.
pub fn height_for_width(width: u32, source: (u32, u32)) -> u32 {
    if source.0 == 0 {
        return width;
    }
    ((width as f64 * source.1 as f64 / source.0 as f64).round() as u32).max(1)
}

/// Width matching `height` at the source's aspect ratio.
pub fn width_for_height(height: u32, source: (u32, u32)) -> u32 {
    if source.1 == 0 {
        return height;
    }
    ((height as f64 * source.0 as f64 / source.1 as f64).round() as u32).max(1)
}

/// `<stem>_resized.<ext>` for the given input path.
pub fn output_file_name(input: &Path, format: OutputFormat) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("{stem}_resized.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_switch_units_above_a_mebibyte() {
        assert_eq!(format_file_size(512), "0.5 KB");
        assert_eq!(format_file_size(204_800), "200.0 KB");
        assert_eq!(format_file_size(1_048_576), "1024.0 KB");
        assert_eq!(format_file_size(1_572_864), "1.50 MB");
    }

    #[test]
    fn aspect_reduces_or_falls_back_to_decimal() {
        assert_eq!(format_aspect(1920, 1080), "16:9");
        assert_eq!(format_aspect(56, 56), "1:1");
        assert_eq!(format_aspect(2350, 1000), "2.35:1");
        assert_eq!(format_aspect(0, 10), "-");
    }

    #[test]
    fn pixel_counts() {
        assert_eq!(format_pixels(2_073_600), "2.1 MP");
        assert_eq!(format_pixels(480_000), "480K");
        assert_eq!(format_pixels(999), "999");
    }

    #[test]
    fn pixel_change_badge() {
        assert_eq!(
            PixelChange::between((1000, 1000), (500, 500)),
            PixelChange::Fewer { percent: 75 }
        );
        assert_eq!(PixelChange::between((100, 100), (200, 100)), PixelChange::More { percent: 100 });
        assert_eq!(PixelChange::between((100, 100), (100, 100)), PixelChange::Same);
        assert_eq!(PixelChange::Same.label(), "Same size");
    }

    #[test]
    fn scale_is_average_of_axes() {
        assert_eq!(scale_percent((1000, 500), (500, 250)), 50);
        assert_eq!(scale_percent((1000, 500), (1000, 250)), 75);
    }

    #[test]
    fn target_sizes_parse_with_units() {
        assert_eq!(parse_target_size("200KB").unwrap(), 204_800);
        assert_eq!(parse_target_size("1.5 mb").unwrap(), 1_572_864);
        assert_eq!(parse_target_size("300").unwrap(), 307_200);
        assert!(parse_target_size("0").is_err());
        assert!(parse_target_size("-5KB").is_err());
        assert!(parse_target_size("lots").is_err());
    }

    #[test]
    fn target_hint_variants() {
        assert_eq!(TargetHint::new(1000, OutputFormat::Png, 5000), TargetHint::Lossless);
        assert_eq!(
            TargetHint::new(6000, OutputFormat::Jpeg, 5000),
            TargetHint::LargerThanOriginal { original_bytes: 5000 }
        );
        assert_eq!(
            TargetHint::new(1000, OutputFormat::Jpeg, 5000),
            TargetHint::Reduction {
                target_bytes: 1000,
                percent: 80
            }
        );
        assert!(TargetHint::Lossless.message(OutputFormat::Png).starts_with("PNG is lossless"));
    }

    #[test]
    fn presets_follow_aspect_lock() {
        assert_eq!(ResizePreset::Percent(50).apply((1001, 500), true), (501, 250));
        let hd = ResizePreset::Width {
            width: 1920,
            height: 1080,
        };
        assert_eq!(hd.apply((4000, 3000), true), (1920, 1440));
        assert_eq!(hd.apply((4000, 3000), false), (1920, 1080));
    }

    #[test]
    fn aspect_coupling_rounds() {
        assert_eq!(height_for_width(800, (1600, 900)), 450);
        assert_eq!(width_for_height(450, (1600, 900)), 800);
        assert_eq!(height_for_width(1, (1000, 10)), 1);
    }

    #[test]
    fn output_names_use_stem_and_extension() {
        assert_eq!(output_file_name(Path::new("/tmp/photo.png"), OutputFormat::Jpeg), "photo_resized.jpg");
        assert_eq!(output_file_name(Path::new(""), OutputFormat::WebP), "image_resized.webp");
    }
}
