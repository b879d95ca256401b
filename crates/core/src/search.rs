//! Target-size quality search.
//!
//! Converts a byte budget into an encoder quality by bisecting the quality
//! axis. The encoder is a black box; the search assumes its output size does
//! not shrink as quality rises. If an encoder breaks that assumption (some
//! lossy codecs wobble near the extremes) the search still terminates and
//! returns a valid encoding, just possibly not the best one.
//!
//! Encodes are issued strictly one after another: each midpoint depends on
//! the previous result.

use crate::error::{AppError, Result};
use crate::pipeline::OutputFormat;
use std::future::Future;

/// Lowest quality the search will try.
pub const MIN_QUALITY: f32 = 0.01;

/// Highest quality the search will try.
pub const MAX_QUALITY: f32 = 1.0;

/// Upper bound on encodes per search.
pub const MAX_ITERATIONS: u32 = 12;

/// Stop early once the best candidate is within this fraction of the target.
pub const CLOSE_ENOUGH: f64 = 0.03;

/// A result larger than `target * UNREACHABLE_RATIO` did not meet the budget.
pub const UNREACHABLE_RATIO: f64 = 1.1;

/// Result of a quality search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub blob: Vec<u8>,
    pub quality: f32,
    pub target_bytes: u64,
    /// Number of encodes performed, including a fallback encode.
    pub encodes: u32,
    /// No candidate met the budget; `blob` is the minimum-quality encoding.
    pub fell_back: bool,
}

impl SearchOutcome {
    pub fn size(&self) -> u64 {
        self.blob.len() as u64
    }

    /// Encoded size divided by the target.
    pub fn size_ratio(&self) -> f64 {
        self.size() as f64 / self.target_bytes as f64
    }

    /// Whether the result overshoots the target by more than 10%.
    pub fn target_unreachable(&self) -> bool {
        self.size_ratio() > UNREACHABLE_RATIO
    }
}

/// Bounded bisection over encoder quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySearchEngine {
    pub min_quality: f32,
    pub max_quality: f32,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for QualitySearchEngine {
    fn default() -> Self {
        Self {
            min_quality: MIN_QUALITY,
            max_quality: MAX_QUALITY,
            max_iterations: MAX_ITERATIONS,
            tolerance: CLOSE_ENOUGH,
        }
    }
}

impl QualitySearchEngine {
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Rejects size targeting for formats whose size ignores quality.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnsupportedTargetForFormat`] for lossless formats.
    pub fn check_format(format: OutputFormat) -> Result<()> {
        if format.is_lossless() {
            return Err(AppError::UnsupportedTargetForFormat(format));
        }
        Ok(())
    }

    /// Finds the highest quality whose encoding fits in `target_bytes`.
    ///
    /// Each step encodes at the midpoint of `[lo, hi]`; a fitting result
    /// becomes the new best and raises `lo`, an oversized one lowers `hi`.
    /// When nothing fits, the minimum quality is encoded once and returned
    /// with [`fell_back`](SearchOutcome::fell_back) set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidTarget`] for a zero target and propagates
    /// any error from `encode`.
    pub async fn search<F, Fut>(&self, mut encode: F, target_bytes: u64) -> Result<SearchOutcome>
    where
        F: FnMut(f32) -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        if target_bytes == 0 {
            return Err(AppError::InvalidTarget(
                "target size must be greater than zero".to_string(),
            ));
        }

        let target = target_bytes as f64;
        let mut lo = self.min_quality;
        let mut hi = self.max_quality;
        let mut best: Option<(Vec<u8>, f32)> = None;
        let mut encodes = 0;

        for iteration in 0..self.max_iterations {
            let mid = (lo + hi) / 2.0;
            let blob = encode(mid).await?;
            encodes += 1;
            let size = blob.len() as u64;
            log::debug!(
                "quality search #{}: q={:.4} -> {} bytes (target {})",
                iteration + 1,
                mid,
                size,
                target_bytes
            );

            if size <= target_bytes {
                best = Some((blob, mid));
                lo = mid;
            } else {
                hi = mid;
            }

            if let Some((blob, _)) = &best {
                if (blob.len() as f64 - target).abs() / target < self.tolerance {
                    break;
                }
            }
        }

        let (blob, quality, fell_back) = match best {
            Some((blob, quality)) => (blob, quality, false),
            None => {
                let blob = encode(self.min_quality).await?;
                encodes += 1;
                (blob, self.min_quality, true)
            }
        };

        let outcome = SearchOutcome {
            blob,
            quality,
            target_bytes,
            encodes,
            fell_back,
        };
        if outcome.target_unreachable() {
            log::warn!(
                "target {} bytes unreachable, closest is {} bytes at q={:.2}",
                target_bytes,
                outcome.size(),
                quality
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Deterministic encoder whose size grows linearly with quality.
    fn linear(base: usize, slope: f32) -> impl FnMut(f32) -> std::future::Ready<Result<Vec<u8>>> {
        move |q| std::future::ready(Ok(vec![0u8; base + (q * slope) as usize]))
    }

    #[tokio::test]
    async fn finds_highest_quality_within_budget() {
        let engine = QualitySearchEngine::default();
        // size(q) = 1000 + 9000q; 5000 bytes fits up to q = 0.444...
        let outcome = engine.search(linear(1000, 9000.0), 5000).await.unwrap();
        assert!(outcome.size() <= 5000);
        assert!(!outcome.fell_back);
        assert!(!outcome.target_unreachable());
        let exact = 4000.0 / 9000.0;
        // Either within 3% of the budget or bisected down to the iteration limit.
        let near_budget = (outcome.size() as f64 - 5000.0).abs() / 5000.0 < CLOSE_ENOUGH;
        assert!(near_budget || (outcome.quality - exact).abs() < 0.01);
        assert!(outcome.quality <= exact + 1e-6);
    }

    #[tokio::test]
    async fn stops_early_once_close_enough() {
        let engine = QualitySearchEngine::default();
        // First probe at q = 0.505 gives 1000 + 5050 = 6050 bytes, within 3% of 6100.
        let outcome = engine.search(linear(1000, 10_000.0), 6100).await.unwrap();
        assert_eq!(outcome.encodes, 1);
        assert!((outcome.quality - 0.505).abs() < 1e-6);
    }

    #[tokio::test]
    async fn never_exceeds_iteration_cap() {
        let calls = Cell::new(0u32);
        let engine = QualitySearchEngine::default();
        let outcome = engine
            .search(
                |q| {
                    calls.set(calls.get() + 1);
                    std::future::ready(Ok::<_, AppError>(vec![0u8; (q * 100.0) as usize]))
                },
                1_000_000,
            )
            .await
            .unwrap();
        assert_eq!(calls.get(), MAX_ITERATIONS);
        assert_eq!(outcome.encodes, MAX_ITERATIONS);
        // Every probe fits, so lo climbs towards the maximum quality.
        assert!(outcome.quality > 0.99);
    }

    #[tokio::test]
    async fn falls_back_to_minimum_quality_when_nothing_fits() {
        let calls = Cell::new(Vec::new());
        let engine = QualitySearchEngine::default();
        let outcome = engine
            .search(
                |q| {
                    let mut seen = calls.take();
                    seen.push(q);
                    calls.set(seen);
                    std::future::ready(Ok::<_, AppError>(vec![0u8; 10_000]))
                },
                100,
            )
            .await
            .unwrap();
        let seen = calls.take();
        assert_eq!(seen.len() as u32, MAX_ITERATIONS + 1);
        assert_eq!(*seen.last().unwrap(), MIN_QUALITY);
        assert!(outcome.fell_back);
        assert_eq!(outcome.quality, MIN_QUALITY);
        assert!(outcome.target_unreachable());
    }

    #[tokio::test]
    async fn repeated_searches_agree() {
        let engine = QualitySearchEngine::default();
        let a = engine.search(linear(200, 50_000.0), 12_345).await.unwrap();
        let b = engine.search(linear(200, 50_000.0), 12_345).await.unwrap();
        assert_eq!((a.size(), a.quality), (b.size(), b.quality));
    }

    #[tokio::test]
    async fn encode_errors_propagate() {
        let engine = QualitySearchEngine::default();
        let err = engine
            .search(|_| std::future::ready(Err::<Vec<u8>, _>(AppError::encode("boom"))), 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EncodeFailure(_)));
    }

    #[tokio::test]
    async fn zero_target_is_rejected() {
        let engine = QualitySearchEngine::default();
        let err = engine.search(linear(1, 1.0), 0).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn non_monotonic_encoder_still_returns_a_fitting_result() {
        let engine = QualitySearchEngine::default();
        let wobbly = |q: f32| {
            let size = if (0.6..0.8).contains(&q) { 500 } else { 1000 + (q * 4000.0) as usize };
            std::future::ready(Ok::<_, AppError>(vec![0u8; size]))
        };
        let outcome = engine.search(wobbly, 2500).await.unwrap();
        assert!(outcome.size() <= 2500);
        assert!(!outcome.fell_back);
    }

    #[test]
    fn lossless_formats_cannot_target_size() {
        assert!(QualitySearchEngine::check_format(OutputFormat::Jpeg).is_ok());
        let err = QualitySearchEngine::check_format(OutputFormat::Png).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedTargetForFormat(OutputFormat::Png)));
    }

    #[test]
    fn unreachable_threshold_is_ten_percent() {
        let outcome = |size: usize| SearchOutcome {
            blob: vec![0; size],
            quality: MIN_QUALITY,
            target_bytes: 1000,
            encodes: 1,
            fell_back: true,
        };
        assert!(!outcome(1100).target_unreachable());
        assert!(outcome(1101).target_unreachable());
    }
}
