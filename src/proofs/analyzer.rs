//! Proof-image verdicts.
//!
//! An image passes when the device clock it shows is close to the server
//! clock and the screen is not dominated by the blue "unlocked" banner that
//! the device-management app shows when protection is switched off.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{sync::Arc, time::Duration};

use super::TextRecognizer;
use crate::models::Verdict;

/// Hue band on the 0..180 scale, inclusive.
const HUE_MIN: f32 = 100.0;
const HUE_MAX: f32 = 130.0;
const MIN_SATURATION: f32 = 50.0;
const MIN_VALUE: u8 = 50;

/// Fraction of band pixels at which the image counts as a violation.
pub const VIOLATION_FRACTION: f64 = 0.30;

/// Largest accepted distance between the shown time and now.
pub const MAX_CLOCK_SKEW_MS: i64 = 300_000;

static TIMESTAMP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[-./](\d{1,2})[-./](\d{1,2})\s+(\d{1,2}):(\d{2})(?::(\d{2}))?")
        .expect("timestamp pattern must compile")
});

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("text recognition failed: {0}")]
    Recognizer(String),

    #[error("recognizer io: {0}")]
    Io(#[from] std::io::Error),

    #[error("unparseable timestamp: {0}")]
    Timestamp(String),

    #[error("analysis task failed: {0}")]
    Task(String),
}

/// Turns a proof image into a verdict. Never fails; any analysis error
/// yields [`Verdict::fail_closed`].
#[async_trait]
pub trait ProofAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8], now: DateTime<FixedOffset>) -> Verdict;
}

pub struct HsvOcrAnalyzer {
    recognizer: Arc<dyn TextRecognizer>,
    timeout: Duration,
}

impl HsvOcrAnalyzer {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, timeout: Duration) -> Self {
        Self { recognizer, timeout }
    }

    async fn try_analyze(&self, image: &[u8], now: DateTime<FixedOffset>) -> Result<Verdict, AnalysisError> {
        let bytes = image.to_vec();
        let fraction = tokio::task::spawn_blocking(move || unlocked_fraction(&bytes))
            .await
            .map_err(|e| AnalysisError::Task(e.to_string()))??;

        let text = self.recognizer.recognize(image).await?;
        let detected_time = find_timestamp(&text, *now.offset())?;

        Ok(Verdict {
            is_valid_time: detected_time.map(|t| within_skew(t, now)).unwrap_or(false),
            detected_time,
            is_security_violation: fraction >= VIOLATION_FRACTION,
        })
    }
}

#[async_trait]
impl ProofAnalyzer for HsvOcrAnalyzer {
    async fn analyze(&self, image: &[u8], now: DateTime<FixedOffset>) -> Verdict {
        match tokio::time::timeout(self.timeout, self.try_analyze(image, now)).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Proof analysis failed, treating as violation");
                Verdict::fail_closed()
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Proof analysis timed out, treating as violation");
                Verdict::fail_closed()
            }
        }
    }
}

fn within_skew(detected: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
    (detected - now).num_milliseconds().abs() <= MAX_CLOCK_SKEW_MS
}

/// Share of pixels inside the unlocked-banner color band.
pub fn unlocked_fraction(bytes: &[u8]) -> Result<f64, AnalysisError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let total = rgb.width() as u64 * rgb.height() as u64;
    if total == 0 {
        return Err(AnalysisError::EmptyImage);
    }

    let hits = rgb
        .pixels()
        .filter(|p| in_unlocked_band(p.0[0], p.0[1], p.0[2]))
        .count() as u64;

    Ok(hits as f64 / total as f64)
}

/// HSV band test using the 8-bit conventions (H in 0..180, S and V in 0..255).
fn in_unlocked_band(r: u8, g: u8, b: u8) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max < MIN_VALUE {
        return false;
    }

    let delta = (max - min) as f32;
    if delta * 255.0 / (max as f32) < MIN_SATURATION {
        return false;
    }

    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let degrees = if max == r {
        60.0 * (gf - bf) / delta
    } else if max == g {
        60.0 * (bf - rf) / delta + 120.0
    } else {
        60.0 * (rf - gf) / delta + 240.0
    };
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };

    let hue = (degrees / 2.0).round();
    (HUE_MIN..=HUE_MAX).contains(&hue)
}

/// First `YYYY-M-D HH:MM[:SS]` timestamp in `text`, read as local time at `offset`.
pub fn find_timestamp(text: &str, offset: FixedOffset) -> Result<Option<DateTime<FixedOffset>>, AnalysisError> {
    let Some(caps) = TIMESTAMP_PATTERN.captures(text) else {
        return Ok(None);
    };

    let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
    let invalid = || AnalysisError::Timestamp(matched.to_string());
    let field = |i: usize| -> Result<u32, AnalysisError> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().map_err(|_| invalid()),
            None => Ok(0),
        }
    };

    let year = i32::try_from(field(1)?).map_err(|_| invalid())?;
    let naive = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)
        .and_then(|d| d.and_hms_opt(field(4).ok()?, field(5).ok()?, field(6).ok()?))
        .ok_or_else(invalid)?;

    offset.from_local_datetime(&naive).single().map(Some).ok_or_else(invalid)
}

#[cfg(test)]
pub use double::FixedVerdict;
