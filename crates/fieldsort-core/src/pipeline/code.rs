//! QR code decoding with a downscaling retry series.
//!
//! Small or skewed cards often fail at full resolution and read fine once
//! resampled down, so when nothing is found the image is retried at
//! progressively smaller areas. Seeing more than one code in a frame is an
//! operator error and is never resolved by guessing.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use rqrr::PreparedImage;
use std::path::Path;

use crate::config::ScanConfig;

/// Reads every symbol it can find in a greyscale raster.
///
/// The decoder only cares about how many symbols come back, which keeps the
/// retry policy testable without real QR imagery.
pub trait SymbolReader: Send + Sync {
    fn read(&self, image: &GrayImage) -> Vec<String>;
}

/// Production reader backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrReader;

impl SymbolReader for QrReader {
    fn read(&self, image: &GrayImage) -> Vec<String> {
        let (w, h) = image.dimensions();
        let mut prepared = PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            image.get_pixel(x as u32, y as u32)[0]
        });
        prepared
            .detect_grids()
            .into_iter()
            .filter_map(|grid| grid.decode().ok().map(|(_, text)| text))
            .collect()
    }
}

/// One attempt in the series. Only used for tracing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanAttempt {
    /// Linear scale factor applied to both dimensions
    pub scale: f64,
    /// Codes read at this scale
    pub codes: Vec<String>,
}

/// Result of scanning one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Exactly one code at some scale
    Found(String),
    /// Series exhausted without a code
    NotFound,
    /// More than one code at a single scale; carries how many
    Ambiguous(usize),
}

impl ScanOutcome {
    pub fn into_code(self) -> Option<String> {
        match self {
            Self::Found(code) => Some(code),
            Self::NotFound | Self::Ambiguous(_) => None,
        }
    }
}

/// Scans an image for a single code, retrying at reduced resolutions.
pub struct CodeDecoder<R = QrReader> {
    reader: R,
    scales: Vec<f64>,
}

impl CodeDecoder<QrReader> {
    /// Create a decoder using the QR reader.
    pub fn new(config: &ScanConfig) -> Self {
        Self::with_reader(QrReader, config)
    }
}

impl<R: SymbolReader> CodeDecoder<R> {
    /// Create a decoder around a custom symbol reader.
    pub fn with_reader(reader: R, config: &ScanConfig) -> Self {
        Self {
            reader,
            scales: scale_series(config.min_area_fraction, config.area_step),
        }
    }

    /// Linear scale factors tried, largest first.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Scan `image`, stopping at the first scale that yields one code or
    /// more than one.
    pub fn scan(&self, image: &DynamicImage) -> ScanOutcome {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();

        for &scale in &self.scales {
            let attempt = ScanAttempt {
                scale,
                codes: self.read_at(&luma, width, height, scale),
            };
            tracing::trace!("  scan x{:.3}: {} code(s)", attempt.scale, attempt.codes.len());

            match attempt.codes.len() {
                0 => continue,
                1 => {
                    let code = attempt.codes.into_iter().next().unwrap_or_default();
                    return ScanOutcome::Found(code);
                }
                n => return ScanOutcome::Ambiguous(n),
            }
        }

        ScanOutcome::NotFound
    }

    /// Scan and collapse the outcome to an optional code, warning about
    /// ambiguous frames.
    pub fn decode(&self, image: &DynamicImage, path: &Path) -> Option<String> {
        match self.scan(image) {
            ScanOutcome::Found(code) => {
                tracing::debug!("Decoded {:?} from {:?}", code, path);
                Some(code)
            }
            ScanOutcome::Ambiguous(n) => {
                tracing::warn!(
                    "{} codes found in {:?}; treating it as uncoded. Photograph one card at a time.",
                    n,
                    path
                );
                None
            }
            ScanOutcome::NotFound => None,
        }
    }

    fn read_at(&self, luma: &GrayImage, width: u32, height: u32, scale: f64) -> Vec<String> {
        if scale >= 1.0 {
            return self.reader.read(luma);
        }
        let w = ((width as f64 * scale).round() as u32).max(1);
        let h = ((height as f64 * scale).round() as u32).max(1);
        let resized = imageops::resize(luma, w, h, FilterType::Triangle);
        self.reader.read(&resized)
    }
}

/// Linear scale factors whose areas form a geometric series from 1.0 down to
/// `min_area` with ratio `area_step`.
///
/// The series always ends exactly at `min_area`, even when the step
/// overshoots it. With the defaults (0.01, 0.5) this yields 1.0, 0.707,
/// 0.5, ... 0.125, 0.1.
pub fn scale_series(min_area: f64, area_step: f64) -> Vec<f64> {
    // A step outside (0, 1) would never terminate.
    if !(area_step > 0.0 && area_step < 1.0) || min_area <= 0.0 {
        return vec![1.0];
    }
    let mut scales = Vec::new();
    let mut area = 1.0_f64;
    let mut last = area;
    while area >= min_area - f64::EPSILON {
        scales.push(area.sqrt());
        last = area;
        area *= area_step;
    }
    if last > min_area + f64::EPSILON {
        scales.push(min_area.sqrt());
    }
    scales
}
