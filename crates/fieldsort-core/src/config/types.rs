//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Default relocation template: `<code>_<stem>.<ext>`.
pub const DEFAULT_TEMPLATE: &str = "{ID}_{FN}.{EXT}";

/// What to do with an image that has no original capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Stop the whole batch before anything is grouped or relocated
    #[default]
    Abort,
    /// Drop the image like an unreadable one
    Skip,
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers
    pub parallel_workers: usize,

    /// Supported input formats (used when walking directories)
    pub supported_formats: Vec<String>,

    /// Handling of images without a capture timestamp
    pub missing_timestamp: TimestampPolicy,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: default_workers(),
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "tif".to_string(),
                "tiff".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
            missing_timestamp: TimestampPolicy::default(),
        }
    }
}

/// Host parallelism, falling back to a single worker when it can't be queried.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// QR scan settings: the downscaling series tried when nothing is found.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Smallest image area, as a fraction of the original, still attempted
    pub min_area_fraction: f64,

    /// Ratio between the areas of consecutive attempts
    pub area_step: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_area_fraction: 0.01,
            area_step: 0.5,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 200,
            max_image_dimension: 20000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination template with `{ID}`, `{FN}` and `{EXT}` placeholders
    pub template: String,

    /// Summary format ("tsv", "json" or "jsonl")
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            format: "tsv".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
