//! Fieldsort Core - sorts field photographs into specimen groups.
//!
//! Collectors photograph a code card (a QR code naming the specimen) and
//! then the specimen itself, any number of times. Fieldsort reads the card
//! photos, attributes every following photo to the most recent card, and
//! renames or copies the batch accordingly.
//!
//! # Architecture
//!
//! ```text
//! Paths → Validate → Decode → Code scan → EXIF  (parallel, per image)
//!       → Sort by path → Group → Summary → Copy/Move/Dry run
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use fieldsort_core::{Config, FieldSort, SortOptions};
//!
//! #[tokio::main]
//! async fn main() -> fieldsort_core::Result<()> {
//!     let config = Config::load()?;
//!     let options = SortOptions::from_config(&config);
//!     let sorter = FieldSort::new(config);
//!
//!     let report = sorter.run(&["./photos".into()], &options, std::io::stdout()).await?;
//!     println!("{} groups", report.groups);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod grouping;
pub mod output;
pub mod pipeline;
pub mod relocate;
pub mod sort;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-exports for convenient access
pub use config::{Config, TimestampPolicy};
pub use error::{ConfigError, FieldsortError, PipelineError, PipelineResult, Result};
pub use grouping::{capture_order_warnings, group_records, CaptureOrderWarning};
pub use output::{SummaryFormat, SummaryRow, SummaryWriter};
pub use relocate::{Relocation, RelocationExecutor, RelocationMode, Template};
pub use sort::{FieldSort, IdentifiedBatch, SortOptions, SortReport};
pub use types::{Code, GeoLocation, ImageRecord, SpecimenGroup};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
