//! Per-image identification stages.
//!
//! - **discovery**: Expand files and directories into image paths
//! - **validate**: Existence, size and magic-byte checks before decoding
//! - **decode**: Load the raster
//! - **code**: Find the specimen code card at decreasing scales
//! - **metadata**: Capture time and GPS position from EXIF
//! - **record**: Runs the stages above for one image
//! - **dispatch**: Runs records for a batch on a bounded worker pool

pub mod code;
pub mod decode;
pub mod discovery;
pub mod dispatch;
pub mod metadata;
pub mod record;
pub mod validate;

// Re-exports for convenient access
pub use code::{CodeDecoder, QrReader, ScanOutcome, SymbolReader};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::FileDiscovery;
pub use dispatch::{DispatchReport, ParallelDispatcher, SkippedImage};
pub use metadata::{CaptureMetadata, MetadataExtractor};
pub use record::RecordBuilder;
pub use validate::Validator;
