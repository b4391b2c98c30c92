//! Builds one [`ImageRecord`] per image: validate, decode, read the code
//! card, read EXIF.

use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{Code, ImageRecord};

use super::code::{CodeDecoder, QrReader, SymbolReader};
use super::decode::ImageDecoder;
use super::metadata::MetadataExtractor;
use super::validate::Validator;

/// Turns a path into an [`ImageRecord`].
///
/// Holds no mutable state, so one builder is shared by every worker.
pub struct RecordBuilder<R = QrReader> {
    validator: Validator,
    decoder: ImageDecoder,
    codes: CodeDecoder<R>,
}

impl RecordBuilder<QrReader> {
    /// Create a builder using the QR reader.
    pub fn new(config: &Config) -> Self {
        Self::with_reader(config, QrReader)
    }
}

impl<R: SymbolReader> RecordBuilder<R> {
    /// Create a builder around a custom symbol reader.
    pub fn with_reader(config: &Config, reader: R) -> Self {
        Self {
            validator: Validator::new(config.limits.clone()),
            decoder: ImageDecoder::new(config.limits.clone()),
            codes: CodeDecoder::with_reader(reader, &config.scan),
        }
    }

    /// Build the record for one image.
    ///
    /// A missing or ambiguous code is not an error (the record gets
    /// `Code::Unknown`), nor is missing GPS. Unreadable images fail with a
    /// recoverable error; a missing capture time fails with
    /// [`PipelineError::MissingTimestamp`].
    pub fn build(&self, path: &Path) -> PipelineResult<ImageRecord> {
        let start = Instant::now();

        self.validator.check_file(path)?;
        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        })?;
        Validator::check_header(&bytes, path)?;

        let decoded = self.decoder.decode(&bytes, path)?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let code = Code::from(self.codes.decode(&decoded.image, path));
        tracing::trace!("  Scan: {:?}", start.elapsed());

        let metadata = MetadataExtractor::extract(&bytes, path)?;

        tracing::debug!(
            "Processed {:?} in {:?} ({}x{}, code {})",
            path,
            start.elapsed(),
            decoded.width,
            decoded.height,
            code
        );

        Ok(ImageRecord {
            path: path.to_path_buf(),
            code,
            captured_at: metadata.captured_at,
            location: metadata.location,
        })
    }
}
