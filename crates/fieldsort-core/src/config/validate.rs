//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::SummaryFormat;
use crate::relocate::Template;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if !(self.scan.min_area_fraction > 0.0 && self.scan.min_area_fraction <= 1.0) {
            return Err(ConfigError::ValidationError(
                "scan.min_area_fraction must be in (0.0, 1.0]".into(),
            ));
        }
        if !(self.scan.area_step > 0.0 && self.scan.area_step < 1.0) {
            return Err(ConfigError::ValidationError(
                "scan.area_step must be between 0.0 and 1.0 (exclusive)".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if Template::new(&self.output.template).is_none() {
            return Err(ConfigError::ValidationError(
                "output.template must not be empty".into(),
            ));
        }
        if SummaryFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be one of tsv, json, jsonl (got {:?})",
                self.output.format
            )));
        }
        Ok(())
    }
}
