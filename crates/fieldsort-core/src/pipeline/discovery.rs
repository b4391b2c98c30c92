//! Expands input arguments into the list of images to process.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers image files from files and directories given on the command line.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Expand inputs into a sorted, de-duplicated list of paths.
    ///
    /// Files are taken as given, whatever their extension, so a missing or
    /// unreadable file is reported by the pipeline rather than silently
    /// dropped here. Directories are walked recursively for supported
    /// extensions.
    pub fn discover(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                files.extend(
                    WalkDir::new(input)
                        .follow_links(true)
                        .into_iter()
                        .filter_map(|e| e.ok())
                        .filter(|e| e.file_type().is_file() && self.is_supported(e.path()))
                        .map(|e| e.into_path()),
                );
            } else {
                files.push(input.clone());
            }
        }

        files.sort();
        files.dedup();
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
    }
}
