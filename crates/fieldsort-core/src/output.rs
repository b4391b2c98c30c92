//! Per-specimen summary output.
//!
//! One row per flushed group, in flush order. Tab-separated by default, with
//! JSON and JSON Lines for downstream tooling.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{SpecimenGroup, NOT_AVAILABLE};

/// Column names of the tab-separated summary.
pub const TSV_HEADER: [&str; 6] = [
    "ID",
    "Latitude",
    "Longitude",
    "Elevation",
    "DateTime",
    "NPhotos",
];

/// Summary format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    /// Header row plus one tab-separated row per group
    #[default]
    Tsv,
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl SummaryFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tsv" | "tab" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// One summary row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    pub datetime: Option<String>,
    pub n_photos: usize,
}

impl From<&SpecimenGroup> for SummaryRow {
    fn from(group: &SpecimenGroup) -> Self {
        let location = group.location();
        Self {
            id: group.code.to_string(),
            latitude: location.map(|l| l.latitude),
            longitude: location.map(|l| l.longitude),
            elevation: location.map(|l| l.elevation),
            datetime: group.captured_at().map(String::from),
            n_photos: group.len(),
        }
    }
}

impl SummaryRow {
    /// Tab-separated fields, absent values as `NA`.
    ///
    /// Tabs and line breaks inside text fields become spaces so every row
    /// keeps its six columns.
    pub fn to_tsv(&self) -> String {
        let num = |v: Option<f64>| v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string());
        [
            tsv_field(&self.id),
            num(self.latitude),
            num(self.longitude),
            num(self.elevation),
            self.datetime
                .as_deref()
                .map_or_else(|| NOT_AVAILABLE.to_string(), tsv_field),
            self.n_photos.to_string(),
        ]
        .join("\t")
    }
}

fn tsv_field(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}

/// Writes the per-group summary.
pub struct SummaryWriter<W: Write> {
    writer: W,
    format: SummaryFormat,
    rows_written: usize,
}

impl<W: Write> SummaryWriter<W> {
    /// Create a new summary writer.
    pub fn new(writer: W, format: SummaryFormat) -> Self {
        Self {
            writer,
            format,
            rows_written: 0,
        }
    }

    /// Write the summary for every group, in the order given.
    ///
    /// The TSV header is written even when there are no groups.
    pub fn write_all(&mut self, groups: &[SpecimenGroup]) -> io::Result<()> {
        let rows: Vec<SummaryRow> = groups.iter().map(SummaryRow::from).collect();

        match self.format {
            SummaryFormat::Tsv => {
                writeln!(self.writer, "{}", TSV_HEADER.join("\t"))?;
                for row in &rows {
                    writeln!(self.writer, "{}", row.to_tsv())?;
                }
            }
            SummaryFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, &rows).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            SummaryFormat::JsonLines => {
                for row in &rows {
                    serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
                    writeln!(self.writer)?;
                }
            }
        }
        self.rows_written += rows.len();
        Ok(())
    }

    /// Get the number of rows written.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
