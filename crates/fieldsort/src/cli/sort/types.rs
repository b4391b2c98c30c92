//! CLI enum types for the sort command.

use clap::ValueEnum;
use fieldsort_core::SummaryFormat;

/// Summary file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormatArg {
    /// Tab-separated, one row per specimen
    Tsv,
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<SummaryFormatArg> for SummaryFormat {
    fn from(arg: SummaryFormatArg) -> Self {
        match arg {
            SummaryFormatArg::Tsv => SummaryFormat::Tsv,
            SummaryFormatArg::Json => SummaryFormat::Json,
            SummaryFormatArg::Jsonl => SummaryFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for SummaryFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryFormatArg::Tsv => write!(f, "tsv"),
            SummaryFormatArg::Json => write!(f, "json"),
            SummaryFormatArg::Jsonl => write!(f, "jsonl"),
        }
    }
}
