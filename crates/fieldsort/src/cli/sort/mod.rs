//! The `fieldsort sort` command.

mod report;
mod setup;
pub mod types;

pub use types::SummaryFormatArg;

use clap::Args;
use fieldsort_core::{Config, FieldSort};
use std::path::PathBuf;

/// Arguments for the `sort` command.
#[derive(Args, Debug, Default)]
pub struct SortArgs {
    /// Image files or directories to sort
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Number of parallel workers [default: config, else all cores]
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Copy photos to their new names
    #[arg(short, long, conflicts_with = "move_files")]
    pub copy: bool,

    /// Move photos to their new names
    #[arg(short = 'm', long = "move")]
    pub move_files: bool,

    /// Write a per-specimen summary to this file
    #[arg(short = 'o', long = "metadata", value_name = "PATH")]
    pub metadata: Option<PathBuf>,

    /// Summary format [default: config, else tsv]
    #[arg(short, long, value_enum)]
    pub format: Option<SummaryFormatArg>,

    /// Naming template with {ID}, {FN} and {EXT} placeholders
    /// [default: config, else "{ID}_{FN}.{EXT}"]
    #[arg(short, long)]
    pub template: Option<String>,

    /// Skip photos without a capture timestamp instead of stopping
    #[arg(long)]
    pub skip_undated: bool,
}

/// Execute the sort command.
pub async fn execute(args: SortArgs, mut config: Config) -> anyhow::Result<()> {
    let options = setup::prepare(&args, &mut config)?;
    let sorter = FieldSort::new(config);

    let paths = sorter.discover(&args.inputs);
    if paths.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.inputs);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to sort", paths.len());

    let progress = report::create_progress_bar(paths.len() as u64);
    let mut failed = 0u64;
    let identified = sorter
        .identify_with(paths, |_, ok| {
            if !ok {
                failed += 1;
                progress.set_message(format!("{failed} skipped"));
            }
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();
    let batch = identified?;

    let result = sorter.finish(&batch, &options, std::io::stdout().lock())?;
    if let Some(path) = &options.summary_path {
        tracing::info!("Summary written to {:?}", path);
    }

    report::print_summary(&batch, &result, options.mode);
    Ok(())
}
