//! The batch entry point: identify every photo, group, then write the summary
//! and relocate.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::config::Config;
use crate::error::{PipelineResult, Result};
use crate::grouping::{capture_order_warnings, group_records, CaptureOrderWarning};
use crate::output::{SummaryFormat, SummaryWriter};
use crate::pipeline::{
    FileDiscovery, ParallelDispatcher, QrReader, RecordBuilder, SkippedImage, SymbolReader,
};
use crate::relocate::{plan_relocations, RelocationExecutor, RelocationMode, Template};
use crate::types::SpecimenGroup;

/// What to do once the batch has been grouped.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    pub mode: RelocationMode,
    pub template: Template,
    /// Summary destination; `None` writes no summary
    pub summary_path: Option<PathBuf>,
    pub summary_format: SummaryFormat,
}

impl SortOptions {
    /// Options from the `[output]` section: dry run, no summary.
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: RelocationMode::DryRun,
            template: Template::new(&config.output.template).unwrap_or_default(),
            summary_path: None,
            summary_format: SummaryFormat::parse(&config.output.format).unwrap_or_default(),
        }
    }
}

/// A batch after identification and grouping.
#[derive(Debug, Default)]
pub struct IdentifiedBatch {
    /// Groups in flush order
    pub groups: Vec<SpecimenGroup>,
    pub skipped: Vec<SkippedImage>,
    pub capture_order: Vec<CaptureOrderWarning>,
    pub elapsed: Duration,
}

impl IdentifiedBatch {
    /// Number of images that made it into a group.
    pub fn image_count(&self) -> usize {
        self.groups.iter().map(SpecimenGroup::len).sum()
    }

    /// Number of groups opened by a code card.
    pub fn coded_groups(&self) -> usize {
        self.groups.iter().filter(|g| g.code.is_known()).count()
    }
}

/// Outcome of [`FieldSort::finish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortReport {
    pub groups: usize,
    pub images: usize,
    pub skipped: usize,
    pub relocated: usize,
    pub summary_rows: usize,
}

/// Sorts field photos into specimen groups.
pub struct FieldSort<R = QrReader> {
    config: Config,
    discovery: FileDiscovery,
    builder: Arc<RecordBuilder<R>>,
}

impl FieldSort<QrReader> {
    pub fn new(config: Config) -> Self {
        Self::with_reader(config, QrReader)
    }
}

impl<R: SymbolReader + 'static> FieldSort<R> {
    /// Create a sorter that reads code cards with `reader`.
    pub fn with_reader(config: Config, reader: R) -> Self {
        tracing::debug!("Initializing fieldsort v{}", crate::VERSION);
        Self {
            discovery: FileDiscovery::new(config.processing.clone()),
            builder: Arc::new(RecordBuilder::with_reader(&config, reader)),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Expand the given files and directories into a sorted list of images.
    pub fn discover(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        self.discovery.discover(inputs)
    }

    /// Identify and group `paths`.
    pub async fn identify(&self, paths: Vec<PathBuf>) -> PipelineResult<IdentifiedBatch> {
        self.identify_with(paths, |_, _| {}).await
    }

    /// Identify and group `paths`, calling `on_complete` as each image
    /// finishes.
    ///
    /// Nothing has been written when this fails.
    pub async fn identify_with<F>(
        &self,
        paths: Vec<PathBuf>,
        on_complete: F,
    ) -> PipelineResult<IdentifiedBatch>
    where
        F: FnMut(&Path, bool),
    {
        let span = tracing::info_span!("sort", images = paths.len());
        async move {
            let start = Instant::now();
            let dispatcher = ParallelDispatcher::new(
                self.config.processing.parallel_workers,
                self.config.processing.missing_timestamp,
            );
            tracing::debug!("Dispatching with {} workers", dispatcher.workers());

            let report = dispatcher
                .dispatch_with(self.builder.clone(), paths, on_complete)
                .await?;

            let groups = group_records(report.records);
            let capture_order = capture_order_warnings(&groups);
            for w in &capture_order {
                tracing::warn!(
                    "{:?} ({}) was taken before card {} ({}); check the file order",
                    w.path,
                    w.captured_at,
                    w.code,
                    w.card_captured_at
                );
            }

            let batch = IdentifiedBatch {
                groups,
                skipped: report.skipped,
                capture_order,
                elapsed: start.elapsed(),
            };
            tracing::info!(
                "Identified {} images in {} groups ({} skipped) in {:?}",
                batch.image_count(),
                batch.groups.len(),
                batch.skipped.len(),
                batch.elapsed
            );
            Ok(batch)
        }
        .instrument(span)
        .await
    }

    /// Write the summary (if requested), then relocate every grouped image.
    ///
    /// Dry-run lines go to `report`. Destinations are planned first, so a
    /// template that maps two photos to one file fails before anything is
    /// written.
    pub fn finish<W: Write>(
        &self,
        batch: &IdentifiedBatch,
        options: &SortOptions,
        report: W,
    ) -> Result<SortReport> {
        let plan = plan_relocations(&batch.groups, &options.template)?;

        let summary_rows = match &options.summary_path {
            Some(path) => write_summary(path, options.summary_format, &batch.groups)?,
            None => 0,
        };

        let relocated = RelocationExecutor::new(options.mode, report).execute(&plan)?;
        tracing::info!("{:?}: {} of {} files", options.mode, relocated, plan.len());

        Ok(SortReport {
            groups: batch.groups.len(),
            images: batch.image_count(),
            skipped: batch.skipped.len(),
            relocated,
            summary_rows,
        })
    }

    /// Discover, identify, and finish in one call.
    pub async fn run<W: Write>(
        &self,
        inputs: &[PathBuf],
        options: &SortOptions,
        report: W,
    ) -> Result<SortReport> {
        let paths = self.discover(inputs);
        let batch = self.identify(paths).await?;
        self.finish(&batch, options, report)
    }
}

fn write_summary(path: &Path, format: SummaryFormat, groups: &[SpecimenGroup]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = SummaryWriter::new(BufWriter::new(File::create(path)?), format);
    writer.write_all(groups)?;
    writer.flush()?;
    tracing::debug!("Wrote {} summary rows to {:?}", writer.rows_written(), path);
    Ok(writer.rows_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimestampPolicy;
    use crate::fixtures::{write_photo, CardReader, ExifSpec, GpsSpec};
    use crate::types::Code;
    use crate::{FieldsortError, PipelineError};

    fn sorter(workers: usize) -> FieldSort<CardReader> {
        let mut config = Config::default();
        config.processing.parallel_workers = workers;
        FieldSort::with_reader(config, CardReader)
    }

    fn ts(minute: u32) -> ExifSpec {
        ExifSpec::dated(format!("2023:06:01 10:{minute:02}:00"))
    }

    /// a.jpg (no card), b.jpg (card S64 with GPS), c.jpg (no card)
    fn abc(dir: &Path) {
        write_photo(dir, "a.jpg", None, &ts(0));
        let spec = ExifSpec {
            captured_at: Some("2023:06:01 10:01:00".into()),
            gps: Some(GpsSpec::new((46, 1), (30, 1), "N", (7, 1), (15, 1), "W", (1500, 1))),
        };
        write_photo(dir, "b.jpg", Some(64), &spec);
        write_photo(dir, "c.jpg", None, &ts(2));
    }

    fn options(mode: RelocationMode, template: String, summary: Option<PathBuf>) -> SortOptions {
        SortOptions {
            mode,
            template: Template::new(&template).unwrap(),
            summary_path: summary,
            summary_format: SummaryFormat::Tsv,
        }
    }

    #[tokio::test]
    async fn test_card_then_follower_scenario() {
        let photos = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        abc(photos.path());

        let fs = sorter(4);
        let batch = fs
            .identify(fs.discover(&[photos.path().to_path_buf()]))
            .await
            .unwrap();

        assert_eq!(batch.groups.len(), 2);
        assert_eq!(batch.coded_groups(), 1);
        let coded = &batch.groups[1];
        assert_eq!(coded.code, Code::Known("S64".into()));
        assert_eq!(
            coded.members.iter().map(|m| m.stem()).collect::<Vec<_>>(),
            vec!["b", "c"]
        );

        let summary = out.path().join("summary.tsv");
        let template = format!("{}/{{ID}}_{{FN}}.{{EXT}}", out.path().display());
        let report = fs
            .finish(
                &batch,
                &options(RelocationMode::Copy, template, Some(summary.clone())),
                std::io::sink(),
            )
            .unwrap();

        assert_eq!(report.images, 3);
        assert_eq!(report.relocated, 3);
        assert_eq!(report.summary_rows, 2);

        let text = std::fs::read_to_string(&summary).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "unknown\tNA\tNA\tNA\tNA\t1");
        assert_eq!(lines[2], "S64\t46.5\t-7.25\t1500\t2023:06:01 10:01:00\t2");

        assert!(out.path().join("unknown_a.jpg").exists());
        assert!(out.path().join("S64_b.jpg").exists());
        assert!(out.path().join("S64_c.jpg").exists());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_excluded() {
        let photos = tempfile::tempdir().unwrap();
        abc(photos.path());
        std::fs::write(photos.path().join("b2.jpg"), b"\xFF\xD8\xFF garbage").unwrap();

        let fs = sorter(2);
        let batch = fs
            .identify(fs.discover(&[photos.path().to_path_buf()]))
            .await
            .unwrap();

        assert_eq!(batch.image_count(), 3);
        assert_eq!(batch.skipped.len(), 1);
        assert!(batch.skipped[0].path.ends_with("b2.jpg"));
        assert_eq!(batch.groups[1].len(), 2);
    }

    #[tokio::test]
    async fn test_worker_count_is_invisible_in_outputs() {
        let photos = tempfile::tempdir().unwrap();
        for i in 0..16u32 {
            let card = (i % 5 == 2).then_some(60 + i);
            write_photo(photos.path(), &format!("P{i:03}.jpg"), card, &ts(i));
        }
        let inputs = [photos.path().to_path_buf()];

        let mut outputs = Vec::new();
        for workers in [1, 8] {
            let out = tempfile::tempdir().unwrap();
            let summary = out.path().join("s.tsv");
            let fs = sorter(workers);
            let batch = fs.identify(fs.discover(&inputs)).await.unwrap();

            let mut dry_run = Vec::new();
            fs.finish(
                &batch,
                &options(
                    RelocationMode::DryRun,
                    "sorted/{ID}/{FN}.{EXT}".into(),
                    Some(summary.clone()),
                ),
                &mut dry_run,
            )
            .unwrap();

            outputs.push((
                batch.groups,
                std::fs::read_to_string(summary).unwrap(),
                String::from_utf8(dry_run).unwrap(),
            ));
        }

        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0].0.len(), 4);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_touching_files() {
        let photos = tempfile::tempdir().unwrap();
        abc(photos.path());
        let target = photos.path().join("sorted");
        let template = format!("{}/{{ID}}/{{FN}}.{{EXT}}", target.display());

        let mut lines = Vec::new();
        let report = sorter(2)
            .run(
                &[photos.path().to_path_buf()],
                &options(RelocationMode::DryRun, template, None),
                &mut lines,
            )
            .await
            .unwrap();

        assert_eq!(report.relocated, 3);
        assert_eq!(report.summary_rows, 0);
        assert!(!target.exists());
        assert!(String::from_utf8(lines).unwrap().contains("S64/c.jpg"));
    }

    #[tokio::test]
    async fn test_move_into_directories() {
        let photos = tempfile::tempdir().unwrap();
        abc(photos.path());
        let out = tempfile::tempdir().unwrap();
        let template = format!("{}/{{ID}}/{{FN}}.{{EXT}}", out.path().display());

        sorter(3)
            .run(
                &[photos.path().to_path_buf()],
                &options(RelocationMode::Move, template, None),
                std::io::sink(),
            )
            .await
            .unwrap();

        assert!(!photos.path().join("b.jpg").exists());
        assert!(out.path().join("S64/b.jpg").exists());
        assert!(out.path().join("S64/c.jpg").exists());
        assert!(out.path().join("unknown/a.jpg").exists());
    }

    #[tokio::test]
    async fn test_undated_photo_aborts_before_anything_is_written() {
        let photos = tempfile::tempdir().unwrap();
        abc(photos.path());
        let undated = ExifSpec {
            captured_at: None,
            gps: None,
        };
        write_photo(photos.path(), "d.jpg", None, &undated);
        let out = tempfile::tempdir().unwrap();
        let summary = out.path().join("s.tsv");
        let template = format!("{}/{{ID}}_{{FN}}.{{EXT}}", out.path().display());

        let err = sorter(2)
            .run(
                &[photos.path().to_path_buf()],
                &options(RelocationMode::Copy, template, Some(summary.clone())),
                std::io::sink(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FieldsortError::Pipeline(_)));
        assert!(err.to_string().contains("d.jpg"));
        assert!(!summary.exists());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_clashing_destinations_abort_before_moving() {
        let photos = tempfile::tempdir().unwrap();
        for folder in ["100CANON", "101CANON"] {
            std::fs::create_dir(photos.path().join(folder)).unwrap();
        }
        write_photo(&photos.path().join("100CANON"), "IMG_0000.jpg", Some(64), &ts(0));
        write_photo(&photos.path().join("100CANON"), "IMG_0001.jpg", None, &ts(1));
        write_photo(&photos.path().join("101CANON"), "IMG_0001.jpg", None, &ts(2));
        let out = tempfile::tempdir().unwrap();
        let summary = out.path().join("s.tsv");
        let template = format!("{}/{{ID}}_{{FN}}.{{EXT}}", out.path().display());

        let err = sorter(2)
            .run(
                &[photos.path().to_path_buf()],
                &options(RelocationMode::Move, template, Some(summary.clone())),
                std::io::sink(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FieldsortError::Pipeline(PipelineError::DestinationConflict { .. })
        ));
        assert!(photos.path().join("100CANON/IMG_0001.jpg").exists());
        assert!(photos.path().join("101CANON/IMG_0001.jpg").exists());
        assert!(!summary.exists());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_undated_photo_skipped_when_configured() {
        let photos = tempfile::tempdir().unwrap();
        abc(photos.path());
        let undated = ExifSpec {
            captured_at: None,
            gps: None,
        };
        write_photo(photos.path(), "d.jpg", None, &undated);

        let mut config = Config::default();
        config.processing.missing_timestamp = TimestampPolicy::Skip;
        let fs = FieldSort::with_reader(config, CardReader);
        let batch = fs
            .identify(fs.discover(&[photos.path().to_path_buf()]))
            .await
            .unwrap();

        assert_eq!(batch.image_count(), 3);
        assert_eq!(batch.skipped.len(), 1);
    }

    #[tokio::test]
    async fn test_capture_order_warnings_surface_in_batch() {
        let photos = tempfile::tempdir().unwrap();
        write_photo(photos.path(), "01.jpg", Some(64), &ts(30));
        write_photo(photos.path(), "02.jpg", None, &ts(10));

        let fs = sorter(2);
        let batch = fs
            .identify(fs.discover(&[photos.path().to_path_buf()]))
            .await
            .unwrap();

        assert_eq!(batch.groups.len(), 1);
        assert_eq!(batch.capture_order.len(), 1);
        assert!(batch.capture_order[0].path.ends_with("02.jpg"));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.output.format = "jsonl".into();
        let options = SortOptions::from_config(&config);
        assert_eq!(options.mode, RelocationMode::DryRun);
        assert_eq!(options.summary_format, SummaryFormat::JsonLines);
        assert_eq!(options.template, Template::default());
    }
}
