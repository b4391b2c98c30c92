//! Fans record building out over a bounded worker pool.
//!
//! Workers finish in whatever order the scheduler likes. That order is thrown
//! away: survivors are sorted by [`ImageRecord::cmp_natural`] before anyone
//! sees them, which is what makes grouping independent of the worker count.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::TimestampPolicy;
use crate::error::{PipelineError, PipelineResult};
use crate::types::ImageRecord;

use super::code::SymbolReader;
use super::record::RecordBuilder;

/// An image that was left out of the batch, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything the dispatcher produced for one batch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Records in natural order
    pub records: Vec<ImageRecord>,
    /// Excluded images, sorted by path
    pub skipped: Vec<SkippedImage>,
}

/// Runs [`RecordBuilder::build`] over many paths on blocking worker threads.
pub struct ParallelDispatcher {
    workers: usize,
    policy: TimestampPolicy,
}

impl ParallelDispatcher {
    /// Create a dispatcher running at most `workers` builds at once.
    pub fn new(workers: usize, policy: TimestampPolicy) -> Self {
        Self {
            workers: workers.max(1),
            policy,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Build records for every path.
    pub async fn dispatch<R>(
        &self,
        builder: Arc<RecordBuilder<R>>,
        paths: Vec<PathBuf>,
    ) -> PipelineResult<DispatchReport>
    where
        R: SymbolReader + 'static,
    {
        self.dispatch_with(builder, paths, |_, _| {}).await
    }

    /// Build records for every path, calling `on_complete` as each image
    /// finishes (in completion order, with whether it produced a record).
    ///
    /// Under [`TimestampPolicy::Abort`] an image without a capture time fails
    /// the batch once every worker has finished; the error names the first
    /// such image in path order. There is no per-image timeout.
    pub async fn dispatch_with<R, F>(
        &self,
        builder: Arc<RecordBuilder<R>>,
        paths: Vec<PathBuf>,
        mut on_complete: F,
    ) -> PipelineResult<DispatchReport>
    where
        R: SymbolReader + 'static,
        F: FnMut(&Path, bool),
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for path in paths {
            let semaphore = semaphore.clone();
            let builder = builder.clone();
            let span = tracing::debug_span!("image", path = %path.display());

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let task_path = path.clone();
                        let joined = tokio::task::spawn_blocking(move || {
                            let _enter = span.enter();
                            let result = builder.build(&task_path);
                            drop(permit);
                            result
                        })
                        .await;
                        joined.unwrap_or_else(|e| {
                            Err(PipelineError::Worker {
                                path: path.clone(),
                                message: e.to_string(),
                            })
                        })
                    }
                    Err(e) => Err(PipelineError::Worker {
                        path: path.clone(),
                        message: e.to_string(),
                    }),
                };
                (path, result)
            });
        }

        let mut report = DispatchReport::default();
        let mut fatal: Vec<(PathBuf, PipelineError)> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (path, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!("Worker task failed: {e}");
                    continue;
                }
            };
            on_complete(&path, result.is_ok());

            match result {
                Ok(record) => report.records.push(record),
                Err(e) if e.is_recoverable() || self.policy == TimestampPolicy::Skip => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    report.skipped.push(SkippedImage {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    fatal.push((path, e));
                }
            }
        }

        if let Some((_, err)) = fatal.into_iter().min_by(|a, b| a.0.cmp(&b.0)) {
            return Err(err);
        }

        report.records.sort_by(ImageRecord::cmp_natural);
        report.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(report)
    }
}
