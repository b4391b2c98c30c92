//! Destination naming and the copy / move / dry-run step.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::types::SpecimenGroup;

/// Destination template with `{ID}`, `{FN}` and `{EXT}` placeholders.
///
/// Unrecognized `{...}` sequences are kept literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    /// Returns `None` for a blank template.
    pub fn new(template: &str) -> Option<Self> {
        (!template.trim().is_empty()).then(|| Self(template.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute the placeholders in a single pass (substituted text is
    /// never re-scanned), then expand a leading `~`.
    pub fn render(&self, id: &str, stem: &str, ext: &str) -> PathBuf {
        let mut out = String::with_capacity(self.0.len() + id.len() + stem.len());
        let mut rest = self.0.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let (value, len) = if tail.starts_with("{ID}") {
                (id, 4)
            } else if tail.starts_with("{FN}") {
                (stem, 4)
            } else if tail.starts_with("{EXT}") {
                (ext, 5)
            } else {
                ("{", 1)
            };
            out.push_str(value);
            rest = &tail[len..];
        }
        out.push_str(rest);

        PathBuf::from(shellexpand::tilde(&out).into_owned())
    }
}

impl Default for Template {
    fn default() -> Self {
        Self(crate::config::DEFAULT_TEMPLATE.to_string())
    }
}

/// What to do with each source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelocationMode {
    Copy,
    Move,
    /// Print what would happen and touch nothing
    #[default]
    DryRun,
}

impl RelocationMode {
    /// Copy wins if both flags are somehow set.
    pub fn from_flags(copy: bool, move_files: bool) -> Self {
        match (copy, move_files) {
            (true, _) => Self::Copy,
            (false, true) => Self::Move,
            (false, false) => Self::DryRun,
        }
    }
}

/// A source and its template-derived destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Compute destinations for every member of every group.
///
/// Fails if two sources would land on the same destination, which happens
/// with the default template when card folders reuse file names
/// (`100CANON/IMG_0001.jpg` and `101CANON/IMG_0001.jpg`).
pub fn plan_relocations(
    groups: &[SpecimenGroup],
    template: &Template,
) -> PipelineResult<Vec<Relocation>> {
    let plan: Vec<Relocation> = groups
        .iter()
        .flat_map(|group| {
            let id = group.code.as_str();
            group.members.iter().map(move |m| Relocation {
                from: m.path.clone(),
                to: template.render(id, m.stem(), m.extension()),
            })
        })
        .collect();

    let mut claimed: HashMap<&Path, &Path> = HashMap::with_capacity(plan.len());
    for Relocation { from, to } in &plan {
        if let Some(first) = claimed.insert(to.as_path(), from.as_path()) {
            return Err(PipelineError::DestinationConflict {
                first: first.to_path_buf(),
                second: from.clone(),
                to: to.clone(),
            });
        }
    }
    Ok(plan)
}

/// Carries out a relocation plan.
///
/// Dry-run lines go to `report`; copy and move create missing destination
/// directories and never replace an existing file.
pub struct RelocationExecutor<W: Write> {
    mode: RelocationMode,
    report: W,
}

impl<W: Write> RelocationExecutor<W> {
    pub fn new(mode: RelocationMode, report: W) -> Self {
        Self { mode, report }
    }

    pub fn mode(&self) -> RelocationMode {
        self.mode
    }

    /// Apply every relocation, stopping at the first failure.
    ///
    /// Returns how many files were copied or moved (or would be, for a dry
    /// run).
    pub fn execute(&mut self, plan: &[Relocation]) -> PipelineResult<usize> {
        let mut done = 0;
        for relocation in plan {
            if self.apply(relocation)? {
                done += 1;
            }
        }
        Ok(done)
    }

    fn apply(&mut self, Relocation { from, to }: &Relocation) -> PipelineResult<bool> {
        let fail = |source: std::io::Error| PipelineError::Relocation {
            from: from.clone(),
            to: to.clone(),
            source,
        };

        if self.mode == RelocationMode::DryRun {
            writeln!(self.report, "{} -> {}", from.display(), to.display()).map_err(fail)?;
            return Ok(true);
        }

        if is_same_file(from, to) {
            tracing::debug!("{:?} is already in place", from);
            return Ok(false);
        }
        if fs::symlink_metadata(to).is_ok() {
            return Err(fail(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            )));
        }
        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(fail)?;
        }

        match self.mode {
            RelocationMode::Copy => {
                copy_new(from, to).map_err(fail)?;
                tracing::debug!("Copied {:?} -> {:?}", from, to);
            }
            RelocationMode::Move => {
                if let Err(e) = fs::rename(from, to) {
                    // Renames can't cross filesystems.
                    tracing::debug!("rename {:?} failed ({e}), copying instead", from);
                    copy_new(from, to).map_err(fail)?;
                    fs::remove_file(from).map_err(fail)?;
                }
                tracing::debug!("Moved {:?} -> {:?}", from, to);
            }
            RelocationMode::DryRun => {}
        }
        Ok(true)
    }
}

/// Copy into a file that must not exist yet.
fn copy_new(from: &Path, to: &Path) -> io::Result<u64> {
    let mut source = File::open(from)?;
    let mut dest = OpenOptions::new().write(true).create_new(true).open(to)?;
    io::copy(&mut source, &mut dest)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
