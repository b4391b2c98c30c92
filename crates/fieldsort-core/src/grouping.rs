//! Attributes every photo to the code card photographed before it.
//!
//! A single pass over records in natural (path) order. A coded record closes
//! the open group and opens a new one; an uncoded record joins the open
//! group. Photos that come before any card form a leading `unknown` group.
//!
//! Grouping trusts file order. If filenames don't sort in capture order the
//! groups will be wrong; [`capture_order_warnings`] points out the photos
//! where that is evidently the case.

use std::path::PathBuf;

use crate::types::{Code, ImageRecord, SpecimenGroup};

/// Fold state: the group still collecting members, and the finished ones.
#[derive(Debug, Default)]
struct Accumulator {
    open: Option<SpecimenGroup>,
    flushed: Vec<SpecimenGroup>,
}

impl Accumulator {
    fn push(mut self, record: ImageRecord) -> Self {
        if record.code.is_known() {
            self.flush();
            self.open = Some(SpecimenGroup::open(record));
        } else {
            self.open
                .get_or_insert_with(SpecimenGroup::leading)
                .members
                .push(record);
        }
        self
    }

    fn flush(&mut self) {
        if let Some(group) = self.open.take().filter(|g| !g.is_empty()) {
            self.flushed.push(group);
        }
    }

    fn finish(mut self) -> Vec<SpecimenGroup> {
        self.flush();
        self.flushed
    }
}

/// Split naturally-ordered records into specimen groups, in flush order.
///
/// Yields one group per coded record, plus a leading `Code::Unknown` group
/// when uncoded records precede the first coded one.
pub fn group_records<I>(records: I) -> Vec<SpecimenGroup>
where
    I: IntoIterator<Item = ImageRecord>,
{
    records
        .into_iter()
        .fold(Accumulator::default(), Accumulator::push)
        .finish()
}

/// A group member captured before the card that opened its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOrderWarning {
    pub path: PathBuf,
    pub code: Code,
    pub captured_at: String,
    pub card_captured_at: String,
}

/// Find members whose capture time precedes their group's code card.
///
/// EXIF timestamps (`YYYY:MM:DD HH:MM:SS`) order correctly as strings.
pub fn capture_order_warnings(groups: &[SpecimenGroup]) -> Vec<CaptureOrderWarning> {
    groups
        .iter()
        .filter_map(|g| g.captured_at().map(|card| (g, card)))
        .flat_map(|(group, card)| {
            group
                .members
                .iter()
                .skip(1)
                .filter(move |m| m.captured_at.as_str() < card)
                .map(move |m| CaptureOrderWarning {
                    path: m.path.clone(),
                    code: group.code.clone(),
                    captured_at: m.captured_at.clone(),
                    card_captured_at: card.to_string(),
                })
        })
        .collect()
}
