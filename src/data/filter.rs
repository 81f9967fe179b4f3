use std::path::Path;

use serde::Serialize;

use super::model::PosterDataset;
use super::probe::ExistenceProbe;

// ---------------------------------------------------------------------------
// Rejected rows
// ---------------------------------------------------------------------------

/// Why a row was dropped by the score gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingScore,
    ZeroScore,
}

/// One dropped row, in the shape the rejects log serializes.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub image_path: Option<String>,
    pub reason: RejectReason,
}

// ---------------------------------------------------------------------------
// Pipeline passes
// ---------------------------------------------------------------------------

/// Rewrite every `image_path` to forward-slash separators.  Pure and total:
/// rows without a path pass through untouched.
pub fn normalize_separators(dataset: &mut PosterDataset) {
    for record in &mut dataset.records {
        if let Some(path) = &mut record.image_path {
            if path.contains('\\') {
                *path = path.replace('\\', "/");
            }
        }
    }
}

/// Drop every row whose score is missing or exactly zero.  Stable: surviving
/// rows keep their relative order.  Dropped rows come back as
/// [`RejectedRecord`]s for the optional rejects log.
pub fn split_by_score(dataset: PosterDataset) -> (PosterDataset, Vec<RejectedRecord>) {
    let PosterDataset { records, columns } = dataset;

    let mut kept = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for record in records {
        match record.imdb_score {
            None => rejected.push(RejectedRecord {
                image_path: record.image_path,
                reason: RejectReason::MissingScore,
            }),
            Some(score) if score == 0.0 => rejected.push(RejectedRecord {
                image_path: record.image_path,
                reason: RejectReason::ZeroScore,
            }),
            Some(_) => kept.push(record),
        }
    }

    (PosterDataset::new(kept, columns), rejected)
}

/// Resolve each row's path against `base_dir`, ask the probe whether a
/// filesystem entry exists there, and store the verdict on the row.
/// Rows without a path are marked absent.  Returns how many rows'
/// files exist.
pub fn annotate_existence<P>(dataset: &mut PosterDataset, base_dir: &Path, probe: &P) -> usize
where
    P: ExistenceProbe + ?Sized,
{
    let mut present = 0;
    for record in &mut dataset.records {
        let exists = match &record.image_path {
            Some(path) => probe.exists(&base_dir.join(path)),
            None => false,
        };
        record.file_exists = Some(exists);
        if exists {
            present += 1;
        }
    }
    present
}
