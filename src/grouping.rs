/**
 * Date grouping of discovered files
 */

use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::exif::{CaptureDate, DateResolver, NoDate};

/// A file that was left out because no capture date could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: NoDate,
}

/// Files keyed by capture date. Iteration is ascending by date; members
/// keep the order they were added in.
#[derive(Debug, Default, Clone)]
pub struct DateGroups {
    groups: BTreeMap<CaptureDate, Vec<PathBuf>>,
}

impl DateGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: CaptureDate, path: PathBuf) {
        self.groups.entry(date).or_default().push(path);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CaptureDate, &[PathBuf])> {
        self.groups.iter().map(|(date, files)| (date, files.as_slice()))
    }

    /// Number of distinct dates.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of files across all groups.
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Resolve a date for every path, in order, and group the ones that have
/// one. Files without a date are returned separately and logged.
pub fn group_by_date<P, R>(paths: &[P], resolver: &R) -> (DateGroups, Vec<SkippedFile>)
where
    P: AsRef<Path>,
    R: DateResolver + ?Sized,
{
    let mut groups = DateGroups::new();
    let mut skipped = Vec::new();

    for path in paths {
        let path = path.as_ref();
        match resolver.resolve(path) {
            Ok(date) => {
                debug!("{} -> {}", path.display(), date);
                groups.insert(date, path.to_path_buf());
            }
            Err(reason) => {
                warn!("File {} could not be processed: {}", path.display(), reason);
                skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }
    }

    (groups, skipped)
}
