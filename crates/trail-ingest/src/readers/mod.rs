//! Source readers
//!
//! Each reader turns one source directory into a lazy, single-pass stream of
//! [`RawTrailRecord`] results. Subdirectories and files are visited in name
//! order and opened one at a time; the records of the file currently open are
//! buffered, nothing else is.

pub mod track_log;
pub mod vector_feature;

pub use track_log::{TrackLogReader, TrackLogRecords};
pub use vector_feature::{FeatureGeometry, FieldMapping, VectorFeatureReader, VectorFeatureRecords};

use crate::config::SourceSpec;
use crate::error::{IngestError, Result};
use crate::model::{RawTrailRecord, RecordContext};
use std::path::{Path, PathBuf};
use trail_common::types::{Provider, RouteCategory, SourceKind};
use walkdir::WalkDir;

/// Boxed record stream handed to the orchestrator
pub type RecordStream = Box<dyn Iterator<Item = Result<RawTrailRecord>> + Send>;

/// Open a fresh record stream for one source under `data_root`
pub fn open(spec: &SourceSpec, data_root: &Path) -> Result<RecordStream> {
    let dir = spec.path(data_root);
    match spec.kind {
        SourceKind::TrackLog => {
            let reader = TrackLogReader::new(spec.origin(), dir)?;
            Ok(Box::new(reader.records()?))
        }
        SourceKind::VectorFeature => {
            let reader = VectorFeatureReader::new(spec.origin(), dir, spec.fields.clone());
            Ok(Box::new(reader.records()?))
        }
    }
}

/// Source-level tags stamped on every record of a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOrigin {
    pub source_name: String,
    pub provider: Provider,
    pub category: RouteCategory,
}

impl SourceOrigin {
    pub(crate) fn context(&self, area: &str, file: &str, index: usize) -> RecordContext {
        RecordContext {
            source_name: self.source_name.clone(),
            area: area.to_string(),
            file: file.to_string(),
            index,
        }
    }
}

/// Fail with a source-level error unless `dir` is an existing directory
pub(crate) fn require_dir(source_name: &str, dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(IngestError::source_unavailable(
            source_name,
            format!("directory not found: {}", dir.display()),
        ))
    }
}

/// Direct children of `dir`, sorted by file name, never following links
pub(crate) fn children(dir: &Path) -> walkdir::IntoIter {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
}

/// Whether `path` has the given extension, ignoring case
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Convert a directory-walk failure into a record-level error
pub(crate) fn walk_error(origin: &SourceOrigin, area: &str, err: walkdir::Error) -> IngestError {
    let path = err.path().map(PathBuf::from).unwrap_or_default();
    IngestError::record(origin.context(area, &file_name(&path), 0), err.to_string())
}
