//! Discovery of implementation binaries.
//!
//! Each search location is listed non-recursively in file-name order. Every
//! shared-library file is opened, asked to describe itself, and closed
//! again; only the owned description is kept. A file that fails at any step
//! is skipped with a debug log and never fails discovery as a whole.

use crate::backend::{CandidateError, LibraryOpener};
use crate::candidate::Candidate;
use error_stack::Report;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use vpl_dispatch_kernel::{ApiVersion, LibPriority, Rankable};
use walkdir::WalkDir;

/// A directory to search and the tier its implementations get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLocation {
    pub dir: PathBuf,
    pub priority: LibPriority,
}

impl SearchLocation {
    pub fn new(dir: impl Into<PathBuf>, priority: LibPriority) -> Self {
        Self {
            dir: dir.into(),
            priority,
        }
    }
}

/// Whether `path` names a shared library for this platform.
///
/// On Linux versioned names such as `libvpl.so.2` also count.
pub fn is_library_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if cfg!(target_os = "windows") {
        name.to_ascii_lowercase().ends_with(".dll")
    } else if cfg!(target_os = "macos") {
        name.ends_with(".dylib")
    } else {
        is_shared_object_name(name)
    }
}

/// `*.so` or `*.so.<digits>[.<digits>...]`.
fn is_shared_object_name(name: &str) -> bool {
    if name.ends_with(".so") {
        return name.len() > ".so".len();
    }
    match name.split_once(".so.") {
        Some((stem, version)) => {
            !stem.is_empty()
                && version
                    .split('.')
                    .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        }
        None => false,
    }
}

/// Shared-library files directly inside `dir`, sorted by file name.
pub fn list_library_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|path| is_library_file(path))
        .collect()
}

/// Locates and validates implementations.
pub struct Discovery<'a> {
    opener: &'a dyn LibraryOpener,
    min_api_version: ApiVersion,
}

impl<'a> Discovery<'a> {
    pub fn new(opener: &'a dyn LibraryOpener, min_api_version: ApiVersion) -> Self {
        Self {
            opener,
            min_api_version,
        }
    }

    /// Open `path` and copy out its description.
    pub fn inspect(&self, path: &Path, priority: LibPriority, index: usize) -> Result<Candidate, Report<CandidateError>> {
        let implementation = self.opener.open(path)?;
        let desc = implementation.query_description()?;

        if desc.api_version < self.min_api_version {
            return Err(Report::new(CandidateError::VersionTooLow {
                found: desc.api_version,
                required: self.min_api_version,
            }));
        }

        Ok(Candidate::new(path.to_path_buf(), priority, Arc::new(desc), index))
    }

    /// Inspect every library in `locations`.
    ///
    /// Results are grouped by tier in location order; within a tier they are
    /// ordered by reported API version, then by discovery order. A file
    /// reachable from several locations is kept at its first, highest-priority
    /// occurrence.
    pub fn run(&self, locations: &[SearchLocation]) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut index = 0;

        for location in locations {
            if !location.dir.is_dir() {
                debug!("Skipping missing search location: {:?}", location.dir);
                continue;
            }
            for path in list_library_files(&location.dir) {
                let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                if !seen.insert(key) {
                    continue;
                }
                match self.inspect(&path, location.priority, index) {
                    Ok(candidate) => {
                        debug!(
                            "Found implementation {:?} ({}, API {}) at {:?}",
                            candidate.description().impl_name,
                            if candidate.description().is_hardware() { "hardware" } else { "software" },
                            candidate.description().api_version,
                            path
                        );
                        candidates.push(candidate);
                        index += 1;
                    }
                    Err(report) => debug!("Skipping {:?}: {:?}", path, report),
                }
            }
        }

        candidates.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.description().api_version.cmp(&b.description().api_version))
                .then_with(|| a.discovery_index().cmp(&b.discovery_index()))
        });

        info!(
            "Discovery found {} implementation(s) in {} location(s)",
            candidates.len(),
            locations.len()
        );
        candidates
    }
}
