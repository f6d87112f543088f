//! Path resolution against the filesystem hierarchy.
//!
//! # Responsibilities
//! - Walk the request path segment by segment from the web root
//! - Enforce the others-read gate on every entry and the others-execute
//!   gate on files hit before the final segment
//! - Rewrite a final directory target to its configured index entry
//! - Collect the traversed directories (with depths) for stage discovery
//! - Fold per-directory config layers while descending
//!
//! # Design Decisions
//! - Strict prefix walk: no redirection, no partial matching
//! - Percent sequences are not decoded; a segment is cut at its first `%`
//! - Trailing segments behind an executable mid-path file are not
//!   re-validated against the filesystem; they become extra path info

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::pipeline::overlay::ConfigOverlay;

const OTHERS_READ: u32 = 0o004;
const OTHERS_EXEC: u32 = 0o001;

/// One directory visited on the way to the target.
#[derive(Debug, Clone)]
pub struct TraversedDir {
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Walk depth; the web root is 0.
    pub depth: usize,
}

/// A successfully resolved target.
#[derive(Debug)]
pub struct ResolvedTarget {
    /// Absolute path of the file to execute or read.
    pub target: PathBuf,
    /// Whether the target carries the others-execute bit.
    pub is_executable: bool,
    /// Path segments beyond an executable mid-path file, joined with `/`.
    /// Empty when the target was the final segment.
    pub trailing: String,
    /// Every directory traversed, web root first.
    pub dirs: Vec<TraversedDir>,
    /// The merged per-directory configuration along the walk.
    pub overlay: ConfigOverlay,
}

/// Outcome of a path walk.
#[derive(Debug)]
pub enum Resolution {
    /// Missing entry, permission-denied entry, or non-executable mid-path
    /// file. Always rendered as a 404-equivalent; never an error.
    NotFound,
    /// The walk reached a servable target.
    Found(Box<ResolvedTarget>),
}

/// Walk `url_path` starting at `root`, depth 0.
///
/// `default_index` is the index filename used when no directory config
/// layer overrides it.
pub fn resolve(root: &Path, url_path: &str, default_index: &str) -> Resolution {
    // Filesystem matching uses the segment cut at its first '%'; trailing
    // path info hands the raw segments through untouched.
    let segments: Vec<(&str, &str)> = url_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|raw| (raw, raw.find('%').map_or(raw, |i| &raw[..i])))
        .filter(|(_, cut)| !cut.is_empty())
        .collect();

    let Ok(meta) = std::fs::metadata(root) else {
        return Resolution::NotFound;
    };
    if !meta.is_dir() || !has_bits(&meta, OTHERS_READ) {
        return Resolution::NotFound;
    }

    let mut overlay = ConfigOverlay::default();
    overlay.fold_dir(root);
    let mut dirs = vec![TraversedDir {
        path: root.to_path_buf(),
        depth: 0,
    }];
    let mut current = root.to_path_buf();

    for (i, (_, segment)) in segments.iter().enumerate() {
        let candidate = current.join(segment);
        let last = i + 1 == segments.len();

        let Ok(meta) = std::fs::metadata(&candidate) else {
            return Resolution::NotFound;
        };
        if !has_bits(&meta, OTHERS_READ) {
            return Resolution::NotFound;
        }

        if meta.is_file() {
            if !last {
                // A file in the middle of the path only resolves when it is
                // executable; the rest of the path rides along as context.
                if !has_bits(&meta, OTHERS_EXEC) {
                    return Resolution::NotFound;
                }
                let trailing = segments[i + 1..]
                    .iter()
                    .map(|(raw, _)| *raw)
                    .collect::<Vec<_>>()
                    .join("/");
                return Resolution::Found(Box::new(ResolvedTarget {
                    target: candidate,
                    is_executable: true,
                    trailing,
                    dirs,
                    overlay,
                }));
            }
            return Resolution::Found(Box::new(ResolvedTarget {
                is_executable: has_bits(&meta, OTHERS_EXEC),
                target: candidate,
                trailing: String::new(),
                dirs,
                overlay,
            }));
        }

        // Directory: fold its config layer and record it for discovery.
        overlay.fold_dir(&candidate);
        dirs.push(TraversedDir {
            path: candidate.clone(),
            depth: i + 1,
        });

        if last {
            return resolve_index(&candidate, dirs, overlay, default_index);
        }
        current = candidate;
    }

    // Bare "/" (or a path of empty segments): the root's own index.
    resolve_index(&current, dirs, overlay, default_index)
}

/// A directory was the final target; its index entry becomes the target,
/// with the index's own permission bits re-validated.
fn resolve_index(
    dir: &Path,
    dirs: Vec<TraversedDir>,
    overlay: ConfigOverlay,
    default_index: &str,
) -> Resolution {
    let index = dir.join(overlay.index().unwrap_or(default_index));
    let Ok(meta) = std::fs::metadata(&index) else {
        return Resolution::NotFound;
    };
    if !meta.is_file() || !has_bits(&meta, OTHERS_READ) {
        return Resolution::NotFound;
    }
    Resolution::Found(Box::new(ResolvedTarget {
        is_executable: has_bits(&meta, OTHERS_EXEC),
        target: index,
        trailing: String::new(),
        dirs,
        overlay,
    }))
}

fn has_bits(meta: &std::fs::Metadata, bits: u32) -> bool {
    meta.permissions().mode() & bits != 0
}
