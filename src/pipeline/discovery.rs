//! Stage discovery across the traversed directories.
//!
//! # Responsibilities
//! - Scan each traversed directory's immediate entries for stage markers
//! - Parse the stage kind and numeric sequence out of the filename
//! - Record each stage's walk depth for the scheduler's ordering rules
//! - Surface duplicate (kind, depth, sequence) triples as warnings
//!
//! # Design Decisions
//! - Discovery is fresh per request; no cross-request cache
//! - A marker without a usable `#<n>` suffix is sequence 0
//! - Duplicates order deterministically by filename (lexicographic)

use std::path::PathBuf;

use crate::pipeline::walker::TraversedDir;

/// The recognized stage roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// May reject the request before content executes.
    Gatekeeper,
    /// Mutates the request before the content phase.
    RequestTransformer,
    /// Mutates the response after the content phase.
    ResponseTransformer,
    /// Observes the finished exchange; never affects the response.
    Logger,
}

impl StageKind {
    /// The filename marker this kind is discovered by.
    pub fn marker(self) -> &'static str {
        match self {
            StageKind::Gatekeeper => ".gatekeeper",
            StageKind::RequestTransformer => ".req_transformer",
            StageKind::ResponseTransformer => ".res_transformer",
            StageKind::Logger => ".logger",
        }
    }

    /// Label used in logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Gatekeeper => "gatekeeper",
            StageKind::RequestTransformer => "req_transformer",
            StageKind::ResponseTransformer => "res_transformer",
            StageKind::Logger => "logger",
        }
    }

    const ALL: [StageKind; 4] = [
        StageKind::Gatekeeper,
        StageKind::RequestTransformer,
        StageKind::ResponseTransformer,
        StageKind::Logger,
    ];
}

/// A discovered pipeline-stage file.
#[derive(Debug, Clone)]
pub struct StageFile {
    pub kind: StageKind,
    /// Walk depth of the hosting directory (web root = 0).
    pub depth: usize,
    /// Numeric discriminator ordering same-kind, same-depth stages.
    pub sequence: u32,
    /// Absolute path of the stage executable.
    pub path: PathBuf,
    /// Original filename, the deterministic tie-break for duplicates.
    pub name: String,
}

/// Parse a directory entry name into a stage kind and sequence.
///
/// Accepted shapes are the bare marker (sequence 0) and `marker#<n>`.
/// `marker#<garbage>` keeps the marker but falls back to sequence 0;
/// any other name is not a stage file.
pub fn parse_stage_name(name: &str) -> Option<(StageKind, u32)> {
    for kind in StageKind::ALL {
        if let Some(rest) = name.strip_prefix(kind.marker()) {
            if rest.is_empty() {
                return Some((kind, 0));
            }
            if let Some(seq) = rest.strip_prefix('#') {
                return Some((kind, seq.parse().unwrap_or(0)));
            }
            // e.g. ".gatekeepers": some other file sharing the prefix,
            // not a stage marker.
        }
    }
    None
}

/// Scan every traversed directory for stage files.
///
/// The returned list is unordered; the scheduler sorts per phase.
pub fn discover(dirs: &[TraversedDir]) -> Vec<StageFile> {
    let mut stages = Vec::new();
    for dir in dirs {
        let entries = match std::fs::read_dir(&dir.path) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(path = %dir.path.display(), error = %e, "Skipping unreadable directory during discovery");
                continue;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some((kind, sequence)) = parse_stage_name(&name) {
                stages.push(StageFile {
                    kind,
                    depth: dir.depth,
                    sequence,
                    path: entry.path(),
                    name,
                });
            }
        }
    }
    warn_on_duplicates(&mut stages);
    stages
}

/// Detect duplicate (kind, depth, sequence) triples. The pipeline stays
/// deterministic either way (filename tie-break), but the conflict is
/// almost certainly an operator mistake worth surfacing.
fn warn_on_duplicates(stages: &mut [StageFile]) {
    stages.sort_by(|a, b| {
        (a.kind.label(), a.depth, a.sequence, a.name.as_str())
            .cmp(&(b.kind.label(), b.depth, b.sequence, b.name.as_str()))
    });
    for pair in stages.windows(2) {
        if pair[0].kind == pair[1].kind
            && pair[0].depth == pair[1].depth
            && pair[0].sequence == pair[1].sequence
        {
            tracing::warn!(
                kind = pair[0].kind.label(),
                depth = pair[0].depth,
                sequence = pair[0].sequence,
                first = %pair[0].name,
                second = %pair[1].name,
                "Duplicate stage sequence; ordering falls back to filename"
            );
        }
    }
}
