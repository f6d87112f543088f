//! Layered per-directory configuration.
//!
//! Every traversed directory may carry a `.cascade.toml` whose settings
//! apply to that directory and everything below it. Layers merge key by
//! key as the walker descends, so a deeper directory overrides exactly the
//! keys it sets and inherits the rest.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Filename of the per-directory configuration file.
pub const DIR_CONFIG_FILE: &str = ".cascade.toml";

/// One directory's raw configuration, as deserialized from `.cascade.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirConfig {
    /// Path resolution settings.
    pub resolution: ResolutionConfig,

    /// Extra environment variables passed to every child process spawned
    /// at or below this directory.
    pub env: HashMap<String, String>,

    /// File extension → content type overrides.
    pub mime: HashMap<String, String>,
}

/// Path resolution settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Overrides the filename served when a directory is the final target.
    pub index: Option<String>,
}

/// The merged view of all `.cascade.toml` layers along a traversed path.
///
/// Built once per request while the walker descends; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverlay {
    index: Option<String>,
    env: HashMap<String, String>,
    mime: HashMap<String, String>,
}

impl ConfigOverlay {
    /// Fold the given directory's `.cascade.toml` (if any) into the overlay.
    ///
    /// A missing file is normal. A malformed file is skipped with a warning
    /// so one bad layer cannot take the subtree offline.
    pub fn fold_dir(&mut self, dir: &Path) {
        let path = dir.join(DIR_CONFIG_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(v) => v,
            Err(_) => return,
        };
        match toml::from_str::<DirConfig>(&contents) {
            Ok(layer) => self.fold(layer),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed directory config");
            }
        }
    }

    /// Merge one parsed layer, deeper keys winning over shallower ones.
    pub fn fold(&mut self, layer: DirConfig) {
        if layer.resolution.index.is_some() {
            self.index = layer.resolution.index;
        }
        self.env.extend(layer.env);
        self.mime.extend(layer.mime);
    }

    /// The index filename set by the deepest layer that names one, if any.
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Extra environment variables for child processes.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Content type for the given target, from the `mime` overrides.
    pub fn content_type_for(&self, target: &Path) -> Option<&str> {
        let ext = target.extension()?.to_str()?;
        self.mime.get(ext).map(String::as_str)
    }
}
