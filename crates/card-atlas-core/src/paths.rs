use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AtlasError, Result};

/// The `<id>.json` manifest that marks a directory as a mod root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModMetadata {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reads the mod manifest in `dir`, if any.
///
/// A manifest is a top-level `*.json` file whose `"id"` equals its file stem. Files without a
/// string `id` are ignored; malformed JSON is an error.
pub fn read_mod_metadata(dir: &Path) -> Result<Option<ModMetadata>> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    candidates.sort();
    for path in candidates {
        let text = fs::read_to_string(&path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let Some(id) = value.get("id").and_then(|v| v.as_str()) else {
            continue;
        };
        if path.file_stem().and_then(|s| s.to_str()) == Some(id) {
            debug!(?path, id, "found mod manifest");
            return Ok(Some(serde_json::from_value(value)?));
        }
    }
    Ok(None)
}

/// Finds the mod root at `start` or its parent (so the tool works from `MOD_ROOT/scripts`).
pub fn locate_mod_root(start: &Path) -> Result<(PathBuf, ModMetadata)> {
    for dir in [start.to_path_buf(), start.join("..")] {
        if !dir.is_dir() {
            continue;
        }
        if let Some(meta) = read_mod_metadata(&dir)? {
            return Ok((dir, meta));
        }
    }
    Err(AtlasError::ModRootNotFound(start.to_path_buf()))
}

/// Directories and files the generator reads and writes, resolved once per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModPaths {
    pub mod_root: PathBuf,
    /// `assets/uncombined`: one directory per atlas.
    pub uncombined: PathBuf,
    /// `assets`: PNGs go to `<assets>/<scale>x/`.
    pub assets: PathBuf,
    /// `atlases.lua`
    pub descriptor: PathBuf,
}

impl ModPaths {
    /// Standard layout below `mod_root`.
    pub fn from_root(mod_root: impl Into<PathBuf>) -> Self {
        let mod_root = mod_root.into();
        let assets = mod_root.join("assets");
        Self {
            uncombined: assets.join("uncombined"),
            descriptor: mod_root.join("atlases.lua"),
            assets,
            mod_root,
        }
    }

    /// Locates the mod root from `start` and returns the standard layout below it.
    pub fn locate(start: &Path) -> Result<(Self, ModMetadata)> {
        let (root, meta) = locate_mod_root(start)?;
        Ok((Self::from_root(root), meta))
    }

    /// Output directory for one scale: `<assets>/<scale>x`.
    pub fn scale_dir(&self, scale: u32) -> PathBuf {
        self.assets.join(format!("{scale}x"))
    }

    /// Source directory of one atlas.
    pub fn atlas_dir(&self, atlas: &str) -> PathBuf {
        self.uncombined.join(atlas)
    }
}
