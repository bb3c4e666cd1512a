use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::config::{DuplicatePolicy, GeneratorConfig, ItemOrder};
use crate::error::{AtlasError, Result};
use crate::model::{ImageRecord, MatchPattern};

/// Immediate child entries of `dir` (no recursion), optionally sorted by file name.
/// Symlinks are followed, so linked atlas and item directories count as directories.
fn children(dir: &Path, order: ItemOrder) -> Result<Vec<walkdir::DirEntry>> {
    let mut walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);
    if order == ItemOrder::NameAsc {
        walker = walker.sort_by_file_name();
    }
    let mut out = Vec::new();
    for entry in walker {
        out.push(entry.map_err(std::io::Error::from)?);
    }
    Ok(out)
}

/// Names of the immediate subdirectories of `dir`.
pub fn subdirectories(dir: &Path, order: ItemOrder) -> Result<Vec<String>> {
    Ok(children(dir, order)?
        .into_iter()
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect())
}

/// Atlas names: one per directory under the uncombined root.
pub fn list_atlases(uncombined: &Path, order: ItemOrder) -> Result<Vec<String>> {
    subdirectories(uncombined, order)
}

fn is_png(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// `*.png` files directly inside `dir`; empty if `dir` does not exist.
fn png_files(dir: &Path, order: ItemOrder) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(children(dir, order)?
        .into_iter()
        .filter(|e| e.file_type().is_file() && is_png(e.path()))
        .map(|e| e.into_path())
        .collect())
}

/// Source files for one item directory under one naming pattern.
fn pattern_matches(
    item_dir: &Path,
    item: &str,
    scale: u32,
    pattern: MatchPattern,
    order: ItemOrder,
) -> Result<Vec<PathBuf>> {
    let base = if pattern.is_prescaled() {
        item_dir.join(format!("{scale}x"))
    } else {
        item_dir.to_path_buf()
    };
    if pattern.is_variant() {
        png_files(&base.join(item), order)
    } else {
        let file = base.join(format!("{item}.png"));
        Ok(if file.is_file() { vec![file] } else { Vec::new() })
    }
}

/// Resolves every item directory of `atlas` to its source images at `scale`.
///
/// Patterns are tried in [`MatchPattern::ALL`] order and are not exclusive: an item that matches
/// several of them yields one record per match (`warn`) or fails discovery (`reject`). Under
/// `prefer_prescaled` a prescaled file replaces the unscaled record with the same key in place, so
/// `<item>/<item>.png` plus `<item>/2x/<item>.png` stays one cell at every scale; only an item that
/// still mixes a plain image with variants is then reported. Items that match nothing are skipped
/// with a warning.
#[instrument(skip(uncombined, cfg))]
pub fn discover_images(
    uncombined: &Path,
    atlas: &str,
    scale: u32,
    cfg: &GeneratorConfig,
) -> Result<Vec<ImageRecord>> {
    let atlas_dir = uncombined.join(atlas);
    let mut records = Vec::new();
    for item in subdirectories(&atlas_dir, cfg.item_order)? {
        let item_dir = atlas_dir.join(&item);
        let mut found: Vec<ImageRecord> = Vec::new();
        for pattern in MatchPattern::ALL {
            for path in pattern_matches(&item_dir, &item, scale, pattern, cfg.item_order)? {
                info!(scale, path = %path.display(), "adding");
                let variant_name = if pattern.is_variant() {
                    path.file_stem().map(|s| s.to_string_lossy().into_owned())
                } else {
                    None
                };
                let record = ImageRecord {
                    atlas_name: atlas.to_string(),
                    item_name: item.clone(),
                    variant_name,
                    path,
                    scale,
                    prescaled: pattern.is_prescaled(),
                    pattern,
                };
                let overridden = found.iter_mut().find(|r| {
                    cfg.duplicate_policy == DuplicatePolicy::PreferPrescaled
                        && record.prescaled
                        && !r.prescaled
                        && r.key() == record.key()
                });
                match overridden {
                    Some(slot) => {
                        debug!(scale, key = %record.key(), "prescaled image replaces scaled source");
                        *slot = record;
                    }
                    None => found.push(record),
                }
            }
        }
        let mut matched: Vec<MatchPattern> = Vec::new();
        for r in &found {
            if !matched.contains(&r.pattern) {
                matched.push(r.pattern);
            }
        }
        let duplicate = match cfg.duplicate_policy {
            DuplicatePolicy::PreferPrescaled => {
                found.iter().any(|r| r.variant_name.is_none())
                    && found.iter().any(|r| r.variant_name.is_some())
            }
            DuplicatePolicy::Warn | DuplicatePolicy::Reject => matched.len() > 1,
        };
        if found.is_empty() {
            warn!(scale, item = %item, "unable to find anything for item, skipping");
        } else if duplicate {
            match cfg.duplicate_policy {
                DuplicatePolicy::Warn | DuplicatePolicy::PreferPrescaled => {
                    warn!(scale, item = %item, patterns = ?matched, "item matched more than one pattern")
                }
                DuplicatePolicy::Reject => {
                    return Err(AtlasError::DuplicateMatch {
                        atlas: atlas.to_string(),
                        item,
                    });
                }
            }
        }
        records.extend(found);
    }
    Ok(records)
}
