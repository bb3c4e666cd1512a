use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::compositing::{GridCanvas, load_record};
use crate::config::GeneratorConfig;
use crate::discovery::{discover_images, list_atlases};
use crate::error::{AtlasError, Result};
use crate::export_lua::to_lua_file;
use crate::grid::GridLayout;
use crate::model::{AtlasDescriptor, AtlasMetadata, ImageRecord};
use crate::paths::ModPaths;
use crate::tree::PositionTree;

/// One rendered atlas at one scale, not yet written.
pub struct AtlasPage {
    pub atlas: String,
    pub scale: u32,
    pub records: Vec<ImageRecord>,
    pub layout: GridLayout,
    pub cell_size: (u32, u32),
    pub rgba: RgbaImage,
}

impl AtlasPage {
    pub fn metadata(&self) -> AtlasMetadata {
        AtlasMetadata::new(&self.atlas, self.cell_size)
    }

    /// `<assets>/<scale>x/atlas_<name>.png`
    pub fn output_path(&self, paths: &ModPaths) -> PathBuf {
        paths
            .scale_dir(self.scale)
            .join(self.metadata().output_filename)
    }

    /// Descriptor record plus position tree for this page's records.
    pub fn descriptor(&self) -> Result<AtlasDescriptor> {
        Ok(AtlasDescriptor {
            metadata: self.metadata(),
            grid: (self.layout.columns, self.layout.rows),
            positions: PositionTree::from_records(&self.atlas, &self.records, &self.layout)?,
        })
    }
}

/// Result of generating every scale of one atlas.
pub struct AtlasOutput {
    /// Built from the base-scale pass.
    pub descriptor: AtlasDescriptor,
    /// PNGs written, in generation order (empty on dry runs).
    pub written: Vec<PathBuf>,
}

/// Result of a whole generation run.
#[derive(Debug)]
pub struct GenerationReport {
    pub descriptors: Vec<AtlasDescriptor>,
    pub pages_written: Vec<PathBuf>,
    /// Descriptor file, unless this was a dry run.
    pub descriptor_path: Option<PathBuf>,
}

/// Discovers, lays out and renders `atlas` at `scale` in memory.
///
/// Images are decoded one at a time and pasted straight into the canvas, whose cell size comes
/// from the first image. An atlas without any image fails with `EmptyAtlas`.
#[instrument(skip(cfg, paths))]
pub fn build_atlas(
    cfg: &GeneratorConfig,
    paths: &ModPaths,
    atlas: &str,
    scale: u32,
) -> Result<AtlasPage> {
    let records = discover_images(&paths.uncombined, atlas, scale, cfg)?;
    let layout = GridLayout::new(records.len() as u32, cfg.max_grid_width);
    let mut canvas: Option<GridCanvas> = None;
    for (i, record) in records.iter().enumerate() {
        let img = load_record(record, cfg.resize_filter)?;
        if canvas.is_none() {
            canvas = Some(GridCanvas::new(
                layout,
                img.dimensions(),
                cfg.cell_size_policy,
                cfg.outlines,
            )?);
        }
        if let Some(canvas) = canvas.as_mut() {
            canvas.paste(i as u32, &img, &record.path)?;
        }
    }
    let canvas = canvas.ok_or_else(|| AtlasError::EmptyAtlas {
        atlas: atlas.to_string(),
        scale,
    })?;
    Ok(AtlasPage {
        atlas: atlas.to_string(),
        scale,
        records,
        layout,
        cell_size: canvas.cell_size(),
        rgba: canvas.into_rgba(),
    })
}

/// Saves `page` as PNG, creating the scale directory if needed. Overwrites unconditionally.
pub fn write_page(page: &AtlasPage, paths: &ModPaths) -> Result<PathBuf> {
    let out = page.output_path(paths);
    if let Some(dir) = out.parent() {
        fs::create_dir_all(dir)?;
    }
    page.rgba.save(&out)?;
    info!(path = %out.display(), w = page.rgba.width(), h = page.rgba.height(), "wrote atlas");
    Ok(out)
}

/// Fails with `ScaleMismatch` unless `page` lists the same record keys, in the same order, as
/// the base-scale page.
fn check_same_records(base: &AtlasPage, page: &AtlasPage) -> Result<()> {
    let base_keys: Vec<String> = base.records.iter().map(ImageRecord::key).collect();
    let keys: Vec<String> = page.records.iter().map(ImageRecord::key).collect();
    if base_keys == keys && base.layout == page.layout {
        return Ok(());
    }
    let at = base_keys
        .iter()
        .zip(&keys)
        .position(|(a, b)| a != b)
        .unwrap_or(base_keys.len().min(keys.len()));
    let end = || "<end>".to_string();
    Err(AtlasError::ScaleMismatch {
        atlas: page.atlas.clone(),
        scale: page.scale,
        base_scale: base.scale,
        expected: base_keys.get(at).cloned().unwrap_or_else(end),
        found: keys.get(at).cloned().unwrap_or_else(end),
    })
}

/// Renders every configured scale of `atlas` (in `cfg.scales` order) and returns the
/// descriptor from the base-scale pass. Each scale is discovered independently.
///
/// Every scale must resolve to the same record keys as the base scale; pages are only written
/// once all of them agree.
pub fn generate_atlas(cfg: &GeneratorConfig, paths: &ModPaths, atlas: &str) -> Result<AtlasOutput> {
    info!(atlas, "generating");
    let mut pages = Vec::with_capacity(cfg.scales.len());
    for &scale in &cfg.scales {
        pages.push(build_atlas(cfg, paths, atlas, scale)?);
    }
    let base = pages
        .iter()
        .find(|p| p.scale == cfg.base_scale)
        .ok_or_else(|| {
            AtlasError::InvalidConfig(format!(
                "base_scale ({}x) is not one of the configured scales",
                cfg.base_scale
            ))
        })?;
    for page in &pages {
        check_same_records(base, page)?;
    }
    let descriptor = base.descriptor()?;
    let mut written = Vec::new();
    if !cfg.dry_run {
        for page in &pages {
            written.push(write_page(page, paths)?);
        }
    }
    Ok(AtlasOutput {
        descriptor,
        written,
    })
}

/// Writes descriptor text to `path` in one go, creating its directory if needed.
pub fn write_descriptor(path: &Path, text: &str) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, text)?;
    info!(path = %path.display(), "wrote descriptor");
    Ok(path.to_path_buf())
}

/// Generates the named atlases without writing a descriptor file.
///
/// `on_atlas(index, name)` runs before each atlas starts; the CLI drives its progress bar with it.
/// The returned report has `descriptor_path: None`.
pub fn render_atlases<F>(
    cfg: &GeneratorConfig,
    paths: &ModPaths,
    atlases: &[String],
    mut on_atlas: F,
) -> Result<GenerationReport>
where
    F: FnMut(usize, &str),
{
    cfg.validate()?;
    let mut descriptors = Vec::with_capacity(atlases.len());
    let mut pages_written = Vec::new();
    for (i, atlas) in atlases.iter().enumerate() {
        on_atlas(i, atlas);
        let out = generate_atlas(cfg, paths, atlas)?;
        descriptors.push(out.descriptor);
        pages_written.extend(out.written);
    }
    Ok(GenerationReport {
        descriptors,
        pages_written,
        descriptor_path: None,
    })
}

/// Generates the named atlases, then writes the Lua descriptor once at the end, so a failure
/// part-way through leaves the previous descriptor file untouched.
pub fn generate_atlases(
    cfg: &GeneratorConfig,
    paths: &ModPaths,
    atlases: &[String],
) -> Result<GenerationReport> {
    let mut report = render_atlases(cfg, paths, atlases, |_, _| {})?;
    if !cfg.dry_run {
        let text = to_lua_file(&cfg.generator_name, &report.descriptors);
        report.descriptor_path = Some(write_descriptor(&paths.descriptor, &text)?);
    }
    Ok(report)
}

/// Generates every atlas under the uncombined root.
pub fn generate_all(cfg: &GeneratorConfig, paths: &ModPaths) -> Result<GenerationReport> {
    cfg.validate()?;
    let atlases = list_atlases(&paths.uncombined, cfg.item_order)?;
    info!(count = atlases.len(), "found atlases");
    generate_atlases(cfg, paths, &atlases)
}
