//! Generation settings shared by discovery, composition and the emitters.
//! Key notes:
//!   - `scales` is also the generation order; the base scale is the only one that feeds the descriptor
//!   - `item_order` makes grid placement independent of directory-listing order
//!   - `cell_size_policy` decides what happens when an atlas mixes image sizes

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::grid::DEFAULT_MAX_GRID_WIDTH;

/// Order in which atlases, items and variant files are enumerated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemOrder {
    /// Lexicographic by file name (reproducible across machines).
    NameAsc,
    /// Whatever order the filesystem lists entries in.
    Filesystem,
}

impl FromStr for ItemOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name_asc" | "name" => Ok(Self::NameAsc),
            "filesystem" | "fs" | "none" => Ok(Self::Filesystem),
            _ => Err(()),
        }
    }
}

/// What to do when an image's size differs from the first image of its atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CellSizePolicy {
    /// Fail with `CellSizeMismatch`.
    Strict,
    /// Use the first image's size for every cell and clip whatever overflows the canvas.
    FirstImage,
}

impl FromStr for CellSizePolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "first_image" | "first" | "lenient" => Ok(Self::FirstImage),
            _ => Err(()),
        }
    }
}

/// What to do when one item directory matches more than one naming pattern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Log a warning and keep every matching record (each takes a grid cell).
    Warn,
    /// Fail with `DuplicateMatch`.
    Reject,
    /// A prescaled file overrides the unscaled file with the same key; other mixes warn.
    PreferPrescaled,
}

impl FromStr for DuplicatePolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" | "keep" => Ok(Self::Warn),
            "reject" | "error" => Ok(Self::Reject),
            "prefer_prescaled" | "override" => Ok(Self::PreferPrescaled),
            _ => Err(()),
        }
    }
}

/// Resampling filter for images that are not prescaled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    pub fn to_filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmull_rom" | "catmullrom" | "bicubic" => Ok(Self::CatmullRom),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Maximum number of cells per atlas row.
    #[serde(default = "default_max_grid_width")]
    pub max_grid_width: u32,
    /// Scales to render, in generation order.
    #[serde(default = "default_scales")]
    pub scales: Vec<u32>,
    /// Scale whose pass produces the descriptor text. Must be listed in `scales`.
    #[serde(default = "default_base_scale")]
    pub base_scale: u32,
    #[serde(default = "default_item_order")]
    pub item_order: ItemOrder,
    #[serde(default = "default_cell_size_policy")]
    pub cell_size_policy: CellSizePolicy,
    #[serde(default = "default_duplicate_policy")]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default = "default_resize_filter")]
    pub resize_filter: ResizeFilter,
    /// Draw red outlines around every cell (debug).
    #[serde(default)]
    pub outlines: bool,
    /// Named in the do-not-edit banner of the descriptor file.
    #[serde(default = "default_generator_name")]
    pub generator_name: String,
    /// Compute everything but write no files.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_grid_width: default_max_grid_width(),
            scales: default_scales(),
            base_scale: default_base_scale(),
            item_order: default_item_order(),
            cell_size_policy: default_cell_size_policy(),
            duplicate_policy: default_duplicate_policy(),
            resize_filter: default_resize_filter(),
            outlines: false,
            generator_name: default_generator_name(),
            dry_run: false,
        }
    }
}

impl GeneratorConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `max_grid_width` is zero
    /// - `scales` is empty, contains zero, or repeats a scale
    /// - `base_scale` is not one of `scales`
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.max_grid_width == 0 {
            return Err(AtlasError::InvalidConfig(
                "max_grid_width must be at least 1".into(),
            ));
        }
        if self.scales.is_empty() {
            return Err(AtlasError::InvalidConfig("no scales configured".into()));
        }
        if self.scales.contains(&0) {
            return Err(AtlasError::InvalidConfig("scale 0 is not allowed".into()));
        }
        for (i, s) in self.scales.iter().enumerate() {
            if self.scales[..i].contains(s) {
                return Err(AtlasError::InvalidConfig(format!(
                    "scale {s}x listed more than once"
                )));
            }
        }
        if !self.scales.contains(&self.base_scale) {
            return Err(AtlasError::InvalidConfig(format!(
                "base_scale ({}x) is not one of the configured scales {:?}",
                self.base_scale, self.scales
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }
}

fn default_max_grid_width() -> u32 {
    DEFAULT_MAX_GRID_WIDTH
}
fn default_scales() -> Vec<u32> {
    vec![2, 1]
}
fn default_base_scale() -> u32 {
    1
}
fn default_item_order() -> ItemOrder {
    ItemOrder::NameAsc
}
fn default_cell_size_policy() -> CellSizePolicy {
    CellSizePolicy::Strict
}
fn default_duplicate_policy() -> DuplicatePolicy {
    DuplicatePolicy::Warn
}
fn default_resize_filter() -> ResizeFilter {
    ResizeFilter::CatmullRom
}
fn default_generator_name() -> String {
    "card-atlas generate".into()
}

/// Builder for `GeneratorConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct GeneratorConfigBuilder {
    cfg: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: GeneratorConfig::default(),
        }
    }
    pub fn max_grid_width(mut self, v: u32) -> Self {
        self.cfg.max_grid_width = v;
        self
    }
    pub fn scales(mut self, v: impl Into<Vec<u32>>) -> Self {
        self.cfg.scales = v.into();
        self
    }
    pub fn base_scale(mut self, v: u32) -> Self {
        self.cfg.base_scale = v;
        self
    }
    pub fn item_order(mut self, v: ItemOrder) -> Self {
        self.cfg.item_order = v;
        self
    }
    pub fn cell_size_policy(mut self, v: CellSizePolicy) -> Self {
        self.cfg.cell_size_policy = v;
        self
    }
    pub fn duplicate_policy(mut self, v: DuplicatePolicy) -> Self {
        self.cfg.duplicate_policy = v;
        self
    }
    pub fn resize_filter(mut self, v: ResizeFilter) -> Self {
        self.cfg.resize_filter = v;
        self
    }
    pub fn outlines(mut self, v: bool) -> Self {
        self.cfg.outlines = v;
        self
    }
    pub fn generator_name(mut self, v: impl Into<String>) -> Self {
        self.cfg.generator_name = v.into();
        self
    }
    pub fn dry_run(mut self, v: bool) -> Self {
        self.cfg.dry_run = v;
        self
    }
    pub fn build(self) -> GeneratorConfig {
        self.cfg
    }
}
