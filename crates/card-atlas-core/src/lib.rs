//! Core library for packing per-card images into grid-aligned texture atlases.
//!
//! - Discovery: per-atlas item directories resolved through four naming patterns (plain, variants, prescaled, prescaled variants)
//! - Layout: fixed-width row-major grid, cell size taken from the first image
//! - Output: one RGBA PNG per atlas and scale, plus a Lua descriptor with `SMODS.Atlas` declarations and position tables
//!
//! Quick example:
//! ```ignore
//! use card_atlas_core::{GeneratorConfig, ModPaths, generate_all};
//! # fn main() -> anyhow::Result<()> {
//! let (paths, meta) = ModPaths::locate(std::path::Path::new("."))?;
//! let cfg = GeneratorConfig::builder().scales([2, 1]).base_scale(1).build();
//! let report = generate_all(&cfg, &paths)?;
//! println!("{}: {} atlases", meta.id, report.descriptors.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod export_lua;
pub mod grid;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod tree;
pub mod upscale;

pub use config::*;
pub use error::*;
pub use export::*;
pub use export_lua::*;
pub use grid::*;
pub use model::*;
pub use paths::*;
pub use pipeline::*;
pub use tree::*;

/// Convenience prelude for common types and functions.
/// Importing `card_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        CellSizePolicy, DuplicatePolicy, GeneratorConfig, GeneratorConfigBuilder, ItemOrder,
        ResizeFilter,
    };
    pub use crate::discovery::{discover_images, list_atlases};
    pub use crate::grid::{GridLayout, Placement, place};
    pub use crate::model::{
        AtlasDescriptor, AtlasMetadata, GridCoordinate, ImageRecord, MatchPattern, Rect,
    };
    pub use crate::paths::{ModMetadata, ModPaths, locate_mod_root};
    pub use crate::tree::{PositionNode, PositionTree};
    pub use crate::{
        AtlasError, AtlasOutput, AtlasPage, GenerationReport, build_atlas, generate_all,
        generate_atlas, generate_atlases, render_atlases, to_json, to_lua_block, to_lua_file,
        write_descriptor,
    };
}
