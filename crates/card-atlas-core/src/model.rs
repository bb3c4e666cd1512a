use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::tree::PositionTree;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        if self.w == 0 || self.h == 0 || r.w == 0 || r.h == 0 {
            return false;
        }
        self.x < r.x + r.w && r.x < self.x + self.w && self.y < r.y + r.h && r.y < self.y + self.h
    }
}

/// Cell index within an atlas grid, independent of pixel size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GridCoordinate {
    #[serde(rename = "x")]
    pub column: u32,
    #[serde(rename = "y")]
    pub row: u32,
}

impl GridCoordinate {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Which naming convention produced an [`ImageRecord`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchPattern {
    /// `<item>/<item>.png`
    Plain,
    /// `<item>/<item>/*.png`
    Variants,
    /// `<item>/<scale>x/<item>.png`
    PrescaledPlain,
    /// `<item>/<scale>x/<item>/*.png`
    PrescaledVariants,
}

impl MatchPattern {
    /// All patterns in discovery priority order.
    pub const ALL: [MatchPattern; 4] = [
        MatchPattern::Plain,
        MatchPattern::Variants,
        MatchPattern::PrescaledPlain,
        MatchPattern::PrescaledVariants,
    ];

    pub fn is_variant(self) -> bool {
        matches!(self, MatchPattern::Variants | MatchPattern::PrescaledVariants)
    }

    pub fn is_prescaled(self) -> bool {
        matches!(
            self,
            MatchPattern::PrescaledPlain | MatchPattern::PrescaledVariants
        )
    }
}

/// One discoverable source image. Created by discovery and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub atlas_name: String,
    pub item_name: String,
    /// Set for images found under an item's variant directory (file stem).
    pub variant_name: Option<String>,
    pub path: PathBuf,
    pub scale: u32,
    /// True if the source is already rendered at `scale` and must not be resized.
    pub prescaled: bool,
    pub pattern: MatchPattern,
}

impl ImageRecord {
    /// Display key: `item` or `item/variant`.
    pub fn key(&self) -> String {
        match &self.variant_name {
            Some(v) => format!("{}/{}", self.item_name, v),
            None => self.item_name.clone(),
        }
    }
}

/// Atlas descriptor record as declared to the runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasMetadata {
    /// Directory name under the uncombined root.
    pub name: String,
    /// `atlas_<name>`
    pub key: String,
    /// `atlas_<name>.png`
    pub output_filename: String,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl AtlasMetadata {
    pub fn new(name: &str, cell_size: (u32, u32)) -> Self {
        let key = atlas_key(name);
        Self {
            name: name.to_string(),
            output_filename: format!("{key}.png"),
            key,
            cell_width: cell_size.0,
            cell_height: cell_size.1,
        }
    }
}

/// `atlas_<name>`, used for both the runtime key and the PNG file stem.
pub fn atlas_key(name: &str) -> String {
    format!("atlas_{name}")
}

/// Everything the descriptor emitters need for one atlas (base scale only).
#[derive(Debug, Clone, Serialize)]
pub struct AtlasDescriptor {
    pub metadata: AtlasMetadata,
    /// Grid size in cells `(columns, rows)`.
    pub grid: (u32, u32),
    pub positions: PositionTree,
}
