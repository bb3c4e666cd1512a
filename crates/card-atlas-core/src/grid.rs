use crate::error::{AtlasError, Result};
use crate::model::{GridCoordinate, Rect};
use serde::{Deserialize, Serialize};

/// Default number of cells per atlas row.
pub const DEFAULT_MAX_GRID_WIDTH: u32 = 8;

/// Row-major grid geometry for `count` equally sized cells.
///
/// `columns = min(count, max_width)`, `rows = ceil(count / max_width)`. Cell `i` lands at
/// `(i % columns, i / columns)`; the coordinates are independent of pixel size, so the same
/// layout is shared by every resolution of an atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridLayout {
    pub count: u32,
    pub columns: u32,
    pub rows: u32,
}

impl GridLayout {
    /// `max_width` must be non-zero; `GeneratorConfig::validate` enforces this.
    pub fn new(count: u32, max_width: u32) -> Self {
        debug_assert!(max_width > 0, "max grid width must be non-zero");
        let max_width = max_width.max(1);
        Self {
            count,
            columns: count.min(max_width),
            rows: count.div_ceil(max_width),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Cell of the image with ordinal `index`. Returns `None` past the last cell.
    pub fn coordinate(&self, index: u32) -> Option<GridCoordinate> {
        if index >= self.count {
            return None;
        }
        Some(GridCoordinate::new(
            index % self.columns,
            index / self.columns,
        ))
    }

    /// All cells in ordinal order.
    pub fn coordinates(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        (0..self.count).filter_map(move |i| self.coordinate(i))
    }

    /// Pixel rectangle of cell `index` for cells of size `cell`.
    /// `None` past the last cell or when the origin does not fit in `u32`.
    pub fn pixel_rect(&self, index: u32, cell: (u32, u32)) -> Option<Rect> {
        let c = self.coordinate(index)?;
        Some(Rect::new(
            c.column.checked_mul(cell.0)?,
            c.row.checked_mul(cell.1)?,
            cell.0,
            cell.1,
        ))
    }

    /// Canvas size in pixels: `(columns * cell_w, rows * cell_h)`.
    pub fn canvas_size(&self, cell: (u32, u32)) -> Result<(u32, u32)> {
        match (
            self.columns.checked_mul(cell.0),
            self.rows.checked_mul(cell.1),
        ) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(AtlasError::InvalidInput(format!(
                "{}x{} cells of {}x{} px overflow the canvas size",
                self.columns, self.rows, cell.0, cell.1
            ))),
        }
    }

    /// Fraction of grid cells holding an image (the last row may be partial).
    pub fn occupancy(&self) -> f64 {
        let total = self.columns as u64 * self.rows as u64;
        if total == 0 {
            0.0
        } else {
            self.count as u64 as f64 / total as f64
        }
    }
}

/// A keyed cell assignment produced by [`place`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement<K = String> {
    pub key: K,
    pub cell: GridCoordinate,
    pub frame: Rect,
}

/// Assigns every key a cell in ordinal order, returning the layout and the placements.
pub fn place<K, I>(keys: I, max_width: u32, cell: (u32, u32)) -> (GridLayout, Vec<Placement<K>>)
where
    I: IntoIterator<Item = K>,
    I::IntoIter: ExactSizeIterator,
{
    let keys = keys.into_iter();
    let layout = GridLayout::new(keys.len() as u32, max_width);
    let placements = keys
        .enumerate()
        .filter_map(|(i, key)| {
            let i = i as u32;
            Some(Placement {
                key,
                cell: layout.coordinate(i)?,
                frame: layout.pixel_rect(i, cell)?,
            })
        })
        .collect();
    (layout, placements)
}
