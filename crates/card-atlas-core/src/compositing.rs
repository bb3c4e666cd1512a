use image::{ImageReader, Rgba, RgbaImage, imageops};
use std::path::Path;
use tracing::debug;

use crate::config::{CellSizePolicy, ResizeFilter};
use crate::error::{AtlasError, Result};
use crate::grid::GridLayout;
use crate::model::{ImageRecord, Rect};

/// Copy `src` into `canvas` with its top-left corner at (dx, dy), clipped to `clip`
/// and to the canvas. Pixels are overwritten, alpha included; nothing is blended.
///
/// - outlines: if true, draw a red 1px outline around the clip rectangle
pub fn blit_rgba(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    clip: Rect,
    outlines: bool,
) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    let rw = sw.min(clip.w);
    let rh = sh.min(clip.h);

    for yy in 0..rh {
        for xx in 0..rw {
            if dx + xx < cw && dy + yy < ch {
                canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(xx, yy));
            }
        }
    }

    if outlines && clip.w > 0 && clip.h > 0 {
        let red = Rgba([255, 0, 0, 255]);
        for xx in clip.x..=clip.right() {
            for yy in [clip.y, clip.bottom()] {
                if xx < cw && yy < ch {
                    canvas.put_pixel(xx, yy, red);
                }
            }
        }
        for yy in clip.y..=clip.bottom() {
            for xx in [clip.x, clip.right()] {
                if xx < cw && yy < ch {
                    canvas.put_pixel(xx, yy, red);
                }
            }
        }
    }
}

/// Decodes a source image to RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgba8())
}

/// `(w * factor, h * factor)`, or `InvalidInput` if either side overflows.
pub(crate) fn scaled_size(size: (u32, u32), factor: u32) -> Result<(u32, u32)> {
    match (size.0.checked_mul(factor), size.1.checked_mul(factor)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(AtlasError::InvalidInput(format!(
            "{}x{} scaled by {factor} does not fit in u32",
            size.0, size.1
        ))),
    }
}

/// Scales `img` by an integer multiplier. Scale 1 returns the image unchanged.
pub fn scale_image(img: RgbaImage, scale: u32, filter: ResizeFilter) -> Result<RgbaImage> {
    if scale <= 1 {
        return Ok(img);
    }
    let (w, h) = scaled_size(img.dimensions(), scale)?;
    Ok(imageops::resize(&img, w, h, filter.to_filter_type()))
}

/// Loads the pixels for one record at its scale: prescaled sources are used as-is, everything
/// else is resized by the scale multiplier. The file is closed before this returns.
pub fn load_record(record: &ImageRecord, filter: ResizeFilter) -> Result<RgbaImage> {
    let img = load_rgba(&record.path)?;
    if record.prescaled {
        Ok(img)
    } else {
        scale_image(img, record.scale, filter)
    }
}

/// Transparent canvas for one atlas page whose cell size is fixed by the first image.
pub struct GridCanvas {
    layout: GridLayout,
    cell: (u32, u32),
    policy: CellSizePolicy,
    outlines: bool,
    rgba: RgbaImage,
}

impl GridCanvas {
    pub fn new(
        layout: GridLayout,
        cell: (u32, u32),
        policy: CellSizePolicy,
        outlines: bool,
    ) -> Result<Self> {
        let (w, h) = layout.canvas_size(cell)?;
        debug!(columns = layout.columns, rows = layout.rows, w, h, "allocating atlas canvas");
        Ok(Self {
            layout,
            cell,
            policy,
            outlines,
            rgba: RgbaImage::new(w, h),
        })
    }

    pub fn cell_size(&self) -> (u32, u32) {
        self.cell
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Pastes `img` into cell `index`; `origin` is only used for error reporting.
    pub fn paste(&mut self, index: u32, img: &RgbaImage, origin: &Path) -> Result<Rect> {
        let found = img.dimensions();
        if found != self.cell && self.policy == CellSizePolicy::Strict {
            return Err(AtlasError::CellSizeMismatch {
                path: origin.to_path_buf(),
                expected: self.cell,
                found,
            });
        }
        let rect = self.layout.pixel_rect(index, self.cell).ok_or_else(|| {
            AtlasError::InvalidInput(format!(
                "cell {index} is outside a grid of {} images",
                self.layout.count
            ))
        })?;
        // Mismatched sizes are cropped to the cell (or leave it partly transparent).
        blit_rgba(img, &mut self.rgba, rect.x, rect.y, rect, self.outlines);
        Ok(rect)
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.rgba
    }
}

/// Lays out in-memory images on a grid of at most `max_width` columns.
/// The cell size is taken from the first image.
pub fn compose_grid(
    images: &[RgbaImage],
    max_width: u32,
    policy: CellSizePolicy,
    outlines: bool,
) -> Result<GridCanvas> {
    let first = images
        .first()
        .ok_or_else(|| AtlasError::InvalidInput("no images to compose".into()))?;
    let layout = GridLayout::new(images.len() as u32, max_width);
    let mut canvas = GridCanvas::new(layout, first.dimensions(), policy, outlines)?;
    for (i, img) in images.iter().enumerate() {
        canvas.paste(i as u32, img, Path::new(&format!("#{i}")))?;
    }
    Ok(canvas)
}
