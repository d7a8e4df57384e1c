//! Mask sampling.
//!
//! The tracer only needs a read-only view with a width, a height and a
//! per-pixel sample. [`Mask`] is that view; [`Bitmap`] is an owned boolean
//! grid, `GrayImage` samples directly, and [`Crop`] restricts any mask to a
//! sub-rectangle (usually the selection's bounding box).

use std::path::Path;

use image::{GrayImage, ImageReader};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use tracing::debug;

use crate::config::ThresholdMethod;
use crate::error::TraceError;
use crate::geom::BoundingBox;

/// Samples at or above this are selected.
pub const SELECTED: u8 = 128;

/// Read-only access to a selection mask, row 0 at the top.
pub trait Mask {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Selection strength at `(row, col)`. Callers stay in bounds.
    fn sample(&self, row: u32, col: u32) -> u8;

    /// True if the pixel belongs to the selection.
    fn is_black(&self, row: u32, col: u32) -> bool {
        self.sample(row, col) >= SELECTED
    }
}

impl<M: Mask + ?Sized> Mask for &M {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn sample(&self, row: u32, col: u32) -> u8 {
        (**self).sample(row, col)
    }

    fn is_black(&self, row: u32, col: u32) -> bool {
        (**self).is_black(row, col)
    }
}

impl Mask for GrayImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn sample(&self, row: u32, col: u32) -> u8 {
        self.get_pixel(col, row).0[0]
    }
}

/// Owned boolean mask, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<bool>,
    width: u32,
    height: u32,
}

impl Bitmap {
    /// An empty (all unselected) mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![false; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Build a mask by evaluating `f(row, col)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bitmap = Self::new(width, height);
        for row in 0..height {
            for col in 0..width {
                bitmap.set(row, col, f(row, col));
            }
        }
        bitmap
    }

    /// Snapshot any mask into an owned bitmap.
    pub fn from_mask<M: Mask>(mask: &M) -> Self {
        Self::from_fn(mask.width(), mask.height(), |row, col| {
            mask.is_black(row, col)
        })
    }

    /// Create from a grayscale image (samples >= 128 are selected).
    pub fn from_gray(img: &GrayImage) -> Self {
        Self::from_mask(img)
    }

    fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    /// Pixel at `(row, col)`. Out of bounds reads as unselected.
    pub fn get(&self, row: u32, col: u32) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        self.data[self.index(row, col)]
    }

    /// Set a pixel. Out-of-bounds writes are ignored.
    pub fn set(&mut self, row: u32, col: u32, value: bool) {
        if row < self.height && col < self.width {
            let i = self.index(row, col);
            self.data[i] = value;
        }
    }
}

impl Mask for Bitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn sample(&self, row: u32, col: u32) -> u8 {
        if self.get(row, col) {
            255
        } else {
            0
        }
    }

    fn is_black(&self, row: u32, col: u32) -> bool {
        self.get(row, col)
    }
}

/// A rectangular window onto another mask.
#[derive(Debug, Clone, Copy)]
pub struct Crop<M> {
    inner: M,
    bounds: BoundingBox<u32>,
}

impl<M: Mask> Crop<M> {
    /// Restrict `inner` to `bounds` (inclusive rows and columns), clamped
    /// to the mask. `None` when `inner` has no pixels.
    pub fn new(inner: M, bounds: BoundingBox<u32>) -> Option<Self> {
        let last_row = inner.height().checked_sub(1)?;
        let last_col = inner.width().checked_sub(1)?;
        let bounds = BoundingBox {
            min_row: bounds.min_row.min(last_row),
            max_row: bounds.max_row.min(last_row),
            min_col: bounds.min_col.min(last_col),
            max_col: bounds.max_col.min(last_col),
        };
        Some(Self { inner, bounds })
    }

    /// Crop to the selection's bounding box; `None` when nothing is selected.
    pub fn to_selection(inner: M) -> Option<Self> {
        let bounds = selection_bounds(&inner)?;
        Some(Self { inner, bounds })
    }

    pub fn bounds(&self) -> BoundingBox<u32> {
        self.bounds
    }
}

impl<M: Mask> Mask for Crop<M> {
    fn width(&self) -> u32 {
        self.bounds.width()
    }

    fn height(&self) -> u32 {
        self.bounds.height()
    }

    fn sample(&self, row: u32, col: u32) -> u8 {
        self.inner
            .sample(row + self.bounds.min_row, col + self.bounds.min_col)
    }

    fn is_black(&self, row: u32, col: u32) -> bool {
        self.inner
            .is_black(row + self.bounds.min_row, col + self.bounds.min_col)
    }
}

/// Bounding box of all selected pixels, or `None` for an empty mask.
pub fn selection_bounds<M: Mask>(mask: &M) -> Option<BoundingBox<u32>> {
    let (w, h) = (mask.width(), mask.height());
    BoundingBox::from_cells(
        (0..h)
            .flat_map(|row| (0..w).map(move |col| (row, col)))
            .filter(|&(row, col)| mask.is_black(row, col)),
    )
}

/// Load an image and convert it to a binary mask image.
///
/// Dark pixels become selected (255), light pixels unselected (0);
/// `invert` swaps the two.
pub fn load_and_threshold(
    path: &Path,
    method: ThresholdMethod,
    invert: bool,
) -> Result<GrayImage, TraceError> {
    let img = ImageReader::open(path)
        .map_err(|e| TraceError::ImageLoad(e.to_string()))?
        .decode()
        .map_err(|e| TraceError::ImageLoad(e.to_string()))?
        .into_luma8();

    let level = match method {
        ThresholdMethod::Fixed(t) => t,
        ThresholdMethod::Otsu => {
            let t = otsu_level(&img);
            debug!(level = t, "otsu threshold");
            t
        }
    };

    let mut binary = threshold(&img, level, ThresholdType::BinaryInverted);

    if invert {
        for pixel in binary.pixels_mut() {
            pixel.0[0] = 255 - pixel.0[0];
        }
    }

    Ok(binary)
}
