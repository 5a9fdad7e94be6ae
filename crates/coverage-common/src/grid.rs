//! Pixel-space geometry: grid ranges, resolutions, and the grid-to-world
//! transform.

use crate::Envelope;
use serde::{Deserialize, Serialize};

/// The pixel-space rectangle of a coverage (width/height in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRange {
    pub width: usize,
    pub height: usize,
}

impl GridRange {
    /// Create a new grid range.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if the range is degenerate.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Per-axis pixel size in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
}

impl Resolution {
    /// Create a new resolution.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True if both axes are strictly finer (smaller pixels) than `other`.
    pub fn finer_than(&self, other: &Resolution) -> bool {
        self.x < other.x && self.y < other.y
    }

    /// True if both axes are strictly coarser (larger pixels) than `other`.
    pub fn coarser_than(&self, other: &Resolution) -> bool {
        self.x > other.x && self.y > other.y
    }
}

/// Which point of a pixel the grid-to-world transform maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelAnchor {
    /// The transform maps pixel indices to cell centers.
    #[default]
    CellCenter,
    /// The transform maps pixel indices to the upper-left cell corner.
    CellCorner,
}

/// Affine transform from pixel indices to world coordinates.
///
/// Axis-aligned: `x = origin_x + col * dx`, `y = origin_y + row * dy`,
/// with `dy` negative for the usual north-up raster orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridToWorld {
    /// World X of pixel (0, 0) at the configured anchor.
    pub origin_x: f64,
    /// World Y of pixel (0, 0) at the configured anchor.
    pub origin_y: f64,
    /// Pixel size along X.
    pub dx: f64,
    /// Pixel size along Y (negative for north-up).
    pub dy: f64,
    /// Anchor convention this transform was built with.
    pub anchor: PixelAnchor,
}

impl GridToWorld {
    /// Build a north-up transform covering `envelope` with `range` pixels.
    pub fn from_envelope(envelope: &Envelope, range: &GridRange, anchor: PixelAnchor) -> Self {
        let dx = envelope.width() / range.width as f64;
        let dy = -envelope.height() / range.height as f64;

        let (origin_x, origin_y) = match anchor {
            PixelAnchor::CellCorner => (envelope.min_x, envelope.max_y),
            PixelAnchor::CellCenter => (envelope.min_x + dx / 2.0, envelope.max_y + dy / 2.0),
        };

        Self {
            origin_x,
            origin_y,
            dx,
            dy,
            anchor,
        }
    }

    /// Re-anchor this transform by composing the half-pixel translation.
    ///
    /// Returns `self` unchanged when the anchor already matches.
    pub fn with_anchor(&self, anchor: PixelAnchor) -> Self {
        if self.anchor == anchor {
            return *self;
        }

        let (shift_x, shift_y) = match anchor {
            // corner -> center: shift into the cell
            PixelAnchor::CellCenter => (self.dx / 2.0, self.dy / 2.0),
            // center -> corner: shift back out
            PixelAnchor::CellCorner => (-self.dx / 2.0, -self.dy / 2.0),
        };

        Self {
            origin_x: self.origin_x + shift_x,
            origin_y: self.origin_y + shift_y,
            dx: self.dx,
            dy: self.dy,
            anchor,
        }
    }

    /// Convert a pixel index to world coordinates.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (self.origin_x + col * self.dx, self.origin_y + row * self.dy)
    }

    /// Convert world coordinates to fractional pixel indices.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.origin_x) / self.dx, (y - self.origin_y) / self.dy)
    }
}
