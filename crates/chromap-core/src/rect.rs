//! Rectangle type for region bookkeeping.
//!
//! Regions in chromap use signed origins: a halo around an output tile that
//! touches the image edge extends to `x = -1` / `y = -1`, and the clamp-to-edge
//! boundary policy resolves those reads later.
//!
//! # Coordinate System
//!
//! ```text
//! (0,0) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │  Region  │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! Left/top edges are inclusive, right/bottom edges exclusive.
//!
//! # Usage
//!
//! ```rust
//! use chromap_core::Rect;
//!
//! let rect = Rect::new(10, 20, 100, 50);
//! assert!(rect.contains(15, 25));
//!
//! let halo = rect.enlarge(1);
//! assert_eq!(halo, Rect::new(9, 19, 102, 52));
//! ```

use serde::{Deserialize, Serialize};

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// # Invariants
///
/// - A rectangle with zero width or height is empty
/// - [`enlarge`](Self::enlarge) of a non-empty rectangle adds exactly `n`
///   pixels on every side
///
/// # Example
///
/// ```rust
/// use chromap_core::Rect;
///
/// let rect = Rect::new(-1, -1, 5, 5);
/// assert_eq!(rect.right(), 4);
/// assert_eq!(rect.bottom(), 4);
/// assert_eq!(rect.area(), 25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// The `{0, 0, 0, 0}` rectangle.
    pub const EMPTY: Rect = Rect::new(0, 0, 0, 0);

    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at origin (0, 0) with given dimensions.
    ///
    /// ```rust
    /// use chromap_core::Rect;
    ///
    /// let rect = Rect::from_size(1920, 1080);
    /// assert_eq!((rect.x, rect.y), (0, 0));
    /// ```
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Returns the X coordinate of the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Returns the Y coordinate of the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Returns the area of the rectangle in pixels.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the point (px, py) is inside this rectangle.
    ///
    /// ```rust
    /// use chromap_core::Rect;
    ///
    /// let rect = Rect::new(10, 10, 100, 100);
    /// assert!(rect.contains(10, 10));
    /// assert!(rect.contains(109, 109));
    /// assert!(!rect.contains(110, 110));
    /// ```
    #[inline]
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns `true` if this rectangle fully contains another.
    ///
    /// An empty rectangle is contained by everything.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns `true` if this rectangle overlaps with another.
    ///
    /// Empty rectangles never overlap.
    #[inline]
    pub const fn overlaps(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns the intersection of this rectangle with another.
    ///
    /// Returns `None` if the rectangles don't overlap.
    ///
    /// ```rust
    /// use chromap_core::Rect;
    ///
    /// let a = Rect::new(0, 0, 100, 100);
    /// let b = Rect::new(50, 50, 100, 100);
    /// assert_eq!(a.intersect(&b), Some(Rect::new(50, 50, 50, 50)));
    /// ```
    #[inline]
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, (right - x) as u32, (bottom - y) as u32))
        } else {
            None
        }
    }

    /// Returns this rectangle grown by `n` pixels on every side.
    ///
    /// ```rust
    /// use chromap_core::Rect;
    ///
    /// let r = Rect::new(0, 0, 3, 3).enlarge(1);
    /// assert_eq!(r, Rect::new(-1, -1, 5, 5));
    /// ```
    #[inline]
    pub const fn enlarge(&self, n: u32) -> Rect {
        Rect::new(
            self.x - n as i32,
            self.y - n as i32,
            self.width + 2 * n,
            self.height + 2 * n,
        )
    }

    /// Returns an iterator over all (x, y) coordinates in this rectangle.
    ///
    /// Iterates row by row, left to right, top to bottom.
    ///
    /// ```rust
    /// use chromap_core::Rect;
    ///
    /// let coords: Vec<_> = Rect::new(0, 0, 2, 2).iter_coords().collect();
    /// assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    /// ```
    #[inline]
    pub fn iter_coords(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.y..self.bottom()).flat_map(move |y| (self.x..self.right()).map(move |x| (x, y)))
    }

    /// Splits this rectangle into tiles of at most `tile_w` x `tile_h`.
    ///
    /// Tiles are emitted row-major and partition the rectangle exactly.
    /// A zero tile dimension is treated as 1.
    pub fn tiles(&self, tile_w: u32, tile_h: u32) -> impl Iterator<Item = Rect> + '_ {
        let tile_w = tile_w.max(1);
        let tile_h = tile_h.max(1);
        let num_x = self.width.div_ceil(tile_w);
        let num_y = self.height.div_ceil(tile_h);

        (0..num_y).flat_map(move |ty| {
            (0..num_x).map(move |tx| {
                let ox = tx * tile_w;
                let oy = ty * tile_h;
                Rect::new(
                    self.x + ox as i32,
                    self.y + oy as i32,
                    (self.width - ox).min(tile_w),
                    (self.height - oy).min(tile_h),
                )
            })
        })
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

impl std::str::FromStr for Rect {
    type Err = String;

    /// Parses `x,y,w,h`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x,y,w,h but got '{s}'"));
        }
        let x = parts[0].parse::<i32>().map_err(|e| format!("x: {e}"))?;
        let y = parts[1].parse::<i32>().map_err(|e| format!("y: {e}"))?;
        let w = parts[2].parse::<u32>().map_err(|e| format!("width: {e}"))?;
        let h = parts[3].parse::<u32>().map_err(|e| format!("height: {e}"))?;
        Ok(Rect::new(x, y, w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10, 20, 100, 50);
        assert_eq!(r.right(), 110);
        assert_eq!(r.bottom(), 70);
        assert_eq!(r.area(), 5000);
    }

    #[test]
    fn test_rect_negative_origin() {
        let r = Rect::new(-1, -1, 3, 3);
        assert!(r.contains(-1, -1));
        assert!(r.contains(1, 1));
        assert!(!r.contains(2, 2));
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        assert_eq!(a.intersect(&b), Some(Rect::new(50, 50, 50, 50)));

        let c = Rect::new(200, 200, 50, 50);
        assert!(a.intersect(&c).is_none());

        let halo = Rect::new(-1, -1, 4, 4);
        assert_eq!(halo.intersect(&a), Some(Rect::new(0, 0, 3, 3)));
    }

    #[test]
    fn test_rect_enlarge() {
        let r = Rect::new(5, 7, 10, 1);
        let e = r.enlarge(1);
        assert_eq!(e, Rect::new(4, 6, 12, 3));
        assert_eq!(e.right() - r.right(), 1);
        assert_eq!(r.x - e.x, 1);
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::new(-1, -1, 10, 10);
        assert!(outer.contains_rect(&Rect::new(0, 0, 8, 8)));
        assert!(!outer.contains_rect(&Rect::new(0, 0, 10, 10)));
        assert!(outer.contains_rect(&Rect::EMPTY));
    }

    #[test]
    fn test_tiles_partition() {
        let r = Rect::new(2, 3, 10, 7);
        let tiles: Vec<_> = r.tiles(4, 3).collect();
        assert_eq!(tiles.len(), 3 * 3);
        let area: u64 = tiles.iter().map(Rect::area).sum();
        assert_eq!(area, r.area());
        assert_eq!(tiles[0], Rect::new(2, 3, 4, 3));
        assert_eq!(tiles[8], Rect::new(10, 9, 2, 1));
        for (i, a) in tiles.iter().enumerate() {
            assert!(r.contains_rect(a));
            for b in tiles.iter().skip(i + 1) {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_tiles_of_empty() {
        assert_eq!(Rect::EMPTY.tiles(16, 16).count(), 0);
        assert_eq!(Rect::new(0, 0, 4, 0).tiles(16, 16).count(), 0);
    }

    #[test]
    fn test_parse() {
        let r: Rect = "-1, 2, 30, 40".parse().unwrap();
        assert_eq!(r, Rect::new(-1, 2, 30, 40));
        assert!("1,2,3".parse::<Rect>().is_err());
        assert!("1,2,-3,4".parse::<Rect>().is_err());
    }
}
