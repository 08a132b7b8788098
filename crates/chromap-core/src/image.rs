//! Float image buffers.
//!
//! [`Image<N>`] holds `N` interleaved `f32` channels per pixel. Two aliases
//! cover everything the remapping kernels touch:
//! - [`Plane`] - single-channel luminance (`Image<1>`)
//! - [`ColorImage`] - RGBA color (`Image<4>`)
//!
//! # Bounds and windows
//!
//! Every buffer carries two rectangles:
//!
//! - **bounds**: the defined extent of the image (its bounding box). Reads
//!   outside it resolve to the nearest edge sample, see [`crate::boundary`].
//! - **window**: the part of the image whose samples are actually stored.
//!
//! A whole image has `window == bounds`. A host that supplies only a tile plus
//! its halo hands over a [`crop`](Image::crop) with a smaller window but the
//! original bounds, so edge clamping still refers to the real image edge.
//!
//! # Memory Layout
//!
//! Row-major, top to bottom, channels interleaved:
//!
//! ```text
//! [R G B A R G B A ...]  ← window row 0
//! [R G B A R G B A ...]  ← window row 1
//! ```
//!
//! # Usage
//!
//! ```rust
//! use chromap_core::{ColorImage, Rect};
//!
//! let mut img = ColorImage::new(Rect::from_size(4, 4));
//! img.set_pixel(1, 2, [1.0, 0.5, 0.25, 1.0]);
//! assert_eq!(img.pixel(1, 2)[1], 0.5);
//!
//! let tile = img.crop(Rect::new(0, 1, 3, 3)).unwrap();
//! assert_eq!(tile.bounds(), img.bounds());
//! assert_eq!(tile.pixel(1, 2), [1.0, 0.5, 0.25, 1.0]);
//! ```

use crate::{Error, Rect, Result};

/// Owned `f32` image buffer with `N` channels per pixel.
#[derive(Clone, PartialEq)]
pub struct Image<const N: usize> {
    /// Defined extent of the image
    bounds: Rect,
    /// Extent of the stored samples
    window: Rect,
    /// Interleaved samples covering `window`
    data: Vec<f32>,
}

/// Single-channel luminance plane.
pub type Plane = Image<1>;

/// Four-channel RGBA color image.
pub type ColorImage = Image<4>;

impl<const N: usize> Image<N> {
    /// Creates a zero-filled image covering `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            window: bounds,
            data: vec![0.0; bounds.area() as usize * N],
        }
    }

    /// Creates a zero-filled image at origin (0, 0).
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(Rect::from_size(width, height))
    }

    /// Creates an image filled with a single pixel value.
    pub fn filled(bounds: Rect, pixel: [f32; N]) -> Self {
        let mut data = Vec::with_capacity(bounds.area() as usize * N);
        for _ in 0..bounds.area() {
            data.extend_from_slice(&pixel);
        }
        Self {
            bounds,
            window: bounds,
            data,
        }
    }

    /// Wraps existing samples covering `bounds`.
    ///
    /// # Errors
    ///
    /// [`Error::DataLength`] if `data.len() != bounds.area() * N`.
    pub fn from_data(bounds: Rect, data: Vec<f32>) -> Result<Self> {
        Self::from_window(bounds, bounds, data)
    }

    /// Wraps samples covering `window` of an image whose extent is `bounds`.
    ///
    /// # Errors
    ///
    /// [`Error::DataLength`] if `data.len() != window.area() * N`.
    pub fn from_window(bounds: Rect, window: Rect, data: Vec<f32>) -> Result<Self> {
        let expected = window.area() as usize * N;
        if data.len() != expected {
            return Err(Error::DataLength {
                expected,
                got: data.len(),
                window,
            });
        }
        Ok(Self {
            bounds,
            window,
            data,
        })
    }

    /// Defined extent (bounding box) of the image.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Extent of the stored samples.
    #[inline]
    pub fn window(&self) -> Rect {
        self.window
    }

    /// Width of the bounding box.
    #[inline]
    pub fn width(&self) -> u32 {
        self.bounds.width
    }

    /// Height of the bounding box.
    #[inline]
    pub fn height(&self) -> u32 {
        self.bounds.height
    }

    /// Number of channels per pixel.
    #[inline]
    pub const fn channels(&self) -> usize {
        N
    }

    /// Returns `true` if no samples are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Raw interleaved samples of the window.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw samples of the window.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        let lx = (x - self.window.x) as usize;
        let ly = (y - self.window.y) as usize;
        (ly * self.window.width as usize + lx) * N
    }

    /// Gets the pixel at absolute coordinates.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the window.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> [f32; N] {
        assert!(
            self.window.contains(x, y),
            "pixel ({x}, {y}) outside window {}",
            self.window
        );
        let idx = self.offset(x, y);
        let mut px = [0.0; N];
        px.copy_from_slice(&self.data[idx..idx + N]);
        px
    }

    /// Sets the pixel at absolute coordinates.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the window.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: [f32; N]) {
        assert!(
            self.window.contains(x, y),
            "pixel ({x}, {y}) outside window {}",
            self.window
        );
        let idx = self.offset(x, y);
        self.data[idx..idx + N].copy_from_slice(&pixel);
    }

    /// Returns the stored samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside the window.
    #[inline]
    pub fn row(&self, y: i32) -> &[f32] {
        assert!(y >= self.window.y && y < self.window.bottom(), "row {y} outside window {}", self.window);
        let stride = self.window.width as usize * N;
        let start = (y - self.window.y) as usize * stride;
        &self.data[start..start + stride]
    }

    /// Returns the stored samples of row `y` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside the window.
    #[inline]
    pub fn row_mut(&mut self, y: i32) -> &mut [f32] {
        assert!(y >= self.window.y && y < self.window.bottom(), "row {y} outside window {}", self.window);
        let stride = self.window.width as usize * N;
        let start = (y - self.window.y) as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Writes `samples` into row `y` starting at column `x`.
    ///
    /// # Errors
    ///
    /// [`Error::RegionUnavailable`] if the span is outside the window,
    /// [`Error::DataLength`] if `samples` is not a whole number of pixels.
    pub fn write_row(&mut self, y: i32, x: i32, samples: &[f32]) -> Result<()> {
        if samples.len() % N != 0 {
            return Err(Error::DataLength {
                expected: samples.len() / N * N,
                got: samples.len(),
                window: Rect::new(x, y, (samples.len() / N) as u32, 1),
            });
        }
        let span = Rect::new(x, y, (samples.len() / N) as u32, 1);
        if !self.window.contains_rect(&span) {
            return Err(Error::RegionUnavailable {
                needed: span,
                window: self.window,
            });
        }
        if span.is_empty() {
            return Ok(());
        }
        let idx = self.offset(x, y);
        self.data[idx..idx + samples.len()].copy_from_slice(samples);
        Ok(())
    }

    /// Copies out `rect` as a new buffer with the same bounds.
    ///
    /// # Errors
    ///
    /// [`Error::RegionUnavailable`] if `rect` is not inside the window.
    pub fn crop(&self, rect: Rect) -> Result<Self> {
        if !self.window.contains_rect(&rect) {
            return Err(Error::RegionUnavailable {
                needed: rect,
                window: self.window,
            });
        }
        let mut data = Vec::with_capacity(rect.area() as usize * N);
        if !rect.is_empty() {
            for y in rect.y..rect.bottom() {
                let idx = self.offset(rect.x, y);
                data.extend_from_slice(&self.data[idx..idx + rect.width as usize * N]);
            }
        }
        Ok(Self {
            bounds: self.bounds,
            window: rect,
            data,
        })
    }

    /// Copies every stored pixel of `src` into this buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] if the two images have different bounds
    /// - [`Error::RegionUnavailable`] if `src.window()` is not inside this window
    pub fn paste(&mut self, src: &Image<N>) -> Result<()> {
        if src.bounds != self.bounds {
            return Err(Error::invalid_dimensions(
                src.bounds.width,
                src.bounds.height,
                format!("cannot paste into an image with bounds {}", self.bounds),
            ));
        }
        let rect = src.window;
        if !self.window.contains_rect(&rect) {
            return Err(Error::RegionUnavailable {
                needed: rect,
                window: self.window,
            });
        }
        if rect.is_empty() {
            return Ok(());
        }
        for y in rect.y..rect.bottom() {
            let idx = self.offset(rect.x, y);
            self.data[idx..idx + rect.width as usize * N].copy_from_slice(src.row(y));
        }
        Ok(())
    }

    /// Iterates all stored pixels as `(x, y, pixel)`.
    pub fn pixels(&self) -> impl Iterator<Item = (i32, i32, [f32; N])> + '_ {
        self.window.iter_coords().map(move |(x, y)| (x, y, self.pixel(x, y)))
    }

    /// Builds an `M`-channel image from every stored pixel, keeping bounds
    /// and window.
    ///
    /// ```rust
    /// use chromap_core::{luminance, ColorImage, Plane, Rect};
    ///
    /// let img = ColorImage::filled(Rect::from_size(2, 2), [0.5, 0.5, 0.5, 1.0]);
    /// let luma: Plane = img.map_channels(|[r, g, b, _]| [luminance([r, g, b])]);
    /// assert_eq!(luma.pixel(1, 1), [0.5]);
    /// ```
    pub fn map_channels<const M: usize, F>(&self, mut f: F) -> Image<M>
    where
        F: FnMut([f32; N]) -> [f32; M],
    {
        let mut data = Vec::with_capacity(self.window.area() as usize * M);
        for chunk in self.data.chunks_exact(N) {
            let mut px = [0.0; N];
            px.copy_from_slice(chunk);
            data.extend_from_slice(&f(px));
        }
        Image {
            bounds: self.bounds,
            window: self.window,
            data,
        }
    }

    /// Applies a function to every stored pixel in place.
    pub fn map_pixels<F>(&mut self, mut f: F)
    where
        F: FnMut([f32; N]) -> [f32; N],
    {
        for chunk in self.data.chunks_exact_mut(N) {
            let mut px = [0.0; N];
            px.copy_from_slice(chunk);
            chunk.copy_from_slice(&f(px));
        }
    }
}

impl<const N: usize> std::fmt::Debug for Image<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("channels", &N)
            .field("bounds", &self.bounds)
            .field("window", &self.window)
            .finish()
    }
}
