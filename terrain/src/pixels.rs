/// Dense grid of packed ARGB pixels.
///
/// Sprites treat `0` as transparent. Reads outside the grid return `None`;
/// writes outside the grid are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Creates a fully transparent buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    /// Creates a buffer where every pixel carries `color`.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            pixels: vec![color; capacity],
        }
    }

    /// Wraps existing pixels, returning `None` when the length does not match
    /// the dimensions.
    #[must_use]
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).ok()?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width of the buffer in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the buffer in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixel storage.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at the provided position.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y)
            .and_then(|index| self.pixels.get(index).copied())
    }

    /// Overwrites the pixel at the provided position.
    pub fn set(&mut self, x: i32, y: i32, color: u32) {
        if let Some(pixel) = self.index(x, y).and_then(|index| self.pixels.get_mut(index)) {
            *pixel = color;
        }
    }

    /// Fills the whole buffer with `color`.
    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Number of non-transparent pixels.
    #[must_use]
    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|pixel| **pixel != 0).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        Some(usize::try_from(row).ok()? * width + usize::try_from(column).ok()?)
    }
}

/// Down-sampled copy of the backing image.
///
/// Only level pixels lying on the sampling grid are mirrored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Minimap {
    buffer: PixelBuffer,
    scale: u32,
}

impl Minimap {
    pub(crate) fn new(level_width: u32, level_height: u32, scale: u32, color: u32) -> Self {
        let scale = scale.max(1);
        Self {
            buffer: PixelBuffer::filled(
                level_width.div_ceil(scale),
                level_height.div_ceil(scale),
                color,
            ),
            scale,
        }
    }

    /// Number of level pixels per minimap pixel along each axis.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Down-sampled pixels.
    #[must_use]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Mirrors a level pixel, reporting whether it lay on the sampling grid.
    pub(crate) fn plot(&mut self, x: i32, y: i32, color: u32) -> bool {
        let Ok(scale) = i32::try_from(self.scale) else {
            return false;
        };
        if x < 0 || y < 0 || x % scale != 0 || y % scale != 0 {
            return false;
        }
        self.buffer.set(x / scale, y / scale, color);
        true
    }
}
