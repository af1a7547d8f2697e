//! Stamp patterns that edit terrain.
//!
//! A [`Mask`] holds one boolean pattern per animation frame. Every operation
//! takes the level position of the pattern's top-left corner, wraps the frame
//! index and silently skips pixels that fall outside the level.

use thiserror::Error;

use crate::{stencil::attr, Terrain};

/// Failures raised while building a mask.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    /// A mask needs at least one frame with at least one pixel.
    #[error("mask has no pixels")]
    Empty,
    /// Every frame must have the dimensions of the first one.
    #[error("frame {frame} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        /// Offending frame.
        frame: usize,
        /// Width of the offending frame.
        width: usize,
        /// Height of the offending frame.
        height: usize,
        /// Width of the first frame.
        expected_width: usize,
        /// Height of the first frame.
        expected_height: usize,
    },
    /// Rows use `#` for active and `.` for inactive pixels.
    #[error("unexpected character {found:?} in frame {frame}, row {row}")]
    UnknownCell {
        /// Offending frame.
        frame: usize,
        /// Offending row.
        row: usize,
        /// Character that was found.
        found: char,
    },
    /// A stacked bitmap must divide evenly into frames.
    #[error("bitmap height {height} is not divisible into {frames} frames")]
    UnevenFrames {
        /// Height of the bitmap.
        height: u32,
        /// Requested frame count.
        frames: u32,
    },
}

/// Outcome of an erase stamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EraseReport {
    /// Active pixels that hit protected terrain and were left untouched.
    pub indestructible: u32,
    /// Largest indestructible count the frame tolerates.
    pub threshold: u32,
    /// Pixels whose walk-on attributes were cleared.
    pub erased: u32,
}

impl EraseReport {
    /// Whether too much protected terrain was hit for the action to continue.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        self.indestructible > self.threshold
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct MaskFrame {
    pixels: Vec<bool>,
    active: u32,
    threshold: u32,
}

impl MaskFrame {
    fn new(pixels: Vec<bool>) -> Self {
        let active = u32::try_from(pixels.iter().filter(|pixel| **pixel).count()).unwrap_or(u32::MAX);
        Self {
            pixels,
            active,
            threshold: active / 3,
        }
    }
}

/// Immutable per-frame stamp pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    frames: Vec<MaskFrame>,
}

impl Mask {
    /// Builds a mask from frames of text rows, `#` marking active pixels.
    pub fn from_rows<F, R>(frames: &[F]) -> Result<Self, MaskError>
    where
        F: AsRef<[R]>,
        R: AsRef<str>,
    {
        let mut expected: Option<(usize, usize)> = None;
        let mut parsed = Vec::with_capacity(frames.len());
        for (frame_index, frame) in frames.iter().enumerate() {
            let rows = frame.as_ref();
            let height = rows.len();
            let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
            let mut pixels = Vec::with_capacity(width * height);
            for (row_index, row) in rows.iter().enumerate() {
                let row = row.as_ref();
                if row.chars().count() != width {
                    return Err(MaskError::FrameSize {
                        frame: frame_index,
                        width: row.chars().count(),
                        height,
                        expected_width: width,
                        expected_height: height,
                    });
                }
                for found in row.chars() {
                    match found {
                        '#' => pixels.push(true),
                        '.' => pixels.push(false),
                        _ => {
                            return Err(MaskError::UnknownCell {
                                frame: frame_index,
                                row: row_index,
                                found,
                            })
                        }
                    }
                }
            }
            match expected {
                None => expected = Some((width, height)),
                Some((expected_width, expected_height))
                    if expected_width != width || expected_height != height =>
                {
                    return Err(MaskError::FrameSize {
                        frame: frame_index,
                        width,
                        height,
                        expected_width,
                        expected_height,
                    });
                }
                Some(_) => {}
            }
            parsed.push(pixels);
        }
        let (width, height) = expected.ok_or(MaskError::Empty)?;
        Self::from_frames(width, height, parsed)
    }

    /// Builds a mask from a bitmap holding `frames` equally tall frames
    /// stacked vertically; opaque pixels are active.
    pub fn from_bitmap(bitmap: &crate::PixelBuffer, frames: u32) -> Result<Self, MaskError> {
        if frames == 0 || bitmap.height() % frames != 0 {
            return Err(MaskError::UnevenFrames {
                height: bitmap.height(),
                frames,
            });
        }
        let frame_height = bitmap.height() / frames;
        let width = usize::try_from(bitmap.width()).map_err(|_| MaskError::Empty)?;
        let height = usize::try_from(frame_height).map_err(|_| MaskError::Empty)?;
        let per_frame = width * height;
        let parsed = bitmap
            .pixels()
            .chunks(per_frame.max(1))
            .map(|chunk| chunk.iter().map(|pixel| *pixel != 0).collect())
            .collect();
        Self::from_frames(width, height, parsed)
    }

    /// Builds a mask by evaluating `active(frame, x, y)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        frames: u32,
        active: impl Fn(u32, u32, u32) -> bool,
    ) -> Result<Self, MaskError> {
        let parsed = (0..frames)
            .map(|frame| {
                (0..height)
                    .flat_map(|y| (0..width).map(move |x| (x, y)))
                    .map(|(x, y)| active(frame, x, y))
                    .collect()
            })
            .collect();
        let width = usize::try_from(width).map_err(|_| MaskError::Empty)?;
        let height = usize::try_from(height).map_err(|_| MaskError::Empty)?;
        Self::from_frames(width, height, parsed)
    }

    fn from_frames(width: usize, height: usize, frames: Vec<Vec<bool>>) -> Result<Self, MaskError> {
        if width == 0 || height == 0 || frames.is_empty() {
            return Err(MaskError::Empty);
        }
        let width_u32 = u32::try_from(width).map_err(|_| MaskError::Empty)?;
        let height_u32 = u32::try_from(height).map_err(|_| MaskError::Empty)?;
        Ok(Self {
            width: width_u32,
            height: height_u32,
            frames: frames.into_iter().map(MaskFrame::new).collect(),
        })
    }

    /// Horizontally flipped copy, used for the opposite facing.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let width = usize::try_from(self.width).unwrap_or(0);
        let frames = self
            .frames
            .iter()
            .map(|frame| {
                let pixels = frame
                    .pixels
                    .chunks(width.max(1))
                    .flat_map(|row| row.iter().rev().copied())
                    .collect();
                MaskFrame::new(pixels)
            })
            .collect();
        Self {
            width: self.width,
            height: self.height,
            frames,
        }
    }

    /// Width of every frame.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of every frame.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Active pixels of a frame.
    #[must_use]
    pub fn active_pixels(&self, frame: usize) -> u32 {
        self.frame(frame).map_or(0, |frame| frame.active)
    }

    /// Indestructible pixels a frame tolerates before an erase aborts.
    #[must_use]
    pub fn threshold(&self, frame: usize) -> u32 {
        self.frame(frame).map_or(0, |frame| frame.threshold)
    }

    /// Removes walk-on terrain under the active pixels.
    ///
    /// Cells intersecting `protect` are counted and skipped. Every other cell
    /// loses its walk-on attributes and its image pixel is repainted with the
    /// background colour. Erasing a cell covered by a no-dig arrow also
    /// erases that pixel of the arrow's sprite.
    pub fn erase(&self, terrain: &mut Terrain, x: i32, y: i32, frame: usize, protect: u32) -> EraseReport {
        let mut report = EraseReport {
            threshold: self.threshold(frame),
            ..EraseReport::default()
        };
        for (px, py) in self.cells(terrain, x, y, frame) {
            let cell = terrain.stencil().get(px, py);
            if cell & protect != 0 {
                report.indestructible += 1;
                continue;
            }
            let mut cleared = attr::WALK_ON;
            if cell & attr::NO_DIG_OBJECT != 0 {
                if let Some(id) = terrain.stencil().object_at(px, py) {
                    terrain.erase_object_pixel(id, px, py);
                }
                cleared |= attr::NO_DIG | attr::NO_DIG_OBJECT;
            }
            if cell & attr::WALK_ON != 0 {
                report.erased += 1;
            }
            terrain.stencil_mut().clear_bits(px, py, cleared);
            terrain.clear_pixel(px, py);
        }
        if report.aborted() {
            log::trace!(
                "erase at ({x}, {y}) hit {} protected pixels (threshold {})",
                report.indestructible,
                report.threshold
            );
        }
        report
    }

    /// Lays a stair step: empty cells under active pixels become brick and
    /// stair and take `color`. Cells that already hold brick are untouched.
    pub fn paint_step(&self, terrain: &mut Terrain, x: i32, y: i32, frame: usize, color: u32) {
        for (px, py) in self.cells(terrain, x, y, frame) {
            if terrain.stencil().get(px, py) & attr::BRICK != 0 {
                continue;
            }
            terrain.stencil_mut().or(px, py, attr::BRICK | attr::STAIR);
            terrain.paint_pixel(px, py, color);
        }
    }

    /// Stamps a stopper zone from the first frame: pixels at or left of
    /// `foot_mid_x` turn right-walking agents, the others left-walking ones.
    pub fn set_stopper(&self, terrain: &mut Terrain, x: i32, y: i32, foot_mid_x: i32) {
        for (px, py) in self.cells(terrain, x, y, 0) {
            let bits = if px <= foot_mid_x {
                attr::STOPPER_LEFT
            } else {
                attr::STOPPER_RIGHT
            };
            terrain.stencil_mut().or(px, py, bits);
        }
    }

    /// Clears `bits` from every cell under the active pixels.
    pub fn clear_type(&self, terrain: &mut Terrain, x: i32, y: i32, frame: usize, bits: u32) {
        for (px, py) in self.cells(terrain, x, y, frame) {
            terrain.stencil_mut().clear_bits(px, py, bits);
        }
    }

    /// Whether any cell under the active pixels intersects `bits`.
    #[must_use]
    pub fn check_type(&self, terrain: &Terrain, x: i32, y: i32, frame: usize, bits: u32) -> bool {
        self.cells(terrain, x, y, frame)
            .any(|(px, py)| terrain.stencil().get(px, py) & bits != 0)
    }

    fn frame(&self, frame: usize) -> Option<&MaskFrame> {
        let count = self.frames.len();
        if count == 0 {
            return None;
        }
        self.frames.get(frame % count)
    }

    /// Level positions of the active pixels of a frame that lie inside the level.
    fn cells<'a>(
        &'a self,
        terrain: &Terrain,
        x: i32,
        y: i32,
        frame: usize,
    ) -> impl Iterator<Item = (i32, i32)> + 'a {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let level_width = i32::try_from(terrain.width()).unwrap_or(i32::MAX);
        let level_height = i32::try_from(terrain.height()).unwrap_or(i32::MAX);
        self.frame(frame)
            .into_iter()
            .flat_map(|frame| frame.pixels.iter().enumerate())
            .filter(|(_, active)| **active)
            .filter_map(move |(index, _)| {
                let index = i32::try_from(index).ok()?;
                let (px, py) = (x + index % width, y + index / width);
                (px >= 0 && py >= 0 && px < level_width && py < level_height).then_some((px, py))
            })
    }
}
