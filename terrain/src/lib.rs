#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Destructible level terrain.
//!
//! [`Terrain`] owns the attribute [`Stencil`] the simulation reads and edits,
//! the backing image and minimap that mirror every edit, and the level objects
//! whose identifiers are embedded in stencil cells. Edits are driven by
//! [`Mask`] stamps; nothing outside this crate writes pixels directly.

pub mod mask;
pub mod objects;
mod pixels;
pub mod stencil;

use lemmings_core::ObjectId;
use thiserror::Error;

pub use mask::{EraseReport, Mask, MaskError};
pub use objects::{LevelObject, ObjectArea, ObjectKind};
pub use pixels::{Minimap, PixelBuffer};
pub use stencil::{attr, Stencil};

/// Failures raised while assembling a level's terrain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    /// Object identifiers are limited to sixteen bits.
    #[error("level holds more than {max} objects")]
    TooManyObjects {
        /// Largest supported object count.
        max: usize,
    },
}

/// Stencil, backing image, minimap and objects of a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terrain {
    stencil: Stencil,
    image: PixelBuffer,
    minimap: Minimap,
    background: u32,
    objects: Vec<LevelObject>,
}

impl Terrain {
    /// Creates empty terrain painted with the background colour.
    #[must_use]
    pub fn new(width: u32, height: u32, background: u32, minimap_scale: u32) -> Self {
        Self {
            stencil: Stencil::new(width, height),
            image: PixelBuffer::filled(width, height, background),
            minimap: Minimap::new(width, height, minimap_scale, background),
            background,
            objects: Vec::new(),
        }
    }

    /// Width of the level in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.stencil.width()
    }

    /// Height of the level in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.stencil.height()
    }

    /// Attribute grid.
    #[must_use]
    pub fn stencil(&self) -> &Stencil {
        &self.stencil
    }

    /// Mutable attribute grid.
    pub fn stencil_mut(&mut self) -> &mut Stencil {
        &mut self.stencil
    }

    /// Backing image.
    #[must_use]
    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    /// Down-sampled backing image.
    #[must_use]
    pub fn minimap(&self) -> &Minimap {
        &self.minimap
    }

    /// Objects in placement order; the index is the object id.
    #[must_use]
    pub fn objects(&self) -> &[LevelObject] {
        &self.objects
    }

    /// Object with the provided id.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&LevelObject> {
        self.objects.get(usize::from(id.get()))
    }

    /// Mutable object with the provided id.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut LevelObject> {
        self.objects.get_mut(usize::from(id.get()))
    }

    /// Adds terrain attributes and paints a rectangle.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, bits: u32, color: u32) {
        for (column, row) in rect_cells(x, y, width, height) {
            if !self.stencil.contains(column, row) {
                continue;
            }
            self.stencil.or(column, row, bits);
            self.paint_pixel(column, row, color);
        }
    }

    /// Places an object and stamps its attributes into the stencil.
    ///
    /// Exits and traps tag their trigger area. No-dig arrows tag only the
    /// brick pixels covered by an opaque sprite pixel.
    pub fn add_object(&mut self, object: LevelObject) -> Result<ObjectId, TerrainError> {
        let max = usize::from(u16::MAX);
        let raw = u16::try_from(self.objects.len())
            .map_err(|_| TerrainError::TooManyObjects { max })?;
        let id = ObjectId::new(raw);

        let area_bits = object.kind().area_bits();
        if area_bits != attr::EMPTY {
            let area = object.area();
            for (column, row) in rect_cells(area.x, area.y, area.width, area.height) {
                self.stencil.tag(column, row, area_bits, id);
            }
        }

        let arrow_bits = object.kind().arrow_bits();
        if arrow_bits != attr::EMPTY {
            let (origin_x, origin_y) = object.position();
            let sprite = object.sprite();
            for (column, row) in rect_cells(0, 0, sprite.width(), sprite.height()) {
                let opaque = sprite.get(column, row).is_some_and(|pixel| pixel != 0);
                let (level_x, level_y) = (origin_x + column, origin_y + row);
                if opaque && self.stencil.get(level_x, level_y) & attr::BRICK != 0 {
                    self.stencil.tag(level_x, level_y, arrow_bits, id);
                }
            }
        }

        log::debug!("placed {:?} object {}", object.kind(), raw);
        self.objects.push(object);
        Ok(id)
    }

    /// Advances the busy period of every triggerable object.
    pub fn tick_objects(&mut self) {
        for object in &mut self.objects {
            object.tick();
        }
    }

    pub(crate) fn paint_pixel(&mut self, x: i32, y: i32, color: u32) {
        self.image.set(x, y, color);
        let _ = self.minimap.plot(x, y, color);
    }

    pub(crate) fn clear_pixel(&mut self, x: i32, y: i32) {
        self.paint_pixel(x, y, self.background);
    }

    pub(crate) fn erase_object_pixel(&mut self, id: ObjectId, x: i32, y: i32) {
        if let Some(object) = self.object_mut(id) {
            object.erase_pixel(x, y);
        }
    }
}

fn rect_cells(x: i32, y: i32, width: u32, height: u32) -> impl Iterator<Item = (i32, i32)> {
    let width = i32::try_from(width).unwrap_or(i32::MAX);
    let height = i32::try_from(height).unwrap_or(i32::MAX);
    (0..height).flat_map(move |row| (0..width).map(move |column| (x + column, y + row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROCK: u32 = 0xff80_4020;

    #[test]
    fn fill_rect_sets_bits_and_paints() {
        let mut terrain = Terrain::new(8, 8, 0, 2);
        terrain.fill_rect(6, 6, 4, 4, attr::BRICK, ROCK);

        assert!(terrain.stencil().is_walk_on(7, 7));
        assert_eq!(terrain.stencil().count(attr::BRICK), 4);
        assert_eq!(terrain.image().get(6, 6), Some(ROCK));
        assert_eq!(terrain.minimap().buffer().get(3, 3), Some(ROCK));
    }

    #[test]
    fn exit_tags_its_area_with_its_id() {
        let mut terrain = Terrain::new(32, 32, 0, 1);
        let decoration = LevelObject::new(ObjectKind::Decoration, 0, 0, PixelBuffer::new(2, 2));
        let exit = LevelObject::new(ObjectKind::Exit, 4, 4, PixelBuffer::new(8, 8)).with_area(
            ObjectArea {
                x: 2,
                y: 6,
                width: 3,
                height: 2,
            },
        );

        assert_eq!(terrain.add_object(decoration), Ok(ObjectId::new(0)));
        let id = terrain.add_object(exit);

        assert_eq!(id, Ok(ObjectId::new(1)));
        assert_eq!(terrain.stencil().count(attr::EXIT), 6);
        assert_eq!(terrain.stencil().object_at(6, 10), Some(ObjectId::new(1)));
        assert_eq!(terrain.stencil().object_at(4, 4), None);
    }

    #[test]
    fn arrows_tag_only_covered_brick() {
        let mut terrain = Terrain::new(16, 16, 0, 1);
        terrain.fill_rect(0, 8, 16, 8, attr::BRICK, ROCK);
        let mut sprite = PixelBuffer::filled(4, 12, 5);
        sprite.set(0, 10, 0);
        let arrow = LevelObject::new(ObjectKind::NoDigLeft, 2, 2, sprite);

        let id = terrain.add_object(arrow);

        assert!(id.is_ok());
        assert_eq!(terrain.stencil().count(attr::NO_DIG_LEFT), 4 * 6 - 1);
        assert_eq!(terrain.stencil().get(2, 4) & attr::NO_DIG, 0);
        assert_ne!(terrain.stencil().get(3, 12) & attr::NO_DIG_OBJECT, 0);
    }
}
