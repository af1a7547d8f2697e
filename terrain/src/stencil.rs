//! Per-pixel terrain attribute grid.

use lemmings_core::{Direction, ObjectId};

/// Attribute bits stored in every stencil cell.
///
/// The walk-on class, material, no-dig, stopper and trap/exit groups occupy
/// disjoint bit ranges so they can be combined and masked independently. The
/// owning object id lives in the upper sixteen bits.
pub mod attr {
    use lemmings_core::{Direction, ObjectId};

    /// Nothing to stand on.
    pub const EMPTY: u32 = 0;
    /// Regular destructible terrain.
    pub const BRICK: u32 = 1 << 0;
    /// Marks a builder step; always combined with [`BRICK`].
    pub const STAIR: u32 = 1 << 1;
    /// Walk-on class group.
    pub const WALK_ON: u32 = BRICK | STAIR;
    /// Indestructible material.
    pub const STEEL: u32 = 1 << 2;
    /// Terrain that cannot be removed while facing left.
    pub const NO_DIG_LEFT: u32 = 1 << 3;
    /// Terrain that cannot be removed while facing right.
    pub const NO_DIG_RIGHT: u32 = 1 << 4;
    /// Both directional no-dig flags.
    pub const NO_DIG: u32 = NO_DIG_LEFT | NO_DIG_RIGHT;
    /// Stopper zone that turns right-walking agents around.
    pub const STOPPER_LEFT: u32 = 1 << 5;
    /// Stopper zone that turns left-walking agents around.
    pub const STOPPER_RIGHT: u32 = 1 << 6;
    /// Both stopper flags.
    pub const STOPPER: u32 = STOPPER_LEFT | STOPPER_RIGHT;
    /// Water.
    pub const TRAP_DROWN: u32 = 1 << 7;
    /// Trap that kills the agent in place.
    pub const TRAP_DIE: u32 = 1 << 8;
    /// Trap whose own animation replaces the agent.
    pub const TRAP_REPLACE: u32 = 1 << 9;
    /// Every trap class.
    pub const TRAP: u32 = TRAP_DROWN | TRAP_DIE | TRAP_REPLACE;
    /// Exit trigger area.
    pub const EXIT: u32 = 1 << 10;
    /// Pixel belongs to a directional no-dig arrow object.
    pub const NO_DIG_OBJECT: u32 = 1 << 11;
    /// Attributes that carry an owning object id.
    pub const OBJECT_TAGGED: u32 = TRAP | EXIT | NO_DIG_OBJECT;
    /// Shift of the owning object id.
    pub const OBJECT_ID_SHIFT: u32 = 16;
    /// Bits holding the owning object id.
    pub const OBJECT_ID: u32 = 0xffff << OBJECT_ID_SHIFT;

    /// No-dig flag that blocks removal while facing `direction`.
    #[must_use]
    pub const fn no_dig_for(direction: Direction) -> u32 {
        match direction {
            Direction::Left => NO_DIG_LEFT,
            Direction::Right => NO_DIG_RIGHT,
        }
    }

    /// Bits that encode `id` in the owning object field.
    #[must_use]
    pub const fn object_bits(id: ObjectId) -> u32 {
        (id.get() as u32) << OBJECT_ID_SHIFT
    }
}

/// Dense grid of attribute bitmasks, one per level pixel.
///
/// Reads outside the grid return [`attr::EMPTY`]; writes outside the grid
/// are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stencil {
    width: u32,
    height: u32,
    cells: Vec<u32>,
}

impl Stencil {
    /// Creates an empty stencil covering `width` × `height` pixels.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![attr::EMPTY; capacity],
        }
    }

    /// Width of the grid in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the grid in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the pixel lies inside the grid.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Attribute bits of a pixel.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> u32 {
        self.index(x, y)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(attr::EMPTY)
    }

    /// Replaces the attribute bits of a pixel.
    pub fn set(&mut self, x: i32, y: i32, value: u32) {
        if let Some(cell) = self.cell_mut(x, y) {
            *cell = value;
        }
    }

    /// Adds attribute bits to a pixel.
    pub fn or(&mut self, x: i32, y: i32, bits: u32) {
        if let Some(cell) = self.cell_mut(x, y) {
            *cell |= bits;
        }
    }

    /// Removes attribute bits from a pixel.
    pub fn clear_bits(&mut self, x: i32, y: i32, bits: u32) {
        if let Some(cell) = self.cell_mut(x, y) {
            *cell &= !bits;
        }
    }

    /// Reports whether an agent can stand on the pixel.
    #[must_use]
    pub fn is_walk_on(&self, x: i32, y: i32) -> bool {
        self.get(x, y) & attr::WALK_ON != attr::EMPTY
    }

    /// Owning object of a pixel tagged with a trap, exit or arrow attribute.
    #[must_use]
    pub fn object_at(&self, x: i32, y: i32) -> Option<ObjectId> {
        let cell = self.get(x, y);
        if cell & attr::OBJECT_TAGGED == 0 {
            return None;
        }
        let raw = (cell & attr::OBJECT_ID) >> attr::OBJECT_ID_SHIFT;
        u16::try_from(raw).ok().map(ObjectId::new)
    }

    /// Tags a pixel with `bits` owned by `id`, replacing any previous owner.
    pub fn tag(&mut self, x: i32, y: i32, bits: u32, id: ObjectId) {
        if let Some(cell) = self.cell_mut(x, y) {
            *cell = (*cell & !attr::OBJECT_ID) | bits | attr::object_bits(id);
        }
    }

    /// Reports whether the pixel blocks removal by an agent facing `direction`.
    #[must_use]
    pub fn is_indestructible_for(&self, x: i32, y: i32, direction: Direction) -> bool {
        self.get(x, y) & (attr::STEEL | attr::no_dig_for(direction)) != 0
    }

    /// Resets every pixel to [`attr::EMPTY`].
    pub fn clear(&mut self) {
        self.cells.fill(attr::EMPTY);
    }

    /// Number of pixels whose attributes intersect `bits`.
    #[must_use]
    pub fn count(&self, bits: u32) -> usize {
        self.cells.iter().filter(|cell| **cell & bits != 0).count()
    }

    fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut u32> {
        let index = self.index(x, y)?;
        self.cells.get_mut(index)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_reads_are_empty_and_writes_ignored() {
        let mut stencil = Stencil::new(4, 3);
        stencil.set(-1, 0, attr::BRICK);
        stencil.set(4, 0, attr::BRICK);
        stencil.or(0, 3, attr::STEEL);

        assert_eq!(stencil.get(-1, 0), attr::EMPTY);
        assert_eq!(stencil.get(0, 3), attr::EMPTY);
        assert_eq!(stencil.count(u32::MAX), 0);
    }

    #[test]
    fn or_and_clear_touch_only_requested_bits() {
        let mut stencil = Stencil::new(2, 2);
        stencil.set(1, 1, attr::BRICK | attr::STEEL);
        stencil.or(1, 1, attr::STOPPER_LEFT);
        stencil.clear_bits(1, 1, attr::STEEL);

        assert_eq!(stencil.get(1, 1), attr::BRICK | attr::STOPPER_LEFT);
    }

    #[test]
    fn clearing_an_already_clear_bit_is_idempotent() {
        let mut stencil = Stencil::new(1, 1);
        stencil.set(0, 0, attr::BRICK);
        stencil.clear_bits(0, 0, attr::STOPPER);
        let once = stencil.clone();
        stencil.clear_bits(0, 0, attr::STOPPER);

        assert_eq!(stencil, once);
        assert_eq!(stencil.get(0, 0), attr::BRICK);
    }

    #[test]
    fn stair_counts_as_walk_on() {
        let mut stencil = Stencil::new(1, 1);
        stencil.set(0, 0, attr::STAIR);
        assert!(stencil.is_walk_on(0, 0));
    }

    #[test]
    fn tag_records_owner_and_keeps_material() {
        let mut stencil = Stencil::new(3, 1);
        stencil.set(2, 0, attr::BRICK);
        stencil.tag(2, 0, attr::EXIT, ObjectId::new(5));
        stencil.tag(2, 0, attr::TRAP_DIE, ObjectId::new(9));

        assert_eq!(stencil.object_at(2, 0), Some(ObjectId::new(9)));
        assert!(stencil.is_walk_on(2, 0));
        assert_eq!(stencil.object_at(1, 0), None);
    }

    #[test]
    fn no_dig_blocks_only_matching_direction() {
        let mut stencil = Stencil::new(1, 1);
        stencil.set(0, 0, attr::BRICK | attr::NO_DIG_LEFT);
        assert!(stencil.is_indestructible_for(0, 0, Direction::Left));
        assert!(!stencil.is_indestructible_for(0, 0, Direction::Right));
    }
}
