//! Level objects that own stencil regions: entrances, exits, traps and
//! directional no-dig arrows.

use lemmings_core::SoundEffect;

use crate::{pixels::PixelBuffer, stencil::attr};

/// Role of a level object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Purely visual.
    Decoration,
    /// Hatch agents are released from.
    Entrance,
    /// Area that rescues eligible agents.
    Exit,
    /// Water.
    TrapDrown,
    /// Trap that kills in place.
    TrapDie,
    /// Trap that plays its own animation in place of the agent.
    TrapReplace,
    /// Arrow forbidding removal of the terrain it covers while facing left.
    NoDigLeft,
    /// Arrow forbidding removal of the terrain it covers while facing right.
    NoDigRight,
}

impl ObjectKind {
    /// Attribute bits stamped over the object's trigger area.
    #[must_use]
    pub const fn area_bits(self) -> u32 {
        match self {
            Self::Exit => attr::EXIT,
            Self::TrapDrown => attr::TRAP_DROWN,
            Self::TrapDie => attr::TRAP_DIE,
            Self::TrapReplace => attr::TRAP_REPLACE,
            Self::Decoration | Self::Entrance | Self::NoDigLeft | Self::NoDigRight => attr::EMPTY,
        }
    }

    /// Attribute bits stamped over brick covered by the object's sprite.
    #[must_use]
    pub const fn arrow_bits(self) -> u32 {
        match self {
            Self::NoDigLeft => attr::NO_DIG_LEFT | attr::NO_DIG_OBJECT,
            Self::NoDigRight => attr::NO_DIG_RIGHT | attr::NO_DIG_OBJECT,
            _ => attr::EMPTY,
        }
    }
}

/// Rectangle relative to an object's origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectArea {
    /// Left edge offset.
    pub x: i32,
    /// Top edge offset.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Fire-once-after-N-touches guard of a triggerable object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerGuard {
    touches_required: u32,
    touches: u32,
    busy_ticks: u32,
    busy: u32,
}

impl TriggerGuard {
    /// Creates an idle guard.
    #[must_use]
    pub const fn new(touches_required: u32, busy_ticks: u32) -> Self {
        Self {
            touches_required,
            touches: 0,
            busy_ticks,
            busy: 0,
        }
    }

    /// Whether the object is still playing its triggered animation.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy > 0
    }

    fn touch(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.touches = self.touches.saturating_add(1);
        if self.touches < self.touches_required.max(1) {
            return false;
        }
        self.touches = 0;
        self.busy = self.busy_ticks;
        true
    }

    fn tick(&mut self) {
        self.busy = self.busy.saturating_sub(1);
    }
}

/// Object placed in a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelObject {
    kind: ObjectKind,
    x: i32,
    y: i32,
    sprite: PixelBuffer,
    area: Option<ObjectArea>,
    sound: Option<u16>,
    guard: Option<TriggerGuard>,
}

impl LevelObject {
    /// Creates an object whose top-left corner sits at `(x, y)`.
    #[must_use]
    pub fn new(kind: ObjectKind, x: i32, y: i32, sprite: PixelBuffer) -> Self {
        Self {
            kind,
            x,
            y,
            sprite,
            area: None,
            sound: None,
            guard: None,
        }
    }

    /// Attaches a sound resource played when the object fires.
    #[must_use]
    pub fn with_sound(mut self, sound: u16) -> Self {
        self.sound = Some(sound);
        self
    }

    /// Makes the object triggerable.
    #[must_use]
    pub fn with_trigger(mut self, touches_required: u32, busy_ticks: u32) -> Self {
        self.guard = Some(TriggerGuard::new(touches_required, busy_ticks));
        self
    }

    /// Restricts the trigger area; defaults to the sprite bounds.
    #[must_use]
    pub fn with_area(mut self, area: ObjectArea) -> Self {
        self.area = Some(area);
        self
    }

    /// Role of the object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Top-left corner in level space.
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Sprite of the object, minus any pixels destroyed during play.
    #[must_use]
    pub fn sprite(&self) -> &PixelBuffer {
        &self.sprite
    }

    /// Trigger area in level space.
    #[must_use]
    pub fn area(&self) -> ObjectArea {
        let local = self.area.unwrap_or(ObjectArea {
            x: 0,
            y: 0,
            width: self.sprite.width(),
            height: self.sprite.height(),
        });
        ObjectArea {
            x: self.x + local.x,
            y: self.y + local.y,
            ..local
        }
    }

    /// Sound played when the object fires.
    #[must_use]
    pub fn sound(&self) -> Option<SoundEffect> {
        self.sound.map(SoundEffect::Object)
    }

    /// Whether the object needs touches before it fires.
    #[must_use]
    pub const fn is_triggerable(&self) -> bool {
        self.guard.is_some()
    }

    /// Whether the object is busy with a previous trigger.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.guard.as_ref().is_some_and(TriggerGuard::is_busy)
    }

    /// Registers a touch, returning `true` if the object fired this time.
    ///
    /// Objects without a guard fire on every touch.
    pub fn trigger(&mut self) -> bool {
        self.guard.as_mut().map_or(true, TriggerGuard::touch)
    }

    /// Advances the busy period by one tick.
    pub fn tick(&mut self) {
        if let Some(guard) = self.guard.as_mut() {
            guard.tick();
        }
    }

    /// Clears the sprite pixel covering the level position.
    pub fn erase_pixel(&mut self, level_x: i32, level_y: i32) {
        self.sprite.set(level_x - self.x, level_y - self.y, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trap() -> LevelObject {
        LevelObject::new(ObjectKind::TrapDie, 10, 20, PixelBuffer::filled(4, 4, 1))
    }

    #[test]
    fn guard_fires_after_required_touches_then_stays_busy() {
        let mut object = trap().with_trigger(2, 3);

        assert!(!object.trigger());
        assert!(object.trigger());
        assert!(object.is_busy());
        assert!(!object.trigger());

        for _ in 0..3 {
            object.tick();
        }
        assert!(!object.is_busy());
        assert!(!object.trigger());
        assert!(object.trigger());
    }

    #[test]
    fn unguarded_objects_fire_every_touch() {
        let mut object = trap();
        assert!(!object.is_triggerable());
        assert!(object.trigger());
        assert!(object.trigger());
    }

    #[test]
    fn area_defaults_to_sprite_bounds_in_level_space() {
        let object = trap();
        assert_eq!(
            object.area(),
            ObjectArea {
                x: 10,
                y: 20,
                width: 4,
                height: 4
            }
        );

        let narrowed = trap().with_area(ObjectArea {
            x: 1,
            y: 2,
            width: 2,
            height: 1,
        });
        assert_eq!(narrowed.area().x, 11);
        assert_eq!(narrowed.area().y, 22);
    }

    #[test]
    fn erase_pixel_clears_sprite_in_object_space() {
        let mut object = trap();
        object.erase_pixel(11, 21);
        assert_eq!(object.sprite().get(1, 1), Some(0));
        assert_eq!(object.sprite().opaque_count(), 15);
    }

    #[test]
    fn sound_is_addressed_by_resource_id() {
        let object = trap().with_sound(4);
        assert_eq!(object.sound(), Some(SoundEffect::Object(4)));
    }
}
