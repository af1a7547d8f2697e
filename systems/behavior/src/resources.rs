//! Per-skill resource descriptors: animation shape, frame schedules and masks.

use std::collections::BTreeMap;

use lemmings_core::{Direction, Skill};
use lemmings_terrain::{Mask, MaskError};
use serde::Deserialize;
use thiserror::Error;

const SUPPORTED_TABLE_VERSION: u32 = 1;

/// Failures raised while loading a skill table.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The document is not valid TOML for a skill table.
    #[error("failed to parse skill table")]
    Parse(#[from] toml::de::Error),
    /// Only one document version is understood.
    #[error("unsupported skill table version {found}; expected {expected}")]
    Version {
        /// Version that was found.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
    /// A section names no known skill.
    #[error("unknown skill `{0}`")]
    UnknownSkill(String),
    /// Animations need at least one frame.
    #[error("{skill:?} has no frames")]
    NoFrames {
        /// Offending skill.
        skill: Skill,
    },
    /// A frame schedule points past the end of the animation.
    #[error("{skill:?} schedules frame {frame} but has only {frames} frames")]
    FrameOutOfRange {
        /// Offending skill.
        skill: Skill,
        /// Scheduled frame.
        frame: u32,
        /// Frames of the animation.
        frames: u32,
    },
    /// A skill that edits terrain has no mask.
    #[error("{skill:?} requires a mask")]
    MissingMask {
        /// Offending skill.
        skill: Skill,
    },
    /// A mask could not be built.
    #[error("invalid mask for {skill:?}")]
    Mask {
        /// Offending skill.
        skill: Skill,
        /// Underlying failure.
        #[source]
        source: MaskError,
    },
}

/// Playback mode of an animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    /// Wraps to the first frame.
    Loop,
    /// Stops on the last frame and reports completion.
    Once,
}

/// Mask together with the offset of its top-left corner from the foot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedMask {
    mask: Mask,
    offset_x: i32,
    offset_y: i32,
}

impl PlacedMask {
    /// Places a mask relative to the foot.
    #[must_use]
    pub const fn new(mask: Mask, offset_x: i32, offset_y: i32) -> Self {
        Self {
            mask,
            offset_x,
            offset_y,
        }
    }

    /// Stamp pattern.
    #[must_use]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Level position of the mask's top-left corner for a foot position.
    #[must_use]
    pub const fn origin(&self, foot_x: i32, foot_y: i32) -> (i32, i32) {
        (foot_x + self.offset_x, foot_y + self.offset_y)
    }

    fn mirrored(&self) -> Self {
        let width = i32::try_from(self.mask.width()).unwrap_or(i32::MAX);
        Self {
            mask: self.mask.mirrored(),
            offset_x: -(self.offset_x + width - 1),
            offset_y: self.offset_y,
        }
    }
}

/// Masks for both facings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectedMasks {
    left: PlacedMask,
    right: PlacedMask,
}

impl DirectedMasks {
    /// Uses `right` for right-facing agents and its mirror image for left-facing ones.
    #[must_use]
    pub fn mirrored_from(right: PlacedMask) -> Self {
        Self {
            left: right.mirrored(),
            right,
        }
    }

    /// Uses distinct masks per facing.
    #[must_use]
    pub const fn new(left: PlacedMask, right: PlacedMask) -> Self {
        Self { left, right }
    }

    /// Mask for the facing.
    #[must_use]
    pub const fn get(&self, direction: Direction) -> &PlacedMask {
        match direction {
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }
}

/// Immutable descriptor shared by every agent in one skill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillResource {
    /// Frames of the animation.
    pub frames: u32,
    /// Playback mode.
    pub animation: Animation,
    /// Foot position inside the sprite.
    pub foot: (i32, i32),
    /// Interval of the frame trigger; zero disables it.
    pub mask_step: u32,
    /// Frames on which the skill stamps its erase mask.
    pub erase_frames: Vec<u32>,
    /// Frames on which the skill moves by `advance`.
    pub advance_frames: Vec<u32>,
    /// Movement per advance, with `x` along the facing.
    pub advance: (i32, i32),
    masks: Option<DirectedMasks>,
    indestructible: Option<DirectedMasks>,
}

static FALLBACK: SkillResource = SkillResource {
    frames: 1,
    animation: Animation::Loop,
    foot: (0, 0),
    mask_step: 0,
    erase_frames: Vec::new(),
    advance_frames: Vec::new(),
    advance: (0, 0),
    masks: None,
    indestructible: None,
};

impl SkillResource {
    /// Creates a descriptor without masks or frame schedules.
    #[must_use]
    pub const fn new(frames: u32, animation: Animation, foot: (i32, i32)) -> Self {
        Self {
            frames,
            animation,
            foot,
            mask_step: 0,
            erase_frames: Vec::new(),
            advance_frames: Vec::new(),
            advance: (0, 0),
            masks: None,
            indestructible: None,
        }
    }

    /// Sets the trigger interval.
    #[must_use]
    pub fn with_mask_step(mut self, mask_step: u32) -> Self {
        self.mask_step = mask_step;
        self
    }

    /// Sets the erase and advance schedules.
    #[must_use]
    pub fn with_schedule(
        mut self,
        erase_frames: Vec<u32>,
        advance_frames: Vec<u32>,
        advance: (i32, i32),
    ) -> Self {
        self.erase_frames = erase_frames;
        self.advance_frames = advance_frames;
        self.advance = advance;
        self
    }

    /// Attaches the terrain mask.
    #[must_use]
    pub fn with_masks(mut self, masks: DirectedMasks) -> Self {
        self.masks = Some(masks);
        self
    }

    /// Attaches the indestructibility probe mask.
    #[must_use]
    pub fn with_indestructible(mut self, masks: DirectedMasks) -> Self {
        self.indestructible = Some(masks);
        self
    }

    fn with_built_masks(mut self, masks: Option<DirectedMasks>) -> Self {
        self.masks = masks;
        self
    }

    fn with_built_indestructible(mut self, masks: Option<DirectedMasks>) -> Self {
        self.indestructible = masks;
        self
    }

    /// Terrain mask for the facing.
    #[must_use]
    pub fn mask(&self, direction: Direction) -> Option<&PlacedMask> {
        self.masks.as_ref().map(|masks| masks.get(direction))
    }

    /// Indestructibility probe mask for the facing.
    #[must_use]
    pub fn indestructible(&self, direction: Direction) -> Option<&PlacedMask> {
        self.indestructible.as_ref().map(|masks| masks.get(direction))
    }

    /// Position of `frame` in the erase schedule.
    #[must_use]
    pub fn erase_slot(&self, frame: u32) -> Option<usize> {
        self.erase_frames.iter().position(|candidate| *candidate == frame)
    }

    /// Whether the skill moves on `frame`.
    #[must_use]
    pub fn advances_on(&self, frame: u32) -> bool {
        self.advance_frames.contains(&frame)
    }
}

/// Resource descriptors of every skill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillTable {
    entries: BTreeMap<Skill, SkillResource>,
}

impl Default for SkillTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl SkillTable {
    /// Built-in descriptors.
    #[must_use]
    pub fn standard() -> Self {
        let entries = Skill::ALL
            .into_iter()
            .map(|skill| (skill, standard_resource(skill)))
            .collect();
        Self { entries }
    }

    /// Starts from the built-in table and overrides the skills named in the
    /// document.
    ///
    /// ```toml
    /// version = 1
    ///
    /// [skills.Digger]
    /// frames = 8
    /// mask_step = 4
    ///
    /// [skills.Digger.mask]
    /// offset = [-4, 0]
    /// frames = [["#########", "#########"]]
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ResourceError> {
        let document: TableDocument = toml::from_str(text)?;
        if document.version != SUPPORTED_TABLE_VERSION {
            return Err(ResourceError::Version {
                found: document.version,
                expected: SUPPORTED_TABLE_VERSION,
            });
        }
        let mut table = Self::standard();
        for (name, entry) in document.skills {
            let skill = parse_skill_name(&name)?;
            let merged = entry.merge_into(skill, table.get(skill).clone())?;
            let _ = table.entries.insert(skill, merged);
        }
        table.validate()?;
        Ok(table)
    }

    /// Descriptor of a skill.
    #[must_use]
    pub fn get(&self, skill: Skill) -> &SkillResource {
        self.entries.get(&skill).unwrap_or(&FALLBACK)
    }

    /// Replaces the descriptor of a skill.
    pub fn insert(&mut self, skill: Skill, resource: SkillResource) -> Result<(), ResourceError> {
        let previous = self.entries.insert(skill, resource);
        if let Err(error) = self.validate() {
            match previous {
                Some(previous) => {
                    let _ = self.entries.insert(skill, previous);
                }
                None => {
                    let _ = self.entries.remove(&skill);
                }
            }
            return Err(error);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ResourceError> {
        for (skill, resource) in &self.entries {
            let skill = *skill;
            if resource.frames == 0 {
                return Err(ResourceError::NoFrames { skill });
            }
            let scheduled = resource.erase_frames.iter().chain(&resource.advance_frames);
            if let Some(frame) = scheduled.copied().find(|frame| *frame >= resource.frames) {
                return Err(ResourceError::FrameOutOfRange {
                    skill,
                    frame,
                    frames: resource.frames,
                });
            }
        }
        for skill in MASKED_SKILLS {
            if self.get(skill).masks.is_none() {
                return Err(ResourceError::MissingMask { skill });
            }
        }
        if self.get(Skill::Miner).indestructible.is_none() {
            return Err(ResourceError::MissingMask { skill: Skill::Miner });
        }
        Ok(())
    }
}

const MASKED_SKILLS: [Skill; 7] = [
    Skill::Digger,
    Skill::Basher,
    Skill::Miner,
    Skill::Builder,
    Skill::Stopper,
    Skill::Bomber,
    Skill::BomberStopper,
];

fn parse_skill_name(name: &str) -> Result<Skill, ResourceError> {
    Skill::ALL
        .into_iter()
        .find(|skill| format!("{skill:?}") == name)
        .ok_or_else(|| ResourceError::UnknownSkill(name.to_owned()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableDocument {
    version: u32,
    #[serde(default)]
    skills: BTreeMap<String, SkillEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SkillEntry {
    frames: Option<u32>,
    animation: Option<Animation>,
    foot: Option<(i32, i32)>,
    mask_step: Option<u32>,
    erase_frames: Option<Vec<u32>>,
    advance_frames: Option<Vec<u32>>,
    advance: Option<(i32, i32)>,
    mask: Option<MaskEntry>,
    indestructible: Option<MaskEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaskEntry {
    offset: (i32, i32),
    frames: Vec<Vec<String>>,
    left: Option<Box<MaskEntry>>,
}

impl MaskEntry {
    fn build(&self, skill: Skill) -> Result<DirectedMasks, ResourceError> {
        let right = self.place(skill)?;
        match &self.left {
            Some(left) => Ok(DirectedMasks::new(left.place(skill)?, right)),
            None => Ok(DirectedMasks::mirrored_from(right)),
        }
    }

    fn place(&self, skill: Skill) -> Result<PlacedMask, ResourceError> {
        let mask = Mask::from_rows(self.frames.as_slice())
            .map_err(|source| ResourceError::Mask { skill, source })?;
        Ok(PlacedMask::new(mask, self.offset.0, self.offset.1))
    }
}

impl SkillEntry {
    fn merge_into(
        self,
        skill: Skill,
        mut resource: SkillResource,
    ) -> Result<SkillResource, ResourceError> {
        if let Some(frames) = self.frames {
            resource.frames = frames;
        }
        if let Some(animation) = self.animation {
            resource.animation = animation;
        }
        if let Some(foot) = self.foot {
            resource.foot = foot;
        }
        if let Some(mask_step) = self.mask_step {
            resource.mask_step = mask_step;
        }
        if let Some(erase_frames) = self.erase_frames {
            resource.erase_frames = erase_frames;
        }
        if let Some(advance_frames) = self.advance_frames {
            resource.advance_frames = advance_frames;
        }
        if let Some(advance) = self.advance {
            resource.advance = advance;
        }
        if let Some(mask) = &self.mask {
            resource.masks = Some(mask.build(skill)?);
        }
        if let Some(mask) = &self.indestructible {
            resource.indestructible = Some(mask.build(skill)?);
        }
        Ok(resource)
    }
}

fn mask_from_fn(
    width: u32,
    height: u32,
    frames: u32,
    offset: (i32, i32),
    active: impl Fn(u32, u32, u32) -> bool,
) -> Option<DirectedMasks> {
    Mask::from_fn(width, height, frames, active)
        .map(|mask| DirectedMasks::mirrored_from(PlacedMask::new(mask, offset.0, offset.1)))
        .map_err(|error| log::error!("built-in mask rejected: {error}"))
        .ok()
}

fn standard_resource(skill: Skill) -> SkillResource {
    match skill {
        Skill::Walker => SkillResource::new(8, Animation::Loop, (8, 16)),
        Skill::Faller => SkillResource::new(4, Animation::Loop, (8, 16)),
        Skill::Climber => SkillResource::new(8, Animation::Loop, (8, 16)).with_schedule(
            Vec::new(),
            vec![3, 4, 5, 6],
            (0, -1),
        ),
        Skill::ClimberToWalker => SkillResource::new(8, Animation::Once, (8, 16)),
        Skill::FloaterStart => SkillResource::new(8, Animation::Once, (8, 16)),
        Skill::Floater => SkillResource::new(16, Animation::Loop, (8, 16)).with_mask_step(16),
        Skill::Jumper => SkillResource::new(1, Animation::Loop, (8, 16)),
        Skill::Digger => SkillResource::new(16, Animation::Loop, (8, 12))
            .with_mask_step(8)
            .with_schedule(Vec::new(), Vec::new(), (0, 2))
            .with_built_masks(mask_from_fn(9, 2, 1, (-4, 0), |_, _, _| true)),
        Skill::Basher => SkillResource::new(32, Animation::Loop, (8, 16))
            .with_schedule(
                vec![2, 3, 4, 5, 18, 19, 20, 21],
                vec![11, 12, 13, 14, 15, 27, 28, 29, 30, 31],
                (1, 0),
            )
            .with_built_masks(mask_from_fn(12, 10, 4, (1, -10), |frame, x, y| {
                let reach = 3 * (frame + 1);
                let rounded = (y == 0 || y == 9) && x + 1 >= reach;
                x < reach && !rounded
            })),
        Skill::Miner => SkillResource::new(24, Animation::Loop, (8, 13))
            .with_schedule(vec![1], vec![3, 15], (2, 1))
            .with_built_masks(mask_from_fn(6, 13, 1, (1, -10), miner_shape))
            .with_built_indestructible(mask_from_fn(7, 13, 1, (1, -10), miner_shape)),
        Skill::Builder => SkillResource::new(16, Animation::Loop, (8, 13))
            .with_mask_step(16)
            .with_schedule(Vec::new(), Vec::new(), (2, -1))
            .with_built_masks(mask_from_fn(6, 1, 1, (0, -1), |_, _, _| true)),
        Skill::BuilderEnd => SkillResource::new(1, Animation::Once, (8, 13)),
        Skill::Stopper => SkillResource::new(16, Animation::Loop, (8, 16))
            .with_built_masks(mask_from_fn(12, 12, 1, (-5, -11), |_, _, _| true)),
        Skill::Bomber | Skill::BomberStopper => SkillResource::new(16, Animation::Once, (8, 16))
            .with_built_masks(mask_from_fn(16, 20, 1, (-8, -14), explosion_shape)),
        Skill::Splatter => SkillResource::new(16, Animation::Once, (8, 10)),
        Skill::Drowning => SkillResource::new(16, Animation::Once, (8, 10)),
        Skill::Trapped => SkillResource::new(8, Animation::Once, (8, 16)),
        Skill::Exiting => SkillResource::new(8, Animation::Once, (8, 13)),
    }
}

/// Diagonal cut whose floor drops one pixel every two columns.
fn miner_shape(_frame: u32, x: u32, y: u32) -> bool {
    y <= 9 + (x + 1) / 2
}

fn explosion_shape(_frame: u32, x: u32, y: u32) -> bool {
    let dx = i64::from(x) * 2 - 15;
    let dy = i64::from(y) * 2 - 19;
    dx * dx * 400 + dy * dy * 256 <= 400 * 256
}
