#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lemmings simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values (including every
//! sound effect and particle request) for adapters and systems to react to.
//! Commands are only ever applied between ticks, so skill assignment never
//! interleaves with an in-progress [`Command::Tick`].

use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation by exactly one logical frame.
    Tick,
    /// Releases a new agent from the entrance with the provided index.
    ReleaseAgent {
        /// Index into the level's entrance list.
        entrance: usize,
    },
    /// Chooses the ability subsequent [`Command::AssignSelected`] requests grant.
    SelectAbility {
        /// Ability highlighted on the skill panel.
        ability: Ability,
    },
    /// Requests that an agent acquires the provided ability.
    AssignSkill {
        /// Agent targeted by the assignment.
        agent: AgentId,
        /// Ability that should be granted.
        ability: Ability,
    },
    /// Requests that an agent acquires the currently selected ability.
    AssignSelected {
        /// Agent targeted by the assignment.
        agent: AgentId,
    },
    /// Arms every live agent and stops further releases.
    Nuke,
    /// Restores the level to its initial state.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation advanced by one tick.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Confirms that an agent entered the level.
    AgentReleased {
        /// Identifier assigned to the new agent.
        agent: AgentId,
        /// Spawn position of the agent's foot.
        at: PixelCoord,
    },
    /// Reports that a release request could not be honoured.
    ReleaseRejected {
        /// Entrance index provided in the request.
        entrance: usize,
        /// Specific reason the release failed.
        reason: ReleaseError,
    },
    /// Reports a committed state transition of an agent.
    SkillChanged {
        /// Agent that changed state.
        agent: AgentId,
        /// State the agent left.
        from: Skill,
        /// State the agent entered.
        to: Skill,
    },
    /// Confirms that the skill panel selection changed.
    AbilitySelected {
        /// Ability that became selected.
        ability: Ability,
    },
    /// Confirms that an ability was granted to an agent.
    SkillAssigned {
        /// Agent that received the ability.
        agent: AgentId,
        /// Ability that was granted.
        ability: Ability,
        /// Remaining ledger count, or `None` for abilities outside the ledger.
        remaining: Option<u32>,
    },
    /// Reports that an assignment request was rejected without side effects.
    AssignmentRejected {
        /// Agent targeted by the assignment.
        agent: AgentId,
        /// Ability that was requested, or `None` when nothing was selected.
        ability: Option<Ability>,
        /// Specific reason the assignment failed.
        reason: AssignError,
    },
    /// Fire-and-forget request for the audio collaborator.
    SoundPlayed {
        /// Effect that should be played.
        effect: SoundEffect,
    },
    /// Fire-and-forget request for the particle collaborator.
    ExplosionSpawned {
        /// Centre of the explosion.
        at: PixelCoord,
    },
    /// Confirms that an agent reached an exit and left the level.
    AgentExited {
        /// Agent that was rescued.
        agent: AgentId,
    },
    /// Confirms that an agent died and was removed from the level.
    AgentDied {
        /// Agent that was lost.
        agent: AgentId,
    },
    /// Announces that the nuke sequence started.
    NukeStarted,
    /// Announces that the level was restored to its initial state.
    LevelRestarted,
}

/// Horizontal facing of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Facing toward decreasing x.
    Left,
    /// Facing toward increasing x.
    Right,
}

impl Direction {
    /// Returns the opposite facing.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Signed unit step along the x axis.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// State of an agent. Each variant is driven by exactly one behavior unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    /// Walks along the terrain in the facing direction.
    Walker,
    /// Falls at constant speed, accumulating fall distance.
    Faller,
    /// Scales a vertical wall.
    Climber,
    /// Pulls itself over the top of a climbed wall.
    ClimberToWalker,
    /// Opens the umbrella, decelerating via a fixed table.
    FloaterStart,
    /// Descends slowly under an open umbrella.
    Floater,
    /// Hops over a medium-height obstacle.
    Jumper,
    /// Digs vertically downward.
    Digger,
    /// Bashes horizontally through terrain.
    Basher,
    /// Mines diagonally downward.
    Miner,
    /// Lays stair steps.
    Builder,
    /// Shrugs after the last step before walking on.
    BuilderEnd,
    /// Blocks other agents by holding a stopper zone.
    Stopper,
    /// Plays the final countdown animation, then explodes.
    Bomber,
    /// A stopper that explodes; keeps its zone until it falls or explodes.
    BomberStopper,
    /// Hit the ground after falling too far.
    Splatter,
    /// Drowns in a water trap.
    Drowning,
    /// Killed by a non-triggerable trap.
    Trapped,
    /// Walks into an exit.
    Exiting,
}

impl Skill {
    /// Every state in declaration order.
    pub const ALL: [Skill; 19] = [
        Skill::Walker,
        Skill::Faller,
        Skill::Climber,
        Skill::ClimberToWalker,
        Skill::FloaterStart,
        Skill::Floater,
        Skill::Jumper,
        Skill::Digger,
        Skill::Basher,
        Skill::Miner,
        Skill::Builder,
        Skill::BuilderEnd,
        Skill::Stopper,
        Skill::Bomber,
        Skill::BomberStopper,
        Skill::Splatter,
        Skill::Drowning,
        Skill::Trapped,
        Skill::Exiting,
    ];

    /// States that end in removal and accept no further abilities.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Bomber
                | Self::BomberStopper
                | Self::Splatter
                | Self::Drowning
                | Self::Trapped
                | Self::Exiting
        )
    }

    /// States from which a main skill (dig, bash, mine, build, stop) may be taken.
    #[must_use]
    pub const fn can_change_skill(self) -> bool {
        matches!(
            self,
            Self::Walker
                | Self::Builder
                | Self::BuilderEnd
                | Self::Basher
                | Self::Miner
                | Self::Digger
        )
    }

    /// States allowed to enter an exit.
    #[must_use]
    pub const fn can_exit(self) -> bool {
        matches!(
            self,
            Self::Walker
                | Self::Jumper
                | Self::Basher
                | Self::Miner
                | Self::Builder
                | Self::BuilderEnd
        )
    }

    /// State entered when the explosion countdown elapses, or `None` when the
    /// state ignores the explode flag.
    #[must_use]
    pub const fn explode_target(self) -> Option<Skill> {
        match self {
            Self::Stopper => Some(Self::BomberStopper),
            _ if self.is_terminal() => None,
            _ => Some(Self::Bomber),
        }
    }
}

/// Abilities the player can grant through the skill ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    /// Permanent capability to climb walls.
    Climber,
    /// Permanent capability to float instead of splatting.
    Floater,
    /// Starts the explosion countdown.
    Bomber,
    /// Blocks other agents.
    Stopper,
    /// Builds a staircase.
    Builder,
    /// Bashes horizontally.
    Basher,
    /// Mines diagonally.
    Miner,
    /// Digs vertically.
    Digger,
    /// Pseudo-ability granted by the nuke; never counted by the ledger.
    Nuke,
}

impl Ability {
    /// Abilities tracked by the ledger, in skill panel order.
    pub const LEDGER: [Ability; 8] = [
        Ability::Climber,
        Ability::Floater,
        Ability::Bomber,
        Ability::Stopper,
        Ability::Builder,
        Ability::Basher,
        Ability::Miner,
        Ability::Digger,
    ];

    /// State an agent enters when granted this ability, for main skills.
    #[must_use]
    pub const fn main_skill(self) -> Option<Skill> {
        match self {
            Self::Stopper => Some(Skill::Stopper),
            Self::Builder => Some(Skill::Builder),
            Self::Basher => Some(Skill::Basher),
            Self::Miner => Some(Skill::Miner),
            Self::Digger => Some(Skill::Digger),
            Self::Climber | Self::Floater | Self::Bomber | Self::Nuke => None,
        }
    }
}

/// Reasons a skill assignment may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignError {
    /// No live agent with the provided identifier exists.
    MissingAgent,
    /// No ability is selected on the skill panel.
    NoSelection,
    /// The agent already died or left the level.
    Inactive,
    /// The agent's current state accepts no further abilities.
    Terminal,
    /// The agent already holds the requested capability.
    AlreadyCapable,
    /// The agent's explosion countdown is already running.
    AlreadyCountingDown,
    /// The agent is already flagged by the nuke.
    AlreadyNuked,
    /// The agent's current state forbids switching to a main skill.
    CannotChangeSkill,
    /// The agent is already performing the requested skill.
    AlreadyActive,
    /// The terrain around the agent does not permit the skill.
    TerrainBlocked,
    /// The ledger has no remaining uses of the ability.
    Exhausted,
}

/// Reasons a release request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseError {
    /// The level already released all of its agents.
    Exhausted,
    /// The nuke sequence is running.
    Nuking,
    /// The entrance index does not exist.
    MissingEntrance,
}

/// Audio cues emitted by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// An agent hit the ground after a fatal fall.
    Splat,
    /// An agent exploded.
    Explode,
    /// An agent's final countdown animation started.
    OhNo,
    /// An agent fell into water.
    Drown,
    /// An agent died off-screen or in a generic trap.
    Die,
    /// An agent reached an exit.
    Yippee,
    /// A builder is laying its last few steps.
    Ting,
    /// A destructive skill struck indestructible terrain.
    Chink,
    /// The nuke sequence started.
    Nuke,
    /// An ability was granted.
    Assign,
    /// Sound owned by a level object, addressed by its resource id.
    Object(u16),
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a level object, embedded in the high bits of stencil cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u16);

impl ObjectId {
    /// Creates a new object identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Pixel position expressed in level space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCoord {
    /// Horizontal pixel index.
    pub x: i32,
    /// Vertical pixel index, growing downward.
    pub y: i32,
}

impl PixelCoord {
    /// Creates a new pixel coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Remaining uses of each ledger ability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillCounts {
    counts: [u32; 8],
}

impl SkillCounts {
    /// Creates counts with the same value for every ledger ability.
    #[must_use]
    pub const fn uniform(count: u32) -> Self {
        Self { counts: [count; 8] }
    }

    /// Returns a copy with the count for `ability` replaced.
    ///
    /// Setting the count of [`Ability::Nuke`] has no effect.
    #[must_use]
    pub fn with(mut self, ability: Ability, count: u32) -> Self {
        if let Some(slot) = slot(ability).and_then(|index| self.counts.get_mut(index)) {
            *slot = count;
        }
        self
    }

    /// Remaining count of `ability`, or `None` for abilities outside the ledger.
    #[must_use]
    pub fn get(&self, ability: Ability) -> Option<u32> {
        slot(ability).and_then(|index| self.counts.get(index).copied())
    }

    /// Decrements the count of `ability`, returning `false` when it is already zero.
    pub fn take(&mut self, ability: Ability) -> bool {
        let Some(count) = slot(ability).and_then(|index| self.counts.get_mut(index)) else {
            return false;
        };
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }
}

fn slot(ability: Ability) -> Option<usize> {
    Ability::LEDGER.iter().position(|candidate| *candidate == ability)
}

/// Level geometry supplied by the level loader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelGeometry {
    /// Width of the level in pixels.
    pub width: u32,
    /// Height of the level in pixels.
    pub height: u32,
    /// Longest fall an agent survives when landing.
    pub max_safe_fall: i32,
    /// Spawn points of the level's entrances.
    pub entrances: Vec<PixelCoord>,
}

/// Immutable representation of a single agent used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Foot position of the agent.
    pub position: PixelCoord,
    /// Top-left corner of the current animation frame.
    pub sprite_origin: PixelCoord,
    /// Facing of the agent.
    pub direction: Direction,
    /// Current state of the agent.
    pub skill: Skill,
    /// Current animation frame.
    pub frame: u32,
    /// Whether the agent climbs walls.
    pub can_climb: bool,
    /// Whether the agent floats instead of falling.
    pub can_float: bool,
    /// Whether the nuke flagged the agent.
    pub nuked: bool,
    /// Explosion countdown digit shown above the agent, if counting down.
    pub countdown: Option<u8>,
    /// Whether the agent shows assignment feedback.
    pub selected: bool,
}

/// Read-only snapshot describing all live agents.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    ///
    /// Snapshots keep the order they are provided in; the world supplies them
    /// in processing order, which is part of the determinism contract.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<AgentSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live agents captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the view contains no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Running totals of a level attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelStats {
    /// Number of agents the level releases in total.
    pub total: u32,
    /// Agents released so far.
    pub released: u32,
    /// Agents still in play.
    pub alive: u32,
    /// Agents that reached an exit.
    pub rescued: u32,
    /// Agents that died.
    pub lost: u32,
}

#[cfg(test)]
mod tests {
    use super::{
        Ability, AgentId, AssignError, Direction, LevelGeometry, PixelCoord, Skill, SkillCounts,
        SoundEffect,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn direction_flip_and_sign_agree() {
        assert_eq!(Direction::Left.flipped(), Direction::Right);
        assert_eq!(Direction::Right.flipped().sign(), -1);
        assert_eq!(Direction::Right.sign(), 1);
    }

    #[test]
    fn terminal_states_ignore_the_explode_flag() {
        for skill in Skill::ALL {
            assert_eq!(skill.explode_target().is_none(), skill.is_terminal());
        }
        assert_eq!(Skill::Stopper.explode_target(), Some(Skill::BomberStopper));
        assert_eq!(Skill::Digger.explode_target(), Some(Skill::Bomber));
    }

    #[test]
    fn digger_cannot_exit_but_walker_can() {
        assert!(!Skill::Digger.can_exit());
        assert!(Skill::Walker.can_exit());
    }

    #[test]
    fn skill_counts_never_underflow() {
        let mut counts = SkillCounts::uniform(0).with(Ability::Digger, 1);
        assert!(counts.take(Ability::Digger));
        assert!(!counts.take(Ability::Digger));
        assert_eq!(counts.get(Ability::Digger), Some(0));
        assert!(!counts.take(Ability::Nuke));
        assert_eq!(counts.get(Ability::Nuke), None);
    }

    #[test]
    fn main_skills_map_to_states() {
        assert_eq!(Ability::Basher.main_skill(), Some(Skill::Basher));
        assert_eq!(Ability::Climber.main_skill(), None);
    }

    #[test]
    fn agent_id_round_trips_through_bincode() {
        assert_round_trip(&AgentId::new(42));
    }

    #[test]
    fn assign_error_round_trips_through_bincode() {
        assert_round_trip(&AssignError::TerrainBlocked);
    }

    #[test]
    fn sound_effect_round_trips_through_bincode() {
        assert_round_trip(&SoundEffect::Object(7));
    }

    #[test]
    fn level_geometry_round_trips_through_bincode() {
        let geometry = LevelGeometry {
            width: 320,
            height: 160,
            max_safe_fall: 63,
            entrances: vec![PixelCoord::new(40, 20)],
        };
        assert_round_trip(&geometry);
    }
}
