//! The simulated agent and its read-only terrain probes.

use lemmings_core::{AgentId, AgentSnapshot, Direction, PixelCoord, Skill};
use lemmings_terrain::{attr, Stencil};

use crate::{config::PhysicsConfig, resources::SkillTable};

/// Read-only terrain access used by the probes.
#[derive(Clone, Copy, Debug)]
pub struct Ground<'a> {
    stencil: &'a Stencil,
    physics: &'a PhysicsConfig,
}

impl<'a> Ground<'a> {
    /// Wraps a stencil together with the constants the probes depend on.
    #[must_use]
    pub const fn new(stencil: &'a Stencil, physics: &'a PhysicsConfig) -> Self {
        Self { stencil, physics }
    }

    fn walk_on(&self, x: i32, y: i32) -> bool {
        self.stencil.is_walk_on(x, y)
    }

    fn height(&self) -> i32 {
        i32::try_from(self.stencil.height()).unwrap_or(i32::MAX)
    }
}

/// Explosion countdown shown above an armed agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    digit: u8,
    ticks: u32,
}

impl Countdown {
    /// Starts a countdown at its highest digit.
    #[must_use]
    pub const fn start(physics: &PhysicsConfig) -> Self {
        Self {
            digit: physics.explode_counter,
            ticks: physics.explode_step_ticks,
        }
    }

    /// Digit currently displayed.
    #[must_use]
    pub const fn digit(&self) -> u8 {
        self.digit
    }

    /// Advances one tick, returning `true` once the countdown elapsed.
    fn tick(&mut self, physics: &PhysicsConfig) -> bool {
        self.ticks = self.ticks.saturating_sub(1);
        if self.ticks > 0 {
            return false;
        }
        self.digit = self.digit.saturating_sub(1);
        self.ticks = physics.explode_step_ticks;
        self.digit == 0
    }
}

/// Stopper zone stamped by an agent, remembered so it can be removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopperZone {
    /// Level position of the mask's top-left corner.
    pub origin: (i32, i32),
    /// Facing of the stopper when the zone was stamped.
    pub direction: Direction,
}

/// A single lemming.
///
/// `y` is the row of the walk-on pixel under the agent's feet; an agent stands
/// when the stencil at `(x, y)` is walk-on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) direction: Direction,
    pub(crate) skill: Skill,
    pub(crate) counter: i32,
    pub(crate) counter2: i32,
    pub(crate) frame: u32,
    can_climb: bool,
    can_float: bool,
    nuked: bool,
    has_died: bool,
    has_left: bool,
    countdown: Option<Countdown>,
    pub(crate) stopper_zone: Option<StopperZone>,
    select_ticks: u32,
}

impl Agent {
    /// Creates a freshly released agent: a right-facing faller.
    #[must_use]
    pub const fn spawn(id: AgentId, at: PixelCoord) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            direction: Direction::Right,
            skill: Skill::Faller,
            counter: 0,
            counter2: 0,
            frame: 0,
            can_climb: false,
            can_float: false,
            nuked: false,
            has_died: false,
            has_left: false,
            countdown: None,
            stopper_zone: None,
            select_ticks: 0,
        }
    }

    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Foot position.
    #[must_use]
    pub const fn position(&self) -> PixelCoord {
        PixelCoord::new(self.x, self.y)
    }

    /// Facing.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Current state.
    #[must_use]
    pub const fn skill(&self) -> Skill {
        self.skill
    }

    /// General purpose counter; fall distance for fallers, steps for builders.
    #[must_use]
    pub const fn counter(&self) -> i32 {
        self.counter
    }

    /// Current animation frame.
    #[must_use]
    pub const fn frame(&self) -> u32 {
        self.frame
    }

    /// Whether the agent climbs walls.
    #[must_use]
    pub const fn can_climb(&self) -> bool {
        self.can_climb
    }

    /// Whether the agent floats instead of splatting.
    #[must_use]
    pub const fn can_float(&self) -> bool {
        self.can_float
    }

    /// Whether the current state permits switching to a main skill.
    #[must_use]
    pub const fn can_change_skill(&self) -> bool {
        self.skill.can_change_skill()
    }

    /// Whether the nuke flagged the agent.
    #[must_use]
    pub const fn nuked(&self) -> bool {
        self.nuked
    }

    /// Whether the agent died.
    #[must_use]
    pub const fn has_died(&self) -> bool {
        self.has_died
    }

    /// Whether the agent left through an exit.
    #[must_use]
    pub const fn has_left(&self) -> bool {
        self.has_left
    }

    /// Whether the agent is out of play.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        self.has_died || self.has_left
    }

    /// Running explosion countdown.
    #[must_use]
    pub const fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    /// Stopper zone the agent currently holds.
    #[must_use]
    pub const fn stopper_zone(&self) -> Option<StopperZone> {
        self.stopper_zone
    }

    /// Ticks of assignment feedback left.
    #[must_use]
    pub const fn select_ticks(&self) -> u32 {
        self.select_ticks
    }

    /// Grants the climbing capability, returning `false` if already held.
    pub fn grant_climber(&mut self) -> bool {
        !std::mem::replace(&mut self.can_climb, true)
    }

    /// Grants the floating capability, returning `false` if already held.
    pub fn grant_floater(&mut self) -> bool {
        !std::mem::replace(&mut self.can_float, true)
    }

    /// Starts the explosion countdown, returning `false` if one is running.
    pub fn arm(&mut self, physics: &PhysicsConfig) -> bool {
        if self.countdown.is_some() {
            return false;
        }
        self.countdown = Some(Countdown::start(physics));
        true
    }

    /// Flags the agent for the nuke and arms it, returning `false` if it was
    /// already flagged.
    pub fn flag_nuke(&mut self, physics: &PhysicsConfig) -> bool {
        if std::mem::replace(&mut self.nuked, true) {
            return false;
        }
        let _ = self.arm(physics);
        true
    }

    /// Shows assignment feedback for `ticks` ticks.
    pub fn select(&mut self, ticks: u32) {
        self.select_ticks = ticks;
    }

    /// Read-only description of the agent, with the sprite placed by the
    /// foot offset of its current skill.
    #[must_use]
    pub fn snapshot(&self, resources: &SkillTable) -> AgentSnapshot {
        let (foot_x, foot_y) = resources.get(self.skill).foot;
        AgentSnapshot {
            id: self.id,
            position: self.position(),
            sprite_origin: PixelCoord::new(self.x - foot_x, self.y - foot_y),
            direction: self.direction,
            skill: self.skill,
            frame: self.frame,
            can_climb: self.can_climb,
            can_float: self.can_float,
            nuked: self.nuked,
            countdown: self.countdown.map(|countdown| countdown.digit()),
            selected: self.select_ticks > 0,
        }
    }

    pub(crate) fn mark_died(&mut self) {
        self.has_died = true;
    }

    pub(crate) fn mark_left(&mut self) {
        self.has_left = true;
    }

    /// Advances cosmetic and countdown timers, returning `true` on the tick
    /// the countdown elapses.
    pub(crate) fn tick_timers(&mut self, physics: &PhysicsConfig) -> bool {
        self.select_ticks = self.select_ticks.saturating_sub(1);
        let Some(countdown) = self.countdown.as_mut() else {
            return false;
        };
        if !countdown.tick(physics) {
            return false;
        }
        self.countdown = None;
        true
    }

    pub(crate) fn turn(&mut self) {
        self.direction = self.direction.flipped();
    }

    pub(crate) const fn step(&self) -> i32 {
        self.direction.sign()
    }

    /// Free pixels below the foot, at most `step`.
    ///
    /// Returns [`PhysicsConfig::force_fall`] when the scan leaves the bottom
    /// of the level.
    #[must_use]
    pub fn free_below(&self, ground: &Ground<'_>, step: i32) -> i32 {
        let height = ground.height();
        let mut free = 0;
        for offset in 0..step {
            let row = self.y + offset;
            if row >= height {
                return ground.physics.force_fall();
            }
            if ground.walk_on(self.x, row) {
                break;
            }
            free += 1;
        }
        free
    }

    /// Free pixels above the collision midpoint, at most `step`.
    ///
    /// Returns `-1` when the scan leaves the top of the level.
    #[must_use]
    pub fn free_above(&self, ground: &Ground<'_>, step: i32) -> i32 {
        let mid = self.mid_y(ground.physics);
        let mut free = 0;
        for offset in 0..step {
            let row = mid - 1 - offset;
            if row < 0 {
                return -1;
            }
            if ground.walk_on(self.x, row) {
                break;
            }
            free += 1;
        }
        free
    }

    /// Height of the walk-on column directly above the foot, capped at the
    /// walker obstacle height.
    #[must_use]
    pub fn above_ground(&self, ground: &Ground<'_>) -> i32 {
        (1..=ground.physics.walker_obstacle_height)
            .take_while(|offset| ground.walk_on(self.x, self.y - offset))
            .fold(0, |count, _| count + 1)
    }

    /// Stencil cell at the collision midpoint.
    #[must_use]
    pub fn stencil_mid(&self, ground: &Ground<'_>) -> u32 {
        ground.stencil.get(self.x, self.mid_y(ground.physics))
    }

    /// Whether a stopper zone at the midpoint turns the agent around.
    #[must_use]
    pub fn turned_by_stopper(&self, ground: &Ground<'_>) -> bool {
        let cell = self.stencil_mid(ground);
        match self.direction {
            Direction::Right => cell & attr::STOPPER_LEFT != 0,
            Direction::Left => cell & attr::STOPPER_RIGHT != 0,
        }
    }

    /// Whether there is brick to dig beneath the foot and no steel in the way.
    #[must_use]
    pub fn can_dig(&self, ground: &Ground<'_>) -> bool {
        let reach = ground.physics.dig_probe_half_width;
        let cells = (-reach..=reach).map(|offset| (self.x + offset, self.y));
        scan(ground, cells, attr::STEEL)
    }

    /// Whether there is brick to bash ahead and nothing indestructible for
    /// this facing.
    #[must_use]
    pub fn can_bash(&self, ground: &Ground<'_>) -> bool {
        let physics = ground.physics;
        let step = self.step();
        let (x, y) = (self.x, self.y);
        let cells = (1..=physics.bash_probe_reach).flat_map(move |column| {
            (physics.bash_probe_bottom..=physics.bash_probe_top)
                .map(move |rise| (x + column * step, y - rise))
        });
        scan(ground, cells, attr::STEEL | attr::no_dig_for(self.direction))
    }

    /// Whether there is brick to mine ahead and below and nothing
    /// indestructible for this facing.
    #[must_use]
    pub fn can_mine(&self, ground: &Ground<'_>) -> bool {
        let physics = ground.physics;
        let step = self.step();
        let (x, y) = (self.x, self.y);
        let cells = (1..=physics.mine_probe_reach).flat_map(move |column| {
            (-physics.mine_probe_above..=physics.mine_probe_below)
                .map(move |depth| (x + column * step, y + depth))
        });
        scan(ground, cells, attr::STEEL | attr::no_dig_for(self.direction))
    }

    pub(crate) const fn mid_y(&self, physics: &PhysicsConfig) -> i32 {
        self.y - physics.collision_mid
    }
}

/// `false` if any cell intersects `forbidden`, otherwise whether any cell
/// holds brick.
fn scan(ground: &Ground<'_>, cells: impl Iterator<Item = (i32, i32)>, forbidden: u32) -> bool {
    let mut found = false;
    for (x, y) in cells {
        let cell = ground.stencil.get(x, y);
        if cell & forbidden != 0 {
            return false;
        }
        found |= cell & attr::BRICK != 0;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemmings_terrain::Terrain;

    fn floor() -> Terrain {
        let mut terrain = Terrain::new(64, 40, 0, 1);
        terrain.fill_rect(0, 30, 64, 10, attr::BRICK, 1);
        terrain
    }

    fn agent_at(x: i32, y: i32) -> Agent {
        Agent::spawn(AgentId::new(1), PixelCoord::new(x, y))
    }

    #[test]
    fn free_below_counts_air_until_ground() {
        let terrain = floor();
        let physics = PhysicsConfig::default();
        let ground = Ground::new(terrain.stencil(), &physics);

        assert_eq!(agent_at(10, 30).free_below(&ground, 8), 0);
        assert_eq!(agent_at(10, 27).free_below(&ground, 8), 3);
        assert_eq!(agent_at(10, 10).free_below(&ground, 8), 8);
    }

    #[test]
    fn free_below_reports_force_fall_past_the_bottom() {
        let terrain = Terrain::new(16, 16, 0, 1);
        let physics = PhysicsConfig::default();
        let ground = Ground::new(terrain.stencil(), &physics);

        assert_eq!(agent_at(4, 12).free_below(&ground, 8), physics.force_fall());
    }

    #[test]
    fn free_above_reports_leaving_the_top() {
        let terrain = floor();
        let physics = PhysicsConfig::default();
        let ground = Ground::new(terrain.stencil(), &physics);

        assert_eq!(agent_at(10, 30).free_above(&ground, 6), 6);
        assert_eq!(agent_at(10, 8).free_above(&ground, 6), -1);
    }

    #[test]
    fn above_ground_measures_obstacles_up_to_the_cap() {
        let mut terrain = floor();
        terrain.fill_rect(20, 27, 4, 3, attr::BRICK, 1);
        terrain.fill_rect(40, 0, 4, 30, attr::BRICK, 1);
        let physics = PhysicsConfig::default();
        let ground = Ground::new(terrain.stencil(), &physics);

        assert_eq!(agent_at(21, 30).above_ground(&ground), 3);
        assert_eq!(agent_at(41, 30).above_ground(&ground), 14);
        assert_eq!(agent_at(10, 30).above_ground(&ground), 0);
    }

    #[test]
    fn probes_refuse_steel_and_air() {
        let mut terrain = floor();
        terrain.fill_rect(50, 30, 4, 2, attr::STEEL, 2);
        let physics = PhysicsConfig::default();
        let ground = Ground::new(terrain.stencil(), &physics);

        assert!(agent_at(10, 30).can_dig(&ground));
        assert!(!agent_at(51, 30).can_dig(&ground));
        assert!(!agent_at(10, 10).can_dig(&ground));
        assert!(!agent_at(10, 30).can_bash(&ground));
    }

    #[test]
    fn bash_probe_respects_directional_no_dig() {
        let mut terrain = floor();
        terrain.fill_rect(20, 20, 6, 10, attr::BRICK | attr::NO_DIG_LEFT, 1);
        let physics = PhysicsConfig::default();
        let ground = Ground::new(terrain.stencil(), &physics);

        let mut agent = agent_at(16, 30);
        assert!(agent.can_bash(&ground));
        agent.x = 30;
        agent.turn();
        assert!(!agent.can_bash(&ground));
    }

    #[test]
    fn countdown_elapses_after_every_digit() {
        let physics = PhysicsConfig {
            explode_counter: 2,
            explode_step_ticks: 3,
            ..PhysicsConfig::default()
        };
        let mut agent = agent_at(0, 0);
        assert!(agent.arm(&physics));
        assert!(!agent.arm(&physics));

        let elapsed: Vec<bool> = (0..6).map(|_| agent.tick_timers(&physics)).collect();

        assert_eq!(elapsed, [false, false, false, false, false, true]);
        assert!(agent.countdown().is_none());
    }

    #[test]
    fn capabilities_are_granted_once() {
        let physics = PhysicsConfig::default();
        let mut agent = agent_at(0, 0);
        assert!(agent.grant_climber());
        assert!(!agent.grant_climber());
        assert!(agent.flag_nuke(&physics));
        assert!(!agent.flag_nuke(&physics));
        assert_eq!(agent.snapshot(&SkillTable::standard()).countdown, Some(5));
    }
}
