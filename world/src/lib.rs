#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for a single level attempt.
//!
//! The world owns the terrain, the live agents, the skill ledger and the level
//! statistics. It is mutated exclusively through [`apply`] and observed through
//! the [`query`] module.

mod ledger;

use lemmings_core::{
    Ability, AgentId, AssignError, Command, Event, LevelGeometry, LevelStats, ReleaseError,
    SkillCounts, SoundEffect,
};
use lemmings_system_behavior::{
    advance_agents, Agent, ConfigError, PhysicsConfig, SkillTable, TickContext,
};
use lemmings_terrain::Terrain;
use thiserror::Error;

use ledger::{SkillLedger, Surroundings};

/// Release rates a level may declare.
pub const RELEASE_RATES: std::ops::RangeInclusive<u32> = 1..=99;

/// Failures raised while preparing a level attempt.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The geometry and the terrain disagree about the level size.
    #[error(
        "level geometry is {geometry_width}x{geometry_height} but the terrain is \
         {terrain_width}x{terrain_height}"
    )]
    GeometryMismatch {
        /// Width declared by the geometry.
        geometry_width: u32,
        /// Height declared by the geometry.
        geometry_height: u32,
        /// Width of the terrain.
        terrain_width: u32,
        /// Height of the terrain.
        terrain_height: u32,
    },
    /// The release rate lies outside [`RELEASE_RATES`].
    #[error("release rate {0} is outside 1..=99")]
    ReleaseRate(u32),
    /// The physics constants are unusable.
    #[error("invalid physics configuration")]
    Physics(#[from] ConfigError),
}

/// Everything a level attempt starts from.
#[derive(Clone, Debug)]
pub struct LevelSetup {
    /// Size, entrances and fall tolerance of the level.
    pub geometry: LevelGeometry,
    /// Pristine terrain, including placed objects.
    pub terrain: Terrain,
    /// Initial ledger counts.
    pub skills: SkillCounts,
    /// Number of agents the level releases.
    pub agents_total: u32,
    /// Release rate in `1..=99`; higher releases faster.
    pub release_rate: u32,
}

/// Represents the authoritative state of a level attempt.
#[derive(Debug)]
pub struct World {
    setup: LevelSetup,
    terrain: Terrain,
    resources: SkillTable,
    physics: PhysicsConfig,
    agents: Vec<Agent>,
    ledger: SkillLedger,
    stats: LevelStats,
    next_agent_id: u32,
    nuking: bool,
    tick_index: u64,
}

impl World {
    /// Validates the setup and creates a world ready for its first tick.
    pub fn new(
        setup: LevelSetup,
        resources: SkillTable,
        physics: PhysicsConfig,
    ) -> Result<Self, SetupError> {
        physics.validate()?;
        let geometry = &setup.geometry;
        if geometry.width != setup.terrain.width() || geometry.height != setup.terrain.height() {
            return Err(SetupError::GeometryMismatch {
                geometry_width: geometry.width,
                geometry_height: geometry.height,
                terrain_width: setup.terrain.width(),
                terrain_height: setup.terrain.height(),
            });
        }
        if !RELEASE_RATES.contains(&setup.release_rate) {
            return Err(SetupError::ReleaseRate(setup.release_rate));
        }

        log::info!(
            "level {}x{} with {} agents and {} entrances",
            geometry.width,
            geometry.height,
            setup.agents_total,
            geometry.entrances.len()
        );
        Ok(Self {
            terrain: setup.terrain.clone(),
            ledger: SkillLedger::new(setup.skills),
            stats: initial_stats(&setup),
            setup,
            resources,
            physics,
            agents: Vec::new(),
            next_agent_id: 0,
            nuking: false,
            tick_index: 0,
        })
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });

        let mut ctx = TickContext::new(
            &mut self.terrain,
            &self.resources,
            &self.physics,
            self.setup.geometry.max_safe_fall,
            out_events,
        );
        advance_agents(&mut self.agents, &mut ctx);
        self.terrain.tick_objects();
        self.sweep_removed(out_events);
    }

    fn sweep_removed(&mut self, out_events: &mut Vec<Event>) {
        let stats = &mut self.stats;
        self.agents.retain(|agent| {
            let event = if agent.has_left() {
                stats.rescued += 1;
                Event::AgentExited { agent: agent.id() }
            } else if agent.has_died() {
                stats.lost += 1;
                Event::AgentDied { agent: agent.id() }
            } else {
                return true;
            };
            stats.alive = stats.alive.saturating_sub(1);
            out_events.push(event);
            false
        });
    }

    fn release(&mut self, entrance: usize, out_events: &mut Vec<Event>) {
        let spawn_point = if self.nuking {
            Err(ReleaseError::Nuking)
        } else if self.stats.released >= self.stats.total {
            Err(ReleaseError::Exhausted)
        } else {
            self.setup
                .geometry
                .entrances
                .get(entrance)
                .copied()
                .ok_or(ReleaseError::MissingEntrance)
        };

        match spawn_point {
            Ok(at) => {
                let id = AgentId::new(self.next_agent_id);
                self.next_agent_id = self.next_agent_id.saturating_add(1);
                self.agents.push(Agent::spawn(id, at));
                self.stats.released += 1;
                self.stats.alive += 1;
                out_events.push(Event::AgentReleased { agent: id, at });
            }
            Err(reason) => {
                log::debug!("release from entrance {entrance} rejected: {reason:?}");
                out_events.push(Event::ReleaseRejected { entrance, reason });
            }
        }
    }

    fn assign(&mut self, agent: AgentId, ability: Option<Ability>, out_events: &mut Vec<Event>) {
        let result = match ability {
            Some(ability) => self.try_assign(agent, ability, out_events),
            None => Err(AssignError::NoSelection),
        };
        match (result, ability) {
            (Ok(remaining), Some(ability)) => {
                out_events.push(Event::SoundPlayed {
                    effect: SoundEffect::Assign,
                });
                out_events.push(Event::SkillAssigned {
                    agent,
                    ability,
                    remaining,
                });
            }
            (Ok(_), None) => {}
            (Err(reason), ability) => {
                log::debug!(
                    "assignment of {ability:?} to agent {} rejected: {reason:?}",
                    agent.get()
                );
                out_events.push(Event::AssignmentRejected {
                    agent,
                    ability,
                    reason,
                });
            }
        }
    }

    fn try_assign(
        &mut self,
        id: AgentId,
        ability: Ability,
        out_events: &mut Vec<Event>,
    ) -> Result<Option<u32>, AssignError> {
        let Self {
            setup,
            terrain,
            resources,
            physics,
            agents,
            ledger,
            ..
        } = self;
        let agent = agents
            .iter_mut()
            .find(|agent| agent.id() == id)
            .ok_or(AssignError::MissingAgent)?;
        let level = Surroundings {
            terrain,
            resources,
            physics,
            max_safe_fall: setup.geometry.max_safe_fall,
        };
        ledger.assign(agent, ability, level, out_events)
    }

    fn nuke(&mut self, out_events: &mut Vec<Event>) {
        if self.nuking {
            return;
        }
        self.nuking = true;
        log::info!("nuke started with {} agents in play", self.agents.len());
        out_events.push(Event::SoundPlayed {
            effect: SoundEffect::Nuke,
        });
        out_events.push(Event::NukeStarted);

        for agent in self
            .agents
            .iter_mut()
            .filter(|agent| !agent.skill().is_terminal())
        {
            let _ = agent.flag_nuke(&self.physics);
        }
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        self.terrain = self.setup.terrain.clone();
        self.agents.clear();
        self.ledger.reset();
        self.stats = initial_stats(&self.setup);
        self.next_agent_id = 0;
        self.nuking = false;
        self.tick_index = 0;
        log::info!("level restarted");
        out_events.push(Event::LevelRestarted);
    }
}

fn initial_stats(setup: &LevelSetup) -> LevelStats {
    LevelStats {
        total: setup.agents_total,
        ..LevelStats::default()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => world.tick(out_events),
        Command::ReleaseAgent { entrance } => world.release(entrance, out_events),
        Command::SelectAbility { ability } => {
            world.ledger.select(ability);
            out_events.push(Event::AbilitySelected { ability });
        }
        Command::AssignSkill { agent, ability } => world.assign(agent, Some(ability), out_events),
        Command::AssignSelected { agent } => {
            let ability = world.ledger.selected();
            world.assign(agent, ability, out_events);
        }
        Command::Nuke => world.nuke(out_events),
        Command::Restart => world.restart(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use lemmings_core::{Ability, AgentView, LevelGeometry, LevelStats, SkillCounts};
    use lemmings_system_behavior::PhysicsConfig;
    use lemmings_terrain::Terrain;

    use super::World;

    /// Captures the live agents in processing order.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(
            world
                .agents
                .iter()
                .map(|agent| agent.snapshot(&world.resources))
                .collect(),
        )
    }

    /// Provides read-only access to the current terrain.
    #[must_use]
    pub fn terrain(world: &World) -> &Terrain {
        &world.terrain
    }

    /// Provides read-only access to the level geometry.
    #[must_use]
    pub fn geometry(world: &World) -> &LevelGeometry {
        &world.setup.geometry
    }

    /// Physics constants the world simulates with.
    #[must_use]
    pub fn physics(world: &World) -> &PhysicsConfig {
        &world.physics
    }

    /// Release rate declared by the level.
    #[must_use]
    pub fn release_rate(world: &World) -> u32 {
        world.setup.release_rate
    }

    /// Running totals of the attempt.
    #[must_use]
    pub fn stats(world: &World) -> LevelStats {
        world.stats
    }

    /// Remaining uses of every ledger ability.
    #[must_use]
    pub fn skill_counts(world: &World) -> SkillCounts {
        world.ledger.remaining()
    }

    /// Ability highlighted on the skill panel.
    #[must_use]
    pub fn selected_ability(world: &World) -> Option<Ability> {
        world.ledger.selected()
    }

    /// Number of ticks simulated since the attempt started.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Whether the nuke sequence is running.
    #[must_use]
    pub fn is_nuking(world: &World) -> bool {
        world.nuking
    }

    /// Whether no agent is left in play and none will be released.
    #[must_use]
    pub fn is_finished(world: &World) -> bool {
        let stats = world.stats;
        stats.alive == 0 && (world.nuking || stats.released >= stats.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemmings_core::PixelCoord;
    use lemmings_system_behavior::{Animation, SkillResource};
    use lemmings_terrain::attr;

    fn setup(agents_total: u32) -> LevelSetup {
        let mut terrain = Terrain::new(80, 40, 0, 1);
        terrain.fill_rect(0, 30, 80, 10, attr::BRICK, 1);
        LevelSetup {
            geometry: LevelGeometry {
                width: 80,
                height: 40,
                max_safe_fall: 56,
                entrances: vec![PixelCoord::new(10, 20)],
            },
            terrain,
            skills: SkillCounts::uniform(3),
            agents_total,
            release_rate: 50,
        }
    }

    fn world(agents_total: u32) -> World {
        World::new(setup(agents_total), SkillTable::standard(), PhysicsConfig::default())
            .expect("valid setup")
    }

    #[test]
    fn rejects_mismatched_geometry() {
        let mut setup = setup(1);
        setup.geometry.width = 81;

        let error = World::new(setup, SkillTable::standard(), PhysicsConfig::default())
            .expect_err("geometry mismatch");

        assert!(matches!(
            error,
            SetupError::GeometryMismatch {
                geometry_width: 81,
                terrain_width: 80,
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_release_rates() {
        let mut setup = setup(1);
        setup.release_rate = 0;

        assert!(matches!(
            World::new(setup, SkillTable::standard(), PhysicsConfig::default()),
            Err(SetupError::ReleaseRate(0))
        ));
    }

    #[test]
    fn rejects_invalid_physics() {
        let physics = PhysicsConfig {
            faller_step: 0,
            ..PhysicsConfig::default()
        };

        assert!(matches!(
            World::new(setup(1), SkillTable::standard(), physics),
            Err(SetupError::Physics(_))
        ));
    }

    #[test]
    fn releases_stop_at_the_level_total() {
        let mut world = world(1);
        let mut events = Vec::new();

        apply(&mut world, Command::ReleaseAgent { entrance: 0 }, &mut events);
        apply(&mut world, Command::ReleaseAgent { entrance: 0 }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::AgentReleased {
                    agent: AgentId::new(0),
                    at: PixelCoord::new(10, 20),
                },
                Event::ReleaseRejected {
                    entrance: 0,
                    reason: ReleaseError::Exhausted,
                },
            ]
        );
        assert_eq!(query::stats(&world).released, 1);
        assert_eq!(query::stats(&world).alive, 1);
    }

    #[test]
    fn unknown_entrances_are_rejected() {
        let mut world = world(5);
        let mut events = Vec::new();

        apply(&mut world, Command::ReleaseAgent { entrance: 3 }, &mut events);

        assert_eq!(
            events,
            vec![Event::ReleaseRejected {
                entrance: 3,
                reason: ReleaseError::MissingEntrance,
            }]
        );
        assert!(query::agent_view(&world).is_empty());
    }

    #[test]
    fn assigning_without_selection_is_rejected() {
        let mut world = world(1);
        let mut events = Vec::new();
        apply(&mut world, Command::ReleaseAgent { entrance: 0 }, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::AssignSelected {
                agent: AgentId::new(0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::AssignmentRejected {
                agent: AgentId::new(0),
                ability: None,
                reason: AssignError::NoSelection,
            }]
        );
    }

    #[test]
    fn selected_ability_is_granted_to_clicked_agent() {
        let mut world = world(1);
        let mut events = Vec::new();
        apply(&mut world, Command::ReleaseAgent { entrance: 0 }, &mut events);
        apply(
            &mut world,
            Command::SelectAbility {
                ability: Ability::Floater,
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::AssignSelected {
                agent: AgentId::new(0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::SoundPlayed {
                    effect: SoundEffect::Assign,
                },
                Event::SkillAssigned {
                    agent: AgentId::new(0),
                    ability: Ability::Floater,
                    remaining: Some(2),
                },
            ]
        );
        let view = query::agent_view(&world);
        let agent = view.iter().next().expect("released agent");
        assert!(agent.can_float);
        assert!(agent.selected);
    }

    #[test]
    fn agent_view_places_sprites_by_the_skill_foot() {
        let mut resources = SkillTable::standard();
        resources
            .insert(
                lemmings_core::Skill::Faller,
                SkillResource::new(4, Animation::Loop, (3, 5)),
            )
            .expect("valid faller descriptor");
        let mut world =
            World::new(setup(1), resources, PhysicsConfig::default()).expect("valid setup");
        let mut events = Vec::new();

        apply(&mut world, Command::ReleaseAgent { entrance: 0 }, &mut events);

        let view = query::agent_view(&world);
        let agent = view.iter().next().expect("released agent");
        assert_eq!(agent.position, PixelCoord::new(10, 20));
        assert_eq!(agent.sprite_origin, PixelCoord::new(7, 15));
    }

    #[test]
    fn restart_restores_the_pristine_level() {
        let mut world = world(2);
        let mut events = Vec::new();
        apply(&mut world, Command::ReleaseAgent { entrance: 0 }, &mut events);
        for _ in 0..10 {
            apply(&mut world, Command::Tick, &mut events);
        }
        apply(
            &mut world,
            Command::AssignSkill {
                agent: AgentId::new(0),
                ability: Ability::Digger,
            },
            &mut events,
        );
        for _ in 0..40 {
            apply(&mut world, Command::Tick, &mut events);
        }
        assert_ne!(query::terrain(&world), &world.setup.terrain);
        events.clear();

        apply(&mut world, Command::Restart, &mut events);

        assert_eq!(events, vec![Event::LevelRestarted]);
        assert_eq!(query::terrain(&world), &world.setup.terrain);
        assert!(query::agent_view(&world).is_empty());
        assert_eq!(query::skill_counts(&world), SkillCounts::uniform(3));
        assert_eq!(query::stats(&world), initial_stats(&world.setup));
        assert_eq!(query::tick_index(&world), 0);
    }
}
