//! Built-in demo level and the scripted session that plays it.

use std::fmt;

use anyhow::{Context, Result};
use lemmings_core::{
    Ability, AgentId, Command, Event, LevelGeometry, LevelStats, PixelCoord, SkillCounts,
};
use lemmings_system_release::{Config, Release};
use lemmings_system_skill_panel::{PanelInput, SkillPanel, HIT_HEIGHT};
use lemmings_terrain::{attr, LevelObject, ObjectKind, PixelBuffer, Terrain};
use lemmings_world::{self as world, query, LevelSetup, World};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 160;
const SKY: u32 = 0xff10_1030;
const ROCK: u32 = 0xff8a_5a2b;
const STEEL: u32 = 0xff9a_9aa8;
const MARKER: u32 = 0xffff_ffff;

/// Player action the demo performs at a fixed tick.
#[derive(Clone, Copy, Debug)]
enum Action {
    Assign { agent: u32, ability: Ability },
    Nuke,
}

const SCHEDULE: &[(u64, Action)] = &[
    (45, Action::Assign { agent: 0, ability: Ability::Climber }),
    (50, Action::Assign { agent: 0, ability: Ability::Floater }),
    (70, Action::Assign { agent: 1, ability: Ability::Builder }),
    (120, Action::Assign { agent: 2, ability: Ability::Basher }),
    (130, Action::Assign { agent: 3, ability: Ability::Digger }),
    (160, Action::Assign { agent: 4, ability: Ability::Miner }),
    (200, Action::Assign { agent: 5, ability: Ability::Bomber }),
    (230, Action::Assign { agent: 6, ability: Ability::Stopper }),
    (600, Action::Nuke),
];

/// Builds the demo level: a floor with a steel plug, a climbable wall guarded
/// by a no-dig arrow, a pool of water to the left and an exit to the right.
pub(crate) fn level() -> Result<LevelSetup> {
    let mut terrain = Terrain::new(WIDTH, HEIGHT, SKY, 2);
    terrain.fill_rect(0, 120, WIDTH, 40, attr::BRICK, ROCK);
    terrain.fill_rect(140, 120, 24, 30, attr::BRICK | attr::STEEL, STEEL);
    terrain.fill_rect(250, 50, 12, 70, attr::BRICK, ROCK);

    let objects = [
        LevelObject::new(ObjectKind::Entrance, 62, 70, PixelBuffer::filled(16, 10, MARKER)),
        LevelObject::new(ObjectKind::TrapDrown, 8, 108, PixelBuffer::filled(32, 12, MARKER)),
        LevelObject::new(ObjectKind::Exit, 210, 106, PixelBuffer::filled(12, 14, MARKER)),
        LevelObject::new(ObjectKind::NoDigRight, 250, 50, PixelBuffer::filled(12, 70, MARKER)),
    ];
    for object in objects {
        let kind = object.kind();
        let _ = terrain
            .add_object(object)
            .with_context(|| format!("placing the {kind:?} object"))?;
    }

    Ok(LevelSetup {
        geometry: LevelGeometry {
            width: WIDTH,
            height: HEIGHT,
            max_safe_fall: 63,
            entrances: vec![PixelCoord::new(70, 84)],
        },
        terrain,
        skills: SkillCounts::uniform(10),
        agents_total: 20,
        release_rate: 60,
    })
}

/// Counters of notable events seen during a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub(crate) granted: u32,
    pub(crate) rejected: u32,
    pub(crate) explosions: u32,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SkillAssigned { .. } => self.granted += 1,
                Event::AssignmentRejected { .. } => self.rejected += 1,
                Event::ExplosionSpawned { .. } => self.explosions += 1,
                _ => {}
            }
        }
    }
}

/// Outcome of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) stats: LevelStats,
    pub(crate) skills: SkillCounts,
    pub(crate) tally: Tally,
    pub(crate) bricks: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats;
        writeln!(
            f,
            "after {} ticks: released {}/{}, rescued {}, lost {}, alive {}",
            self.ticks, stats.released, stats.total, stats.rescued, stats.lost, stats.alive
        )?;
        writeln!(
            f,
            "assignments: {} granted, {} rejected; explosions: {}",
            self.tally.granted, self.tally.rejected, self.tally.explosions
        )?;
        write!(f, "skills left:")?;
        for ability in Ability::LEDGER {
            write!(f, " {ability:?}={}", self.skills.get(ability).unwrap_or(0))?;
        }
        writeln!(f)?;
        write!(f, "terrain: {} brick pixels", self.bricks)
    }
}

/// Drives a world with the release and skill panel systems plus the schedule.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    release: Release,
    panel: SkillPanel,
    events: Vec<Event>,
    commands: Vec<Command>,
    tally: Tally,
}

impl Session {
    pub(crate) fn new(world: World) -> Self {
        let entrances = query::geometry(&world).entrances.len();
        let release = Release::new(Config::new(query::release_rate(&world), entrances));
        Self {
            world,
            release,
            panel: SkillPanel::new(),
            events: Vec::new(),
            commands: Vec::new(),
            tally: Tally::default(),
        }
    }

    /// Runs until `ticks` ticks elapsed or the level is over.
    pub(crate) fn run(&mut self, ticks: u64) -> Summary {
        while query::tick_index(&self.world) < ticks && !query::is_finished(&self.world) {
            self.step();
        }
        let summary = self.summary();
        log::info!(
            "session ended after {} ticks with {} rescued",
            summary.ticks,
            summary.stats.rescued
        );
        summary
    }

    fn step(&mut self) {
        let input = self.scripted_input(query::tick_index(&self.world));
        self.release.handle(&self.events, &mut self.commands);
        self.panel.handle(
            &self.events,
            &query::agent_view(&self.world),
            input,
            &mut self.commands,
        );

        self.events.clear();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        world::apply(&mut self.world, Command::Tick, &mut self.events);
        self.tally.record(&self.events);
    }

    fn scripted_input(&self, tick: u64) -> PanelInput {
        let Some((_, action)) = SCHEDULE.iter().find(|(at, _)| *at == tick) else {
            return PanelInput::default();
        };
        match *action {
            Action::Nuke => PanelInput::new(None, None, true),
            Action::Assign { agent, ability } => {
                let click = query::agent_view(&self.world)
                    .iter()
                    .find(|snapshot| snapshot.id == AgentId::new(agent))
                    .map(|snapshot| {
                        PixelCoord::new(snapshot.position.x, snapshot.position.y - HIT_HEIGHT / 2)
                    });
                if click.is_none() {
                    log::debug!("agent {agent} is not in play at tick {tick}");
                }
                PanelInput::new(Some(ability), click, false)
            }
        }
    }

    fn summary(&self) -> Summary {
        Summary {
            ticks: query::tick_index(&self.world),
            stats: query::stats(&self.world),
            skills: query::skill_counts(&self.world),
            tally: self.tally,
            bricks: query::terrain(&self.world).stencil().count(attr::BRICK),
        }
    }
}
