//! Dispatch table from agent state to behavior unit.
//!
//! Every state owns a `step` handler that runs once per tick before the
//! driver's shared post-processing. Optional `trigger` and `finish` handlers
//! run when the animation reaches the configured trigger interval or the end
//! of a single-shot animation. Handlers return the state the agent should be
//! in afterwards; the driver commits the change.

use lemmings_core::Skill;

use crate::{agent::Agent, machine::TickContext};

mod basher;
mod bomber;
mod builder;
mod climber;
mod digger;
mod faller;
mod floater;
mod jumper;
mod miner;
pub(crate) mod stopper;
mod terminal;
mod walker;

pub(crate) type Handler = fn(&mut Agent, &mut TickContext<'_>) -> Skill;

/// Handlers of a single state.
#[derive(Clone, Copy)]
pub(crate) struct Unit {
    pub(crate) step: Handler,
    pub(crate) trigger: Option<Handler>,
    pub(crate) finish: Option<Handler>,
}

impl Unit {
    fn new(step: Handler) -> Self {
        Self {
            step,
            trigger: None,
            finish: None,
        }
    }

    fn on_trigger(mut self, trigger: Handler) -> Self {
        self.trigger = Some(trigger);
        self
    }

    fn on_finish(mut self, finish: Handler) -> Self {
        self.finish = Some(finish);
        self
    }
}

pub(crate) fn unit(skill: Skill) -> Unit {
    match skill {
        Skill::Walker => Unit::new(walker::step),
        Skill::Faller => Unit::new(faller::step),
        Skill::Climber => Unit::new(climber::step),
        Skill::ClimberToWalker => Unit::new(terminal::hold).on_finish(climber::pull_over),
        Skill::FloaterStart => Unit::new(floater::opening).on_finish(floater::opened),
        Skill::Floater => Unit::new(floater::step).on_trigger(floater::rewind),
        Skill::Jumper => Unit::new(jumper::step),
        Skill::Digger => Unit::new(digger::step).on_trigger(digger::dig),
        Skill::Basher => Unit::new(basher::step),
        Skill::Miner => Unit::new(miner::step),
        Skill::Builder => Unit::new(builder::step).on_trigger(builder::lay),
        Skill::BuilderEnd => Unit::new(terminal::hold).on_finish(builder::shrugged),
        Skill::Stopper => Unit::new(stopper::step),
        Skill::Bomber => Unit::new(bomber::step).on_finish(bomber::explode),
        Skill::BomberStopper => Unit::new(bomber::hold_zone).on_finish(bomber::explode),
        Skill::Splatter | Skill::Drowning | Skill::Trapped => {
            Unit::new(terminal::hold).on_finish(terminal::perish)
        }
        Skill::Exiting => Unit::new(terminal::hold).on_finish(terminal::leave),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lemmings_core::{AgentId, Direction, Event, PixelCoord, Skill};
    use lemmings_terrain::{attr, Terrain};

    use crate::{
        agent::Agent, config::PhysicsConfig, machine::TickContext, resources::SkillTable,
    };

    pub(crate) const ROCK: u32 = 0xff6b_4226;

    /// A level with a solid floor whose top row is 40.
    pub(crate) struct Level {
        pub(crate) terrain: Terrain,
        pub(crate) skills: SkillTable,
        pub(crate) physics: PhysicsConfig,
        pub(crate) events: Vec<Event>,
    }

    impl Level {
        pub(crate) fn flat() -> Self {
            let mut terrain = Terrain::new(120, 60, 0, 1);
            terrain.fill_rect(0, 40, 120, 20, attr::BRICK, ROCK);
            Self {
                terrain,
                skills: SkillTable::standard(),
                physics: PhysicsConfig::default(),
                events: Vec::new(),
            }
        }

        pub(crate) fn tick(&mut self, agents: &mut [Agent]) {
            let mut ctx = TickContext::new(
                &mut self.terrain,
                &self.skills,
                &self.physics,
                40,
                &mut self.events,
            );
            crate::machine::advance_agents(agents, &mut ctx);
        }

        pub(crate) fn enter(&mut self, agent: &mut Agent, skill: Skill) {
            let mut ctx = TickContext::new(
                &mut self.terrain,
                &self.skills,
                &self.physics,
                40,
                &mut self.events,
            );
            crate::machine::change_skill(agent, skill, &mut ctx);
        }
    }

    pub(crate) fn agent(id: u32, x: i32, y: i32, skill: Skill, direction: Direction) -> Agent {
        let mut agent = Agent::spawn(AgentId::new(id), PixelCoord::new(x, y));
        agent.skill = skill;
        agent.direction = direction;
        agent
    }
}
