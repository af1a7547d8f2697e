use lemmings_core::Skill;

use crate::{agent::Agent, machine::TickContext};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let physics = ctx.physics;
    let ground = ctx.ground();
    agent.x += agent.step();

    let free = agent.free_below(&ground, physics.fall_distance_fall);
    if free == physics.force_fall() {
        agent.y += physics.faller_step;
        agent.counter += physics.faller_step;
        return Skill::Faller;
    }
    agent.y += free;
    agent.counter += free;
    if free >= physics.fall_distance_fall {
        return Skill::Faller;
    }
    agent.counter = 0;

    let obstacle = agent.above_ground(&ground);
    if obstacle >= physics.walker_obstacle_height {
        agent.x -= agent.step();
        if agent.can_climb() {
            return Skill::Climber;
        }
        agent.turn();
        return Skill::Walker;
    }
    if obstacle > physics.jumper_jump {
        return Skill::Jumper;
    }
    agent.y -= obstacle;

    if agent.turned_by_stopper(&ground) {
        agent.turn();
    }
    Skill::Walker
}
