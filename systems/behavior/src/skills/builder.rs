use lemmings_core::{Skill, SoundEffect};

use crate::{agent::Agent, machine::TickContext};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let fall = ctx.physics.fall_distance_fall;
    let free = agent.free_below(&ctx.ground(), fall);
    if free >= fall {
        return Skill::Faller;
    }
    agent.y += free;
    Skill::Builder
}

/// End of an animation cycle: lay one step and climb onto it.
pub(super) fn lay(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let physics = ctx.physics;
    if agent.free_above(&ctx.ground(), physics.head_clearance) < physics.head_clearance {
        return Skill::Walker;
    }

    let resource = ctx.resource(Skill::Builder);
    if let Some(placed) = resource.mask(agent.direction()) {
        let (x, y) = placed.origin(agent.x, agent.y);
        placed
            .mask()
            .paint_step(ctx.terrain, x, y, 0, physics.builder_step_color);
    }
    agent.counter += 1;
    agent.x += resource.advance.0 * agent.step();
    agent.y += resource.advance.1;

    let laid = u32::try_from(agent.counter).unwrap_or(0);
    if laid >= physics.builder_steps_max {
        return Skill::BuilderEnd;
    }
    if laid >= physics.builder_steps_warning {
        ctx.play(SoundEffect::Ting);
    }
    Skill::Builder
}

pub(super) fn shrugged(_agent: &mut Agent, _ctx: &mut TickContext<'_>) -> Skill {
    Skill::Walker
}
