use lemmings_core::{Skill, SoundEffect};
use lemmings_terrain::attr;

use crate::{agent::Agent, machine::TickContext};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    if agent.free_below(&ctx.ground(), 1) > 0 {
        return Skill::Faller;
    }
    Skill::Digger
}

/// Once per half cycle: remove the rows beneath the foot and sink into them.
pub(super) fn dig(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let resource = ctx.resource(Skill::Digger);
    let Some(placed) = resource.mask(agent.direction()) else {
        return Skill::Walker;
    };
    let (x, y) = placed.origin(agent.x, agent.y);
    let report = placed.mask().erase(ctx.terrain, x, y, 0, attr::STEEL);
    if report.aborted() {
        ctx.play(SoundEffect::Chink);
        return Skill::Walker;
    }

    agent.y += resource.advance.1;
    if agent.free_below(&ctx.ground(), 1) > 0 {
        return Skill::Faller;
    }
    Skill::Digger
}
