//! Stopper zone bookkeeping and the stationary stopper state.

use lemmings_core::Skill;
use lemmings_terrain::{attr, Terrain};

use crate::{
    agent::{Agent, StopperZone},
    machine::TickContext,
    resources::SkillTable,
};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let fall = ctx.physics.fall_distance_fall;
    let free = agent.free_below(&ctx.ground(), fall);
    if free == 0 {
        return Skill::Stopper;
    }
    if free >= fall {
        return Skill::Faller;
    }
    agent.y += free;
    Skill::Walker
}

/// Stamps the agent's zone and remembers where it was stamped.
pub(crate) fn stamp_zone(agent: &mut Agent, ctx: &mut TickContext<'_>) {
    let direction = agent.direction();
    let Some(placed) = ctx.resource(Skill::Stopper).mask(direction) else {
        return;
    };
    let origin = placed.origin(agent.x, agent.y);
    placed
        .mask()
        .set_stopper(ctx.terrain, origin.0, origin.1, agent.x);
    agent.stopper_zone = Some(StopperZone { origin, direction });
}

/// Removes the zone the agent holds, if any.
pub(crate) fn clear_zone(agent: &mut Agent, ctx: &mut TickContext<'_>) {
    let Some(zone) = agent.stopper_zone.take() else {
        return;
    };
    let Some(placed) = ctx.resource(Skill::Stopper).mask(zone.direction) else {
        return;
    };
    placed
        .mask()
        .clear_type(ctx.terrain, zone.origin.0, zone.origin.1, 0, attr::STOPPER);
}

/// Whether a zone stamped at the agent's position would overlap another one.
pub(crate) fn zone_is_free(agent: &Agent, terrain: &Terrain, skills: &SkillTable) -> bool {
    let Some(placed) = skills.get(Skill::Stopper).mask(agent.direction()) else {
        return true;
    };
    let (x, y) = placed.origin(agent.x, agent.y);
    !placed.mask().check_type(terrain, x, y, 0, attr::STOPPER)
}
