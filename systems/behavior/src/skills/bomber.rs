use lemmings_core::{Event, PixelCoord, Skill, SoundEffect};
use lemmings_terrain::attr;

use crate::{agent::Agent, machine::TickContext};

use super::stopper;

/// A bomber keeps falling while its countdown animation plays.
pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let physics = ctx.physics;
    let free = agent.free_below(&ctx.ground(), physics.faller_step);
    agent.y += if free == physics.force_fall() {
        physics.faller_step
    } else {
        free
    };
    Skill::Bomber
}

/// A bomber stopper holds its zone until the ground gives way.
pub(super) fn hold_zone(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    if agent.free_below(&ctx.ground(), 1) > 0 {
        return Skill::Bomber;
    }
    Skill::BomberStopper
}

pub(super) fn explode(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    stopper::clear_zone(agent, ctx);
    let skill = agent.skill();
    if let Some(placed) = ctx.resource(skill).mask(agent.direction()) {
        let (x, y) = placed.origin(agent.x, agent.y);
        let _ = placed.mask().erase(ctx.terrain, x, y, 0, attr::STEEL);
    }
    ctx.play(SoundEffect::Explode);
    ctx.events.push(Event::ExplosionSpawned {
        at: PixelCoord::new(agent.x, agent.mid_y(ctx.physics)),
    });
    agent.mark_died();
    skill
}
