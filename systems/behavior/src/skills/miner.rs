use lemmings_core::{Skill, SoundEffect};
use lemmings_terrain::attr;

use crate::{agent::Agent, machine::TickContext};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let resource = ctx.resource(Skill::Miner);
    let physics = ctx.physics;
    let direction = agent.direction();
    let protect = attr::STEEL | attr::no_dig_for(direction);

    if resource.erase_slot(agent.frame).is_some() {
        if let Some(probe) = resource.indestructible(direction) {
            let (x, y) = probe.origin(agent.x, agent.y);
            if probe.mask().check_type(ctx.terrain, x, y, 0, protect) {
                ctx.play(SoundEffect::Chink);
                return Skill::Walker;
            }
        }
        let Some(placed) = resource.mask(direction) else {
            return Skill::Walker;
        };
        let (x, y) = placed.origin(agent.x, agent.y);
        if placed.mask().erase(ctx.terrain, x, y, 0, protect).aborted() {
            ctx.play(SoundEffect::Chink);
            return Skill::Walker;
        }
    }

    if resource.advances_on(agent.frame) {
        agent.x += resource.advance.0 * agent.step();
        agent.y += resource.advance.1;
        let free = agent.free_below(&ctx.ground(), physics.miner_fall_distance + 1);
        if free > physics.miner_fall_distance {
            return Skill::Faller;
        }
        agent.y += free;
    }
    Skill::Miner
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Event, Skill, SoundEffect};
    use lemmings_terrain::attr;

    use crate::skills::fixtures::{agent, Level, ROCK};

    #[test]
    fn mines_a_diagonal_tunnel() {
        let mut level = Level::flat();
        let mut agents = [agent(1, 20, 40, Skill::Miner, Direction::Right)];

        for _ in 0..24 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0].skill(), Skill::Miner);
        assert_eq!((agents[0].x, agents[0].y), (24, 42));
        assert!(!level.terrain.stencil().is_walk_on(22, 40));
        assert!(level.terrain.stencil().is_walk_on(24, 42));
    }

    #[test]
    fn steel_ahead_stops_the_miner_before_erasing() {
        let mut level = Level::flat();
        level.terrain.fill_rect(24, 40, 10, 4, attr::STEEL, ROCK);
        let before = level.terrain.clone();
        let mut miner = agent(1, 20, 40, Skill::Miner, Direction::Right);
        miner.frame = 1;
        let mut agents = [miner];

        level.tick(&mut agents);

        assert_eq!(agents[0].skill(), Skill::Walker);
        assert_eq!(level.terrain, before);
        assert!(level.events.contains(&Event::SoundPlayed {
            effect: SoundEffect::Chink
        }));
    }
}
