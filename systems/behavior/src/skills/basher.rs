use lemmings_core::{Skill, SoundEffect};
use lemmings_terrain::attr;

use crate::{agent::Agent, machine::TickContext};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let resource = ctx.resource(Skill::Basher);
    let physics = ctx.physics;
    let direction = agent.direction();

    if let Some(slot) = resource.erase_slot(agent.frame) {
        let Some(placed) = resource.mask(direction) else {
            return Skill::Walker;
        };
        let frames = placed.mask().frame_count().max(1);
        if slot % frames == 0 && !agent.can_bash(&ctx.ground()) {
            return Skill::Walker;
        }
        let (x, y) = placed.origin(agent.x, agent.y);
        let protect = attr::STEEL | attr::no_dig_for(direction);
        let report = placed.mask().erase(ctx.terrain, x, y, slot % frames, protect);
        if report.aborted() {
            ctx.play(SoundEffect::Chink);
            return Skill::Walker;
        }
    }

    if resource.advances_on(agent.frame) {
        agent.x += resource.advance.0 * agent.step();
        let free = agent.free_below(&ctx.ground(), physics.basher_fall_distance);
        if free >= physics.basher_fall_distance {
            return Skill::Faller;
        }
        agent.y += free;
    }
    Skill::Basher
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Skill};
    use lemmings_terrain::attr;

    use crate::skills::fixtures::{agent, Level, ROCK};

    #[test]
    fn steel_aborts_the_bash_without_erasing() {
        let mut level = Level::flat();
        level.terrain.fill_rect(21, 28, 14, 12, attr::BRICK | attr::STEEL, ROCK);
        let before = level.terrain.clone();
        let mut basher = agent(1, 20, 40, Skill::Basher, Direction::Right);
        basher.frame = 3;
        let mut agents = [basher];

        level.tick(&mut agents);

        assert_eq!(agents[0].skill(), Skill::Walker);
        assert_eq!(level.terrain.stencil(), before.stencil());
    }

    #[test]
    fn tunnels_through_brick_and_advances() {
        let mut level = Level::flat();
        level.terrain.fill_rect(21, 20, 30, 20, attr::BRICK, ROCK);
        let mut agents = [agent(1, 20, 40, Skill::Basher, Direction::Right)];

        for _ in 0..32 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0].skill(), Skill::Basher);
        assert_eq!(agents[0].x, 30);
        assert_eq!(agents[0].y, 40);
        assert!(!level.terrain.stencil().is_walk_on(25, 35));
        assert!(level.terrain.stencil().is_walk_on(25, 40));
    }

    #[test]
    fn stops_when_nothing_is_left_to_bash() {
        let mut level = Level::flat();
        let mut agents = [agent(1, 20, 40, Skill::Basher, Direction::Left)];

        for _ in 0..3 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0].skill(), Skill::Walker);
    }

    #[test]
    fn no_dig_arrows_only_block_their_direction() {
        let mut level = Level::flat();
        level
            .terrain
            .fill_rect(21, 28, 14, 12, attr::BRICK | attr::NO_DIG_LEFT, ROCK);
        let mut right = agent(1, 20, 40, Skill::Basher, Direction::Right);
        right.frame = 2;
        let mut left = agent(2, 36, 40, Skill::Basher, Direction::Left);
        left.frame = 2;
        let mut agents = [right, left];

        level.tick(&mut agents);

        assert_eq!(agents[0].skill(), Skill::Basher);
        assert_eq!(agents[1].skill(), Skill::Walker);
    }
}
