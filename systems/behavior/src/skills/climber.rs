use lemmings_core::{Skill, SoundEffect};

use crate::{
    agent::Agent,
    machine::{kill, TickContext},
};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let resource = ctx.resource(Skill::Climber);
    if resource.advances_on(agent.frame) {
        agent.y += resource.advance.1;
    }

    let clearance = ctx.physics.head_clearance;
    let free = agent.free_above(&ctx.ground(), clearance);
    if free < 0 {
        kill(agent, ctx, Some(SoundEffect::Die));
        return Skill::Climber;
    }
    if free < clearance {
        agent.turn();
        agent.x += agent.step();
        return Skill::Faller;
    }

    let wall = ctx
        .terrain
        .stencil()
        .is_walk_on(agent.x + agent.step(), agent.y - 1);
    if !wall {
        return Skill::ClimberToWalker;
    }
    Skill::Climber
}

/// Final frame of the climb: step onto the top of the wall.
pub(super) fn pull_over(agent: &mut Agent, _ctx: &mut TickContext<'_>) -> Skill {
    agent.x += agent.step();
    Skill::Walker
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Skill};
    use lemmings_terrain::attr;

    use crate::skills::fixtures::{agent, Level, ROCK};

    #[test]
    fn climbs_over_the_top_of_a_wall() {
        let mut level = Level::flat();
        level.terrain.fill_rect(11, 20, 4, 20, attr::BRICK, ROCK);
        let mut agents = [agent(1, 10, 40, Skill::Climber, Direction::Right)];

        let mut seen = Vec::new();
        for _ in 0..100 {
            level.tick(&mut agents);
            if seen.last() != Some(&agents[0].skill()) {
                seen.push(agents[0].skill());
            }
            if agents[0].skill() == Skill::Walker {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![Skill::Climber, Skill::ClimberToWalker, Skill::Walker]
        );
        assert_eq!((agents[0].x, agents[0].y), (11, 20));
    }

    #[test]
    fn falls_back_under_an_overhang() {
        let mut level = Level::flat();
        level.terrain.fill_rect(11, 20, 4, 20, attr::BRICK, ROCK);
        level.terrain.fill_rect(5, 28, 6, 1, attr::BRICK, ROCK);
        let mut agents = [agent(1, 10, 40, Skill::Climber, Direction::Right)];

        for _ in 0..4 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0].skill(), Skill::Faller);
        assert_eq!(agents[0].direction(), Direction::Left);
        assert_eq!(agents[0].x, 9);
    }

    #[test]
    fn dies_when_climbing_out_of_the_level() {
        let mut level = Level::flat();
        level.terrain.fill_rect(11, 0, 4, 40, attr::BRICK, ROCK);
        let mut agents = [agent(1, 10, 12, Skill::Climber, Direction::Right)];

        for _ in 0..8 {
            level.tick(&mut agents);
        }

        assert!(agents[0].has_died());
    }
}
