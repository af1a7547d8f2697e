use lemmings_core::Skill;

use crate::{agent::Agent, machine::TickContext};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let physics = ctx.physics;
    let obstacle = agent.above_ground(&ctx.ground());
    if obstacle > physics.jumper_jump {
        agent.y -= physics.jumper_step;
        return Skill::Jumper;
    }
    agent.y -= obstacle;
    Skill::Walker
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Skill};
    use lemmings_terrain::attr;

    use crate::skills::fixtures::{agent, Level, ROCK};

    #[test]
    fn hops_onto_medium_obstacles() {
        let mut level = Level::flat();
        level.terrain.fill_rect(31, 32, 4, 8, attr::BRICK, ROCK);
        let mut agents = [agent(1, 30, 40, Skill::Walker, Direction::Right)];

        let skills: Vec<Skill> = (0..4)
            .map(|_| {
                level.tick(&mut agents);
                agents[0].skill()
            })
            .collect();

        assert_eq!(
            skills,
            [Skill::Jumper, Skill::Jumper, Skill::Jumper, Skill::Walker]
        );
        assert_eq!((agents[0].x, agents[0].y), (31, 32));
    }
}
