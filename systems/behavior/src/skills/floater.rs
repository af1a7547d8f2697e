use lemmings_core::Skill;

use crate::{agent::Agent, machine::TickContext};

/// Umbrella opening: the drop per tick follows the deceleration table.
pub(super) fn opening(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let physics = ctx.physics;
    let speed = usize::try_from(agent.counter2)
        .ok()
        .and_then(|index| physics.floater_deceleration.get(index))
        .copied()
        .unwrap_or(physics.floater_step);
    agent.counter2 += 1;
    descend(agent, ctx, speed, Skill::FloaterStart)
}

pub(super) fn opened(_agent: &mut Agent, _ctx: &mut TickContext<'_>) -> Skill {
    Skill::Floater
}

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    descend(agent, ctx, ctx.physics.floater_step, Skill::Floater)
}

/// Loops the tail of the floating animation.
pub(super) fn rewind(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let frames = ctx.resource(Skill::Floater).frames;
    agent.frame = frames.saturating_sub(ctx.physics.floater_rewind);
    Skill::Floater
}

fn descend(agent: &mut Agent, ctx: &TickContext<'_>, speed: i32, stay: Skill) -> Skill {
    let free = agent.free_below(&ctx.ground(), speed);
    if free == ctx.physics.force_fall() {
        agent.y += speed;
        return stay;
    }
    if free == 0 {
        return Skill::Walker;
    }
    agent.y += free;
    stay
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Skill};

    use crate::skills::fixtures::{agent, Level};

    #[test]
    fn opening_decelerates_then_floats() {
        let mut level = Level::flat();
        let mut agents = [agent(1, 10, 0, Skill::FloaterStart, Direction::Right)];

        for _ in 0..8 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0].skill(), Skill::Floater);
        assert_eq!(agents[0].y, 18);

        level.tick(&mut agents);
        assert_eq!(agents[0].y, 19);
    }

    #[test]
    fn floating_animation_rewinds_on_wrap() {
        let mut level = Level::flat();
        let mut floater = agent(1, 10, 10, Skill::Floater, Direction::Right);
        floater.frame = 15;
        let mut agents = [floater];

        level.tick(&mut agents);

        assert_eq!(agents[0].frame(), 11);
    }

    #[test]
    fn lands_as_walker() {
        let mut level = Level::flat();
        let mut agents = [agent(1, 10, 39, Skill::Floater, Direction::Right)];

        level.tick(&mut agents);
        assert_eq!((agents[0].y, agents[0].skill()), (40, Skill::Floater));

        level.tick(&mut agents);
        assert_eq!(agents[0].skill(), Skill::Walker);
    }
}
