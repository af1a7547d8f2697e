use lemmings_core::Skill;

use crate::{agent::Agent, machine::TickContext};

pub(super) fn step(agent: &mut Agent, ctx: &mut TickContext<'_>) -> Skill {
    let physics = ctx.physics;
    let free = agent.free_below(&ctx.ground(), physics.faller_step);
    if free == physics.force_fall() {
        agent.y += physics.faller_step;
        agent.counter += physics.faller_step;
        return Skill::Faller;
    }
    if free == 0 {
        if agent.counter > ctx.max_safe_fall {
            return Skill::Splatter;
        }
        agent.counter = 0;
        return Skill::Walker;
    }

    agent.y += free;
    agent.counter += free;
    if agent.can_float() && agent.counter >= physics.fall_distance_float {
        return Skill::FloaterStart;
    }
    Skill::Faller
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Event, Skill, SoundEffect};

    use crate::{
        config::PhysicsConfig,
        skills::fixtures::{agent, Level},
    };

    #[test]
    fn short_falls_land_as_walkers() {
        let mut level = Level::flat();
        let mut faller = agent(1, 10, 40, Skill::Faller, Direction::Right);
        faller.counter = 40;
        let mut agents = [faller];

        level.tick(&mut agents);

        assert_eq!(agents[0].skill(), Skill::Walker);
        assert_eq!(agents[0].counter(), 0);
    }

    #[test]
    fn long_falls_splat() {
        let mut level = Level::flat();
        let mut faller = agent(1, 10, 40, Skill::Faller, Direction::Right);
        faller.counter = 41;
        let mut agents = [faller];

        level.tick(&mut agents);

        assert_eq!(agents[0].skill(), Skill::Splatter);
        assert!(level.events.contains(&Event::SoundPlayed {
            effect: SoundEffect::Splat
        }));
    }

    #[test]
    fn accumulates_distance_while_falling() {
        let mut level = Level::flat();
        let mut agents = [agent(1, 10, 30, Skill::Faller, Direction::Right)];

        for _ in 0..3 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0].y, 39);
        assert_eq!(agents[0].counter(), 9);
        assert_eq!(agents[0].skill(), Skill::Faller);
    }

    #[test]
    fn widest_valid_step_never_sinks_into_the_floor() {
        let mut level = Level::flat();
        level.physics = PhysicsConfig {
            faller_step: 15,
            ..PhysicsConfig::default()
        };
        assert!(level.physics.validate().is_ok());
        let mut agents = [agent(1, 10, 24, Skill::Faller, Direction::Right)];

        level.tick(&mut agents);
        assert_eq!(agents[0].y, 39);

        level.tick(&mut agents);
        assert_eq!(agents[0].y, 40);
        assert_eq!(agents[0].skill(), Skill::Faller);

        level.tick(&mut agents);
        assert_eq!(agents[0].y, 40);
        assert_eq!(agents[0].skill(), Skill::Walker);
    }

    #[test]
    fn floaters_open_their_umbrella() {
        let mut level = Level::flat();
        let mut faller = agent(1, 10, 0, Skill::Faller, Direction::Right);
        assert!(faller.grant_floater());
        let mut agents = [faller];

        for _ in 0..11 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0].skill(), Skill::FloaterStart);
        assert_eq!(agents[0].y, 33);
    }
}
