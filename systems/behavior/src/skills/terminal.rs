use lemmings_core::Skill;

use crate::{agent::Agent, machine::TickContext};

pub(super) fn hold(agent: &mut Agent, _ctx: &mut TickContext<'_>) -> Skill {
    agent.skill()
}

pub(super) fn perish(agent: &mut Agent, _ctx: &mut TickContext<'_>) -> Skill {
    agent.mark_died();
    agent.skill()
}

pub(super) fn leave(agent: &mut Agent, _ctx: &mut TickContext<'_>) -> Skill {
    agent.mark_left();
    agent.skill()
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Skill};

    use crate::skills::fixtures::{agent, Level};

    #[test]
    fn terminal_animations_end_in_removal() {
        let mut level = Level::flat();
        let mut agents = [
            agent(1, 10, 40, Skill::Splatter, Direction::Right),
            agent(2, 30, 40, Skill::Exiting, Direction::Right),
        ];

        for _ in 0..16 {
            level.tick(&mut agents);
        }

        assert!(agents[0].has_died());
        assert!(!agents[0].has_left());
        assert!(agents[1].has_left());
        assert!(!agents[1].has_died());
    }

    #[test]
    fn removed_agents_never_change_again() {
        let mut level = Level::flat();
        let mut agents = [agent(1, 10, 40, Skill::Drowning, Direction::Right)];
        for _ in 0..16 {
            level.tick(&mut agents);
        }
        assert!(agents[0].has_died());
        let frozen = agents[0].clone();

        level.enter(&mut agents[0], Skill::Walker);
        for _ in 0..8 {
            level.tick(&mut agents);
        }

        assert_eq!(agents[0], frozen);
    }
}
