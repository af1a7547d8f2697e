#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure skill-panel system translating player input into selection, assignment
//! and nuke commands.

use lemmings_core::{Ability, AgentId, AgentSnapshot, AgentView, Command, Event, PixelCoord};

/// Horizontal distance from the foot within which a click hits an agent.
pub const HIT_HALF_WIDTH: i32 = 4;
/// Height above the foot within which a click hits an agent.
pub const HIT_HEIGHT: i32 = 10;

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanelInput {
    /// Skill button pressed on this frame.
    pub select: Option<Ability>,
    /// Level position clicked on this frame.
    pub click: Option<PixelCoord>,
    /// Indicates whether the nuke button was confirmed on this frame.
    pub nuke: bool,
}

impl PanelInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(select: Option<Ability>, click: Option<PixelCoord>, nuke: bool) -> Self {
        Self {
            select,
            click,
            nuke,
        }
    }
}

/// Skill panel system that tracks the highlighted ability from world events.
#[derive(Clone, Debug, Default)]
pub struct SkillPanel {
    selected: Option<Ability>,
    nuking: bool,
}

impl SkillPanel {
    /// Creates a panel with nothing highlighted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selected: None,
            nuking: false,
        }
    }

    /// Ability the panel believes is highlighted.
    #[must_use]
    pub const fn selected(&self) -> Option<Ability> {
        self.selected
    }

    /// Consumes world events, the live agents and frame input to emit commands.
    ///
    /// A skill button press is applied before the click of the same frame, so a
    /// click assigns the freshly selected ability.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        input: PanelInput,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::AbilitySelected { ability } => self.selected = Some(*ability),
                Event::NukeStarted => self.nuking = true,
                Event::LevelRestarted => *self = Self::new(),
                _ => {}
            }
        }

        if let Some(ability) = input.select {
            if self.selected != Some(ability) {
                self.selected = Some(ability);
                out.push(Command::SelectAbility { ability });
            }
        }

        if let (Some(click), Some(_)) = (input.click, self.selected) {
            if let Some(agent) = agent_under(agents, click) {
                out.push(Command::AssignSelected { agent });
            }
        }

        if input.nuke && !self.nuking {
            self.nuking = true;
            out.push(Command::Nuke);
        }
    }
}

/// Agent whose hit box contains `click`, preferring the one whose foot is
/// closest. Ties go to the agent processed first.
#[must_use]
pub fn agent_under(agents: &AgentView, click: PixelCoord) -> Option<AgentId> {
    agents
        .iter()
        .filter(|agent| !agent.skill.is_terminal() && hit(agent, click))
        .min_by_key(|agent| distance(agent.position, click))
        .map(|agent| agent.id)
}

fn hit(agent: &AgentSnapshot, click: PixelCoord) -> bool {
    let dx = click.x - agent.position.x;
    let dy = agent.position.y - click.y;
    dx.abs() <= HIT_HALF_WIDTH && (0..=HIT_HEIGHT).contains(&dy)
}

fn distance(a: PixelCoord, b: PixelCoord) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

#[cfg(test)]
mod tests {
    use lemmings_core::{Direction, Skill};

    use super::*;

    fn snapshot(id: u32, x: i32, y: i32, skill: Skill) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(id),
            position: PixelCoord::new(x, y),
            sprite_origin: PixelCoord::new(x - 8, y - 10),
            direction: Direction::Right,
            skill,
            frame: 0,
            can_climb: false,
            can_float: false,
            nuked: false,
            countdown: None,
            selected: false,
        }
    }

    #[test]
    fn picks_the_closest_agent_in_reach() {
        let agents = AgentView::from_snapshots(vec![
            snapshot(0, 20, 40, Skill::Walker),
            snapshot(1, 23, 40, Skill::Walker),
            snapshot(2, 60, 40, Skill::Walker),
        ]);

        assert_eq!(
            agent_under(&agents, PixelCoord::new(22, 36)),
            Some(AgentId::new(1))
        );
        assert_eq!(agent_under(&agents, PixelCoord::new(40, 36)), None);
        assert_eq!(agent_under(&agents, PixelCoord::new(20, 45)), None);
    }

    #[test]
    fn dying_agents_cannot_be_picked() {
        let agents = AgentView::from_snapshots(vec![snapshot(0, 20, 40, Skill::Splatter)]);

        assert_eq!(agent_under(&agents, PixelCoord::new(20, 35)), None);
    }

    #[test]
    fn ties_go_to_the_first_agent() {
        let agents = AgentView::from_snapshots(vec![
            snapshot(4, 20, 40, Skill::Walker),
            snapshot(2, 20, 40, Skill::Builder),
        ]);

        assert_eq!(
            agent_under(&agents, PixelCoord::new(20, 38)),
            Some(AgentId::new(4))
        );
    }
}
