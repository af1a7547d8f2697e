//! Remaining ability counts and the rules for granting abilities.

use lemmings_core::{Ability, AssignError, Event, SkillCounts};
use lemmings_system_behavior::{
    change_skill, terrain_allows, Agent, PhysicsConfig, SkillTable, TickContext,
};
use lemmings_terrain::Terrain;

/// Level state an assignment may read or edit.
pub(crate) struct Surroundings<'a> {
    pub(crate) terrain: &'a mut Terrain,
    pub(crate) resources: &'a SkillTable,
    pub(crate) physics: &'a PhysicsConfig,
    pub(crate) max_safe_fall: i32,
}

/// Ledger of the abilities the player may still hand out.
#[derive(Clone, Debug)]
pub(crate) struct SkillLedger {
    initial: SkillCounts,
    remaining: SkillCounts,
    selected: Option<Ability>,
}

impl SkillLedger {
    /// Creates a ledger holding the level's initial counts.
    pub(crate) const fn new(counts: SkillCounts) -> Self {
        Self {
            initial: counts,
            remaining: counts,
            selected: None,
        }
    }

    pub(crate) const fn remaining(&self) -> SkillCounts {
        self.remaining
    }

    pub(crate) const fn selected(&self) -> Option<Ability> {
        self.selected
    }

    pub(crate) fn select(&mut self, ability: Ability) {
        self.selected = Some(ability);
    }

    /// Restores the initial counts and clears the selection.
    pub(crate) fn reset(&mut self) {
        self.remaining = self.initial;
        self.selected = None;
    }

    /// Grants `ability` to `agent`.
    ///
    /// Every check runs before anything is mutated, so a rejected assignment
    /// leaves the agent, the terrain and the counts untouched. Returns the
    /// count left afterwards, or `None` for abilities outside the ledger.
    pub(crate) fn assign(
        &mut self,
        agent: &mut Agent,
        ability: Ability,
        level: Surroundings<'_>,
        out_events: &mut Vec<Event>,
    ) -> Result<Option<u32>, AssignError> {
        if agent.is_gone() {
            return Err(AssignError::Inactive);
        }
        if agent.skill().is_terminal() {
            return Err(AssignError::Terminal);
        }

        match ability {
            Ability::Nuke => {
                if !agent.flag_nuke(level.physics) {
                    return Err(AssignError::AlreadyNuked);
                }
                agent.select(level.physics.select_ticks);
                return Ok(None);
            }
            Ability::Climber => {
                if agent.can_climb() {
                    return Err(AssignError::AlreadyCapable);
                }
                self.ensure_available(ability)?;
                let _ = agent.grant_climber();
            }
            Ability::Floater => {
                if agent.can_float() {
                    return Err(AssignError::AlreadyCapable);
                }
                self.ensure_available(ability)?;
                let _ = agent.grant_floater();
            }
            Ability::Bomber => {
                if agent.countdown().is_some() {
                    return Err(AssignError::AlreadyCountingDown);
                }
                self.ensure_available(ability)?;
                let _ = agent.arm(level.physics);
            }
            Ability::Stopper
            | Ability::Builder
            | Ability::Basher
            | Ability::Miner
            | Ability::Digger => {
                let skill = ability
                    .main_skill()
                    .ok_or(AssignError::CannotChangeSkill)?;
                if !agent.can_change_skill() {
                    return Err(AssignError::CannotChangeSkill);
                }
                if agent.skill() == skill {
                    return Err(AssignError::AlreadyActive);
                }
                if !terrain_allows(agent, skill, level.terrain, level.resources, level.physics) {
                    return Err(AssignError::TerrainBlocked);
                }
                self.ensure_available(ability)?;
                let mut ctx = TickContext::new(
                    level.terrain,
                    level.resources,
                    level.physics,
                    level.max_safe_fall,
                    out_events,
                );
                change_skill(agent, skill, &mut ctx);
            }
        }

        let _ = self.remaining.take(ability);
        agent.select(level.physics.select_ticks);
        Ok(self.remaining.get(ability))
    }

    fn ensure_available(&self, ability: Ability) -> Result<(), AssignError> {
        match self.remaining.get(ability) {
            Some(0) => Err(AssignError::Exhausted),
            _ => Ok(()),
        }
    }
}
