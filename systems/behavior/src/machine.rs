use lemmings_core::{Event, Skill, SoundEffect};
use lemmings_terrain::{attr, Terrain};

use crate::{
    agent::{Agent, Ground},
    config::PhysicsConfig,
    resources::{Animation, SkillResource, SkillTable},
    skills::{self, stopper},
};

/// Everything a behavior unit may read or mutate during one tick.
#[derive(Debug)]
pub struct TickContext<'a> {
    pub(crate) terrain: &'a mut Terrain,
    pub(crate) skills: &'a SkillTable,
    pub(crate) physics: &'a PhysicsConfig,
    pub(crate) max_safe_fall: i32,
    pub(crate) events: &'a mut Vec<Event>,
}

impl<'a> TickContext<'a> {
    /// Bundles the shared simulation state for one tick.
    pub fn new(
        terrain: &'a mut Terrain,
        skills: &'a SkillTable,
        physics: &'a PhysicsConfig,
        max_safe_fall: i32,
        events: &'a mut Vec<Event>,
    ) -> Self {
        Self {
            terrain,
            skills,
            physics,
            max_safe_fall,
            events,
        }
    }

    pub(crate) fn ground(&self) -> Ground<'_> {
        Ground::new(self.terrain.stencil(), self.physics)
    }

    pub(crate) fn resource(&self, skill: Skill) -> &'a SkillResource {
        self.skills.get(skill)
    }

    pub(crate) fn play(&mut self, effect: SoundEffect) {
        self.events.push(Event::SoundPlayed { effect });
    }

    fn level_width(&self) -> i32 {
        i32::try_from(self.terrain.width()).unwrap_or(i32::MAX)
    }

    fn level_height(&self) -> i32 {
        i32::try_from(self.terrain.height()).unwrap_or(i32::MAX)
    }
}

enum FrameEvent {
    Idle,
    Trigger,
    Finished,
}

/// Advances every live agent by one tick in slice order.
///
/// Agents are processed sequentially, so terrain edits made by one agent are
/// visible to the probes of every agent after it.
pub fn advance_agents(agents: &mut [Agent], ctx: &mut TickContext<'_>) {
    for agent in agents.iter_mut() {
        advance_agent(agent, ctx);
    }
}

/// Advances a single agent by one tick.
pub fn advance_agent(agent: &mut Agent, ctx: &mut TickContext<'_>) {
    if agent.is_gone() {
        return;
    }
    let explode = agent.tick_timers(ctx.physics);
    let current = agent.skill();
    let unit = skills::unit(current);

    let mut next = match current.explode_target() {
        Some(target) if explode => target,
        _ => (unit.step)(agent, ctx),
    };
    if agent.is_gone() {
        return;
    }

    flip_at_border(agent, ctx);
    if agent.y >= ctx.level_height() {
        kill(agent, ctx, Some(SoundEffect::Die));
        return;
    }

    if !current.is_terminal() && !next.is_terminal() {
        next = dispatch_hazards(agent, next, ctx);
        if agent.is_gone() {
            return;
        }
    }

    if next != current {
        change_skill(agent, next, ctx);
        return;
    }

    let handler = match advance_frame(agent, ctx.resource(current)) {
        FrameEvent::Idle => None,
        FrameEvent::Trigger => unit.trigger,
        FrameEvent::Finished => unit.finish,
    };
    if let Some(handler) = handler {
        let next = handler(agent, ctx);
        change_skill(agent, next, ctx);
    }
}

/// Commits a state transition together with its entry and exit side effects.
///
/// Leaving a stopper state removes the stopper zone, except when the stopper
/// turns into a bomber stopper. Agents that died or left never change state.
pub fn change_skill(agent: &mut Agent, to: Skill, ctx: &mut TickContext<'_>) {
    let from = agent.skill();
    if agent.is_gone() || from == to {
        return;
    }
    if to != Skill::BomberStopper {
        stopper::clear_zone(agent, ctx);
    }

    agent.skill = to;
    agent.frame = 0;
    agent.counter2 = 0;
    if to != Skill::Faller {
        agent.counter = 0;
    }

    match to {
        Skill::Stopper => stopper::stamp_zone(agent, ctx),
        Skill::Splatter => ctx.play(SoundEffect::Splat),
        Skill::Drowning => ctx.play(SoundEffect::Drown),
        Skill::Exiting => ctx.play(SoundEffect::Yippee),
        Skill::Bomber | Skill::BomberStopper
            if !matches!(from, Skill::Bomber | Skill::BomberStopper) =>
        {
            ctx.play(SoundEffect::OhNo);
        }
        _ => {}
    }

    log::debug!("agent {} {:?} -> {:?}", agent.id().get(), from, to);
    ctx.events.push(Event::SkillChanged {
        agent: agent.id(),
        from,
        to,
    });
}

/// Whether the terrain around the agent permits entering `skill`.
#[must_use]
pub fn terrain_allows(
    agent: &Agent,
    skill: Skill,
    terrain: &Terrain,
    skills: &SkillTable,
    physics: &PhysicsConfig,
) -> bool {
    let ground = Ground::new(terrain.stencil(), physics);
    match skill {
        Skill::Stopper => {
            agent.free_below(&ground, 1) == 0 && stopper::zone_is_free(agent, terrain, skills)
        }
        Skill::Builder => agent.free_below(&ground, 1) == 0,
        Skill::Basher => agent.can_bash(&ground),
        Skill::Miner => agent.can_mine(&ground),
        Skill::Digger => agent.can_dig(&ground),
        _ => true,
    }
}

/// Removes the agent from play, releasing any stopper zone it holds.
pub(crate) fn kill(agent: &mut Agent, ctx: &mut TickContext<'_>, effect: Option<SoundEffect>) {
    stopper::clear_zone(agent, ctx);
    if let Some(effect) = effect {
        ctx.play(effect);
    }
    agent.mark_died();
}

fn flip_at_border(agent: &mut Agent, ctx: &TickContext<'_>) {
    let width = ctx.level_width();
    if agent.x < 0 {
        agent.x = 0;
        agent.turn();
    } else if agent.x >= width {
        agent.x = width - 1;
        agent.turn();
    }
}

fn dispatch_hazards(agent: &mut Agent, next: Skill, ctx: &mut TickContext<'_>) -> Skill {
    let ground = ctx.ground();
    let cell = agent.stencil_mid(&ground);
    let mid_y = agent.mid_y(ctx.physics);
    let object = ctx.terrain.stencil().object_at(agent.x, mid_y);

    if cell & attr::TRAP_DROWN != 0 {
        return Skill::Drowning;
    }

    if cell & (attr::TRAP_DIE | attr::TRAP_REPLACE) != 0 {
        let Some(trap) = object.and_then(|id| ctx.terrain.object_mut(id)) else {
            return next;
        };
        let sound = trap.sound().unwrap_or(SoundEffect::Die);
        if cell & attr::TRAP_DIE != 0 && !trap.is_triggerable() {
            ctx.play(sound);
            return Skill::Trapped;
        }
        if trap.trigger() {
            kill(agent, ctx, Some(sound));
        }
        return next;
    }

    if cell & attr::EXIT != 0 && next.can_exit() {
        return Skill::Exiting;
    }
    next
}

fn advance_frame(agent: &mut Agent, resource: &SkillResource) -> FrameEvent {
    let frames = resource.frames.max(1);
    match resource.animation {
        Animation::Loop => agent.frame = (agent.frame + 1) % frames,
        Animation::Once => {
            if agent.frame + 1 >= frames {
                agent.frame = frames - 1;
                return FrameEvent::Finished;
            }
            agent.frame += 1;
        }
    }
    if resource.mask_step > 0 && agent.frame % resource.mask_step == 0 {
        FrameEvent::Trigger
    } else {
        FrameEvent::Idle
    }
}
