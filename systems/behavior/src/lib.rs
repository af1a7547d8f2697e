#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Agent behavior: terrain probes, per-skill state machines and the shared
//! per-tick driver.
//!
//! The driver advances agents in slice order. Each agent runs the step
//! handler of its current state, then the shared post-processing: border
//! flip, bottom-edge death, trap and exit dispatch, and animation advance with
//! its trigger and finish callbacks. All terrain edits go through
//! [`lemmings_terrain::Mask`] stamps, so an edit made by one agent is seen by
//! every agent processed after it in the same tick.

pub mod agent;
pub mod config;
mod machine;
pub mod resources;
mod skills;

pub use agent::{Agent, Countdown, Ground, StopperZone};
pub use config::{ConfigError, PhysicsConfig};
pub use machine::{advance_agent, advance_agents, change_skill, terrain_allows, TickContext};
pub use resources::{
    Animation, DirectedMasks, PlacedMask, ResourceError, SkillResource, SkillTable,
};
