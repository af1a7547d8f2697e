#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic release system responsible for emitting agent release commands.

use lemmings_core::{Command, Event, ReleaseError};

const SLOWEST_RATE: u32 = 1;
const FASTEST_RATE: u32 = 99;
const MINIMUM_DELAY: u32 = 4;

/// Configuration parameters required to construct the release system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rate: u32,
    entrances: usize,
}

impl Config {
    /// Creates a configuration for a level with `entrances` entrances.
    ///
    /// The rate is clamped to `1..=99`; higher rates release faster.
    #[must_use]
    pub const fn new(rate: u32, entrances: usize) -> Self {
        let rate = if rate < SLOWEST_RATE {
            SLOWEST_RATE
        } else if rate > FASTEST_RATE {
            FASTEST_RATE
        } else {
            rate
        };
        Self { rate, entrances }
    }

    /// Ticks between two consecutive releases.
    #[must_use]
    pub const fn delay(&self) -> u32 {
        (FASTEST_RATE - self.rate) / 2 + MINIMUM_DELAY
    }
}

/// Pure system that releases agents at a fixed cadence, cycling entrances.
#[derive(Debug)]
pub struct Release {
    config: Config,
    elapsed: u32,
    next_entrance: usize,
    halted: bool,
}

impl Release {
    /// Creates a new release system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            elapsed: 0,
            next_entrance: 0,
            halted: false,
        }
    }

    /// Whether the system has stopped releasing for this attempt.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Consumes world events and emits release commands.
    ///
    /// A nuke or an exhausted level halts the system until the level restarts.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LevelRestarted => self.reset(),
                Event::NukeStarted
                | Event::ReleaseRejected {
                    reason: ReleaseError::Exhausted | ReleaseError::Nuking,
                    ..
                } => self.halted = true,
                Event::TimeAdvanced { .. } if !self.halted => self.advance(out),
                _ => {}
            }
        }
    }

    fn advance(&mut self, out: &mut Vec<Command>) {
        if self.config.entrances == 0 {
            return;
        }
        self.elapsed += 1;
        if self.elapsed < self.config.delay() {
            return;
        }
        self.elapsed = 0;
        out.push(Command::ReleaseAgent {
            entrance: self.next_entrance,
        });
        self.next_entrance = (self.next_entrance + 1) % self.config.entrances;
    }

    fn reset(&mut self) {
        self.elapsed = 0;
        self.next_entrance = 0;
        self.halted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_follows_the_release_rate() {
        assert_eq!(Config::new(99, 1).delay(), 4);
        assert_eq!(Config::new(50, 1).delay(), 28);
        assert_eq!(Config::new(1, 1).delay(), 53);
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        assert_eq!(Config::new(0, 1).delay(), Config::new(1, 1).delay());
        assert_eq!(Config::new(250, 1).delay(), Config::new(99, 1).delay());
    }

    #[test]
    fn levels_without_entrances_never_release() {
        let mut release = Release::new(Config::new(99, 0));
        let mut commands = Vec::new();
        for tick in 1..=20 {
            release.handle(&[Event::TimeAdvanced { tick }], &mut commands);
        }
        assert!(commands.is_empty());
    }
}
