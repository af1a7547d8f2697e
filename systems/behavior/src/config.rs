//! Tunable physics constants.

use serde::Deserialize;
use thiserror::Error;

/// Failures raised while loading a physics configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML for this configuration.
    #[error("failed to parse physics configuration")]
    Parse(#[from] toml::de::Error),
    /// A distance, step or count must be strictly positive.
    #[error("`{field}` must be positive, found {value}")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Value that was found.
        value: i64,
    },
    /// Two related constants are in the wrong order.
    #[error("`{lower}` must not exceed `{upper}`")]
    Inverted {
        /// Field expected to be the smaller one.
        lower: &'static str,
        /// Field expected to be the larger one.
        upper: &'static str,
    },
    /// The floater needs at least one deceleration entry.
    #[error("`floater_deceleration` must not be empty")]
    EmptyDeceleration,
    /// A downward probe could measure as many free pixels as the force-fall
    /// sentinel, making the two indistinguishable.
    #[error("`{field}` probes {value} pixels but must stay below the force-fall value {limit}")]
    ProbeReachesForceFall {
        /// Offending field.
        field: &'static str,
        /// Pixels the probe scans.
        value: i32,
        /// Force-fall sentinel the probe must stay below.
        limit: i32,
    },
}

/// Every constant the behavior units read.
///
/// Distances are pixels; durations are ticks.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Drop a walker tolerates before it becomes a faller.
    pub fall_distance_fall: i32,
    /// Fall distance after which a floater opens its umbrella.
    pub fall_distance_float: i32,
    /// Pixels a faller drops per tick.
    pub faller_step: i32,
    /// Pixels an open floater drops per tick.
    pub floater_step: i32,
    /// Per-frame drop while the umbrella opens.
    pub floater_deceleration: Vec<i32>,
    /// Frames the floater animation rewinds on wrap.
    pub floater_rewind: u32,
    /// Obstacle height a walker treats as a wall.
    pub walker_obstacle_height: i32,
    /// Obstacle height above which a walker jumps instead of stepping up.
    pub jumper_jump: i32,
    /// Pixels a jumper rises per tick.
    pub jumper_step: i32,
    /// Height of the collision midpoint above the foot.
    pub collision_mid: i32,
    /// Free pixels required above the midpoint for climbing and building.
    pub head_clearance: i32,
    /// Half width of the window a digger probes.
    pub dig_probe_half_width: i32,
    /// Drop a basher tolerates before it becomes a faller.
    pub basher_fall_distance: i32,
    /// Columns ahead a basher probes for brick.
    pub bash_probe_reach: i32,
    /// Highest probed row above the foot.
    pub bash_probe_top: i32,
    /// Lowest probed row above the foot.
    pub bash_probe_bottom: i32,
    /// Drop a miner tolerates after advancing.
    pub miner_fall_distance: i32,
    /// Columns ahead a miner probes.
    pub mine_probe_reach: i32,
    /// Rows above the foot a miner probes.
    pub mine_probe_above: i32,
    /// Rows below the foot a miner probes.
    pub mine_probe_below: i32,
    /// Steps a builder lays before it shrugs.
    pub builder_steps_max: u32,
    /// Step count from which every step plays a warning.
    pub builder_steps_warning: u32,
    /// Colour of builder steps.
    pub builder_step_color: u32,
    /// Digits of the explosion countdown.
    pub explode_counter: u8,
    /// Ticks per countdown digit.
    pub explode_step_ticks: u32,
    /// Ticks an agent shows assignment feedback.
    pub select_ticks: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fall_distance_fall: 8,
            fall_distance_float: 32,
            faller_step: 3,
            floater_step: 1,
            floater_deceleration: vec![3, 3, 3, 3, 2, 2, 1, 1],
            floater_rewind: 5,
            walker_obstacle_height: 14,
            jumper_jump: 4,
            jumper_step: 2,
            collision_mid: 5,
            head_clearance: 6,
            dig_probe_half_width: 4,
            basher_fall_distance: 6,
            bash_probe_reach: 16,
            bash_probe_top: 8,
            bash_probe_bottom: 2,
            miner_fall_distance: 3,
            mine_probe_reach: 6,
            mine_probe_above: 2,
            mine_probe_below: 2,
            builder_steps_max: 12,
            builder_steps_warning: 9,
            builder_step_color: 0xffc8_9848,
            explode_counter: 5,
            explode_step_ticks: 16,
            select_ticks: 20,
        }
    }
}

impl PhysicsConfig {
    /// Parses a configuration, filling omitted fields with defaults, and
    /// validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Force-fall sentinel returned by downward probes that leave the level.
    #[must_use]
    pub const fn force_fall(&self) -> i32 {
        self.fall_distance_fall * 2
    }

    /// Checks that every constant is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("fall_distance_fall", i64::from(self.fall_distance_fall)),
            ("fall_distance_float", i64::from(self.fall_distance_float)),
            ("faller_step", i64::from(self.faller_step)),
            ("floater_step", i64::from(self.floater_step)),
            ("walker_obstacle_height", i64::from(self.walker_obstacle_height)),
            ("jumper_jump", i64::from(self.jumper_jump)),
            ("jumper_step", i64::from(self.jumper_step)),
            ("collision_mid", i64::from(self.collision_mid)),
            ("head_clearance", i64::from(self.head_clearance)),
            ("basher_fall_distance", i64::from(self.basher_fall_distance)),
            ("bash_probe_reach", i64::from(self.bash_probe_reach)),
            ("mine_probe_reach", i64::from(self.mine_probe_reach)),
            ("builder_steps_max", i64::from(self.builder_steps_max)),
            ("explode_counter", i64::from(self.explode_counter)),
            ("explode_step_ticks", i64::from(self.explode_step_ticks)),
        ];
        if let Some((field, value)) = positive.into_iter().find(|(_, value)| *value <= 0) {
            return Err(ConfigError::NotPositive { field, value });
        }
        if let Some(value) = self.floater_deceleration.iter().find(|step| **step <= 0) {
            return Err(ConfigError::NotPositive {
                field: "floater_deceleration",
                value: i64::from(*value),
            });
        }
        if self.floater_deceleration.is_empty() {
            return Err(ConfigError::EmptyDeceleration);
        }
        let ordered = [
            ("jumper_jump", self.jumper_jump, "walker_obstacle_height", self.walker_obstacle_height),
            ("bash_probe_bottom", self.bash_probe_bottom, "bash_probe_top", self.bash_probe_top),
            (
                "fall_distance_fall",
                self.fall_distance_fall,
                "fall_distance_float",
                self.fall_distance_float,
            ),
        ];
        if let Some((lower, _, upper, _)) = ordered
            .into_iter()
            .find(|(_, low, _, high)| low > high)
        {
            return Err(ConfigError::Inverted { lower, upper });
        }
        if self.builder_steps_warning > self.builder_steps_max {
            return Err(ConfigError::Inverted {
                lower: "builder_steps_warning",
                upper: "builder_steps_max",
            });
        }
        self.validate_probe_reach()
    }

    fn validate_probe_reach(&self) -> Result<(), ConfigError> {
        let limit = self.force_fall();
        let deceleration = self.floater_deceleration.iter().copied().max().unwrap_or(0);
        let probes = [
            ("faller_step", self.faller_step),
            ("floater_step", self.floater_step),
            ("floater_deceleration", deceleration),
            ("basher_fall_distance", self.basher_fall_distance),
            ("miner_fall_distance", self.miner_fall_distance.saturating_add(1)),
        ];
        if let Some((field, value)) = probes.into_iter().find(|(_, value)| *value >= limit) {
            return Err(ConfigError::ProbeReachesForceFall {
                field,
                value,
                limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
        assert_eq!(PhysicsConfig::default().force_fall(), 16);
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let config = PhysicsConfig::from_toml_str("faller_step = 4\nbuilder_steps_max = 10\n")
            .expect("valid config");
        assert_eq!(config.faller_step, 4);
        assert_eq!(config.builder_steps_max, 10);
        assert_eq!(config.walker_obstacle_height, 14);
    }

    #[test]
    fn rejects_non_positive_steps() {
        let error = PhysicsConfig::from_toml_str("faller_step = 0").expect_err("invalid");
        assert!(matches!(
            error,
            ConfigError::NotPositive {
                field: "faller_step",
                value: 0
            }
        ));
    }

    #[test]
    fn rejects_warning_after_maximum() {
        let error = PhysicsConfig::from_toml_str("builder_steps_warning = 20").expect_err("invalid");
        assert!(matches!(
            error,
            ConfigError::Inverted {
                lower: "builder_steps_warning",
                ..
            }
        ));
    }

    #[test]
    fn probes_must_stay_below_the_force_fall_value() {
        let error = PhysicsConfig::from_toml_str("faller_step = 20").expect_err("invalid");
        assert!(matches!(
            error,
            ConfigError::ProbeReachesForceFall {
                field: "faller_step",
                value: 20,
                limit: 16
            }
        ));
        assert!(matches!(
            PhysicsConfig::from_toml_str("floater_deceleration = [3, 16]"),
            Err(ConfigError::ProbeReachesForceFall {
                field: "floater_deceleration",
                ..
            })
        ));
        assert!(matches!(
            PhysicsConfig::from_toml_str("miner_fall_distance = 15"),
            Err(ConfigError::ProbeReachesForceFall {
                field: "miner_fall_distance",
                value: 16,
                ..
            })
        ));
        assert!(PhysicsConfig::from_toml_str("faller_step = 15").is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            PhysicsConfig::from_toml_str("gravity = 9"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_empty_deceleration() {
        assert!(matches!(
            PhysicsConfig::from_toml_str("floater_deceleration = []"),
            Err(ConfigError::EmptyDeceleration)
        ));
    }
}
