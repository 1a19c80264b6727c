//! System configuration parameters
//!
//! All tunable parameters for ACPilot.  Values are compiled-in defaults and
//! can be replaced by a JSON document pushed by a provisioning collaborator
//! (see [`SystemConfig::from_json`]).

use serde::{Deserialize, Serialize};

use crate::decision::DecisionSource;
use crate::dispatch::ProtocolKind;
use crate::error::ConfigError;
use crate::inbound::Keymap;
use crate::model::device::{SETPOINT_MAX_C, SETPOINT_MIN_C};
use crate::model::FanSpeed;

/// Named thresholds for the rule table, in rule order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    // --- Rule 1: no-presence shutoff ---
    /// Room must be empty this long before the AC is turned off (ms).
    pub no_presence_shutoff_ms: u64,

    // --- Rule 2: extreme heat ---
    /// Temperature (°C) at or above which the AC is started aggressively.
    pub extreme_heat_c: f32,
    pub extreme_heat_setpoint_c: u8,
    pub extreme_heat_fan: FanSpeed,

    // --- Rule 3: moderate heat ---
    /// Temperature (°C) above which the AC is started normally.
    pub moderate_heat_c: f32,
    pub moderate_heat_setpoint_c: u8,
    pub moderate_heat_fan: FanSpeed,

    // --- Rule 4: over-cooling ---
    /// Temperature (°C) at or below which a running AC is stopped.
    pub overcool_c: f32,

    // --- Rule 5: humidity ---
    /// Relative humidity (%) above which a running AC switches to Dry.
    pub humidity_high_pct: f32,
    /// Humidity correction only applies inside this temperature band (°C).
    pub humidity_band_low_c: f32,
    pub humidity_band_high_c: f32,

    // --- Rule 6: setpoint tracking ---
    /// Allowed gap between room and setpoint before the setpoint is nudged.
    pub tracking_tolerance_c: f32,
    /// Tracking never moves the setpoint outside this comfort window.
    pub comfort_setpoint_min_c: u8,
    pub comfort_setpoint_max_c: u8,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            no_presence_shutoff_ms: 10 * 60 * 1000, // 10 min

            extreme_heat_c: 29.0,
            extreme_heat_setpoint_c: 22,
            extreme_heat_fan: FanSpeed::High,

            moderate_heat_c: 26.0,
            moderate_heat_setpoint_c: 25,
            moderate_heat_fan: FanSpeed::Medium,

            overcool_c: 22.0,

            humidity_high_pct: 70.0,
            humidity_band_low_c: 23.0,
            humidity_band_high_c: 27.0,

            tracking_tolerance_c: 2.0,
            comfort_setpoint_min_c: 22,
            comfort_setpoint_max_c: 27,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// DHT22 sampling interval (milliseconds).  The sensor cannot be read
    /// faster than every 2 s.
    pub sensor_read_interval_ms: u32,
    /// Minimum interval between automatic decisions (milliseconds)
    pub evaluation_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
    /// Presses closer together than this are ignored (milliseconds)
    pub button_cooldown_ms: u32,

    // --- Occupancy ---
    pub motion_debounce_ms: u32,
    pub distance_debounce_ms: u32,
    /// An object closer than this counts as presence (cm)
    pub presence_range_cm: f32,
    /// Echoes closer than this are sensor ringing, not a person (cm)
    pub presence_min_cm: f32,

    // --- Control ---
    pub protocol: ProtocolKind,
    pub automation_enabled: bool,
    pub decision_source: DecisionSource,
    /// Upper bound on one advisory round trip (milliseconds)
    pub advisory_timeout_ms: u32,

    pub rules: RuleThresholds,
    pub keymap: Keymap,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            control_loop_interval_ms: 100,  // 10 Hz
            sensor_read_interval_ms: 2000,  // DHT22 minimum
            evaluation_interval_ms: 30_000, // 2/min
            telemetry_interval_secs: 5,
            button_cooldown_ms: 500,

            // Occupancy
            motion_debounce_ms: 5_000,
            distance_debounce_ms: 10_000,
            presence_range_cm: 150.0,
            presence_min_cm: 2.0,

            // Control
            protocol: ProtocolKind::Toggle,
            automation_enabled: true,
            decision_source: DecisionSource::LocalRules,
            advisory_timeout_ms: 15_000,

            rules: RuleThresholds::default(),
            keymap: Keymap::default(),
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document and validate it.  Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the rule table cannot behave sensibly with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.rules;
        let setpoint_ok = |t: u8| (SETPOINT_MIN_C..=SETPOINT_MAX_C).contains(&t);

        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be > 0",
            ));
        }
        if self.telemetry_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_secs must be > 0",
            ));
        }
        if self.advisory_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "advisory_timeout_ms must be > 0",
            ));
        }
        if self.presence_min_cm >= self.presence_range_cm {
            return Err(ConfigError::ValidationFailed(
                "presence_min_cm must be below presence_range_cm",
            ));
        }
        if r.extreme_heat_c <= r.moderate_heat_c {
            return Err(ConfigError::ValidationFailed(
                "extreme_heat_c must be above moderate_heat_c",
            ));
        }
        if r.moderate_heat_c <= r.overcool_c {
            return Err(ConfigError::ValidationFailed(
                "moderate_heat_c must be above overcool_c",
            ));
        }
        if r.humidity_band_low_c > r.humidity_band_high_c {
            return Err(ConfigError::ValidationFailed(
                "humidity band is inverted",
            ));
        }
        if !(0.0..=100.0).contains(&r.humidity_high_pct) {
            return Err(ConfigError::ValidationFailed(
                "humidity_high_pct must be within 0-100",
            ));
        }
        if r.tracking_tolerance_c <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "tracking_tolerance_c must be > 0",
            ));
        }
        if !setpoint_ok(r.extreme_heat_setpoint_c) || !setpoint_ok(r.moderate_heat_setpoint_c) {
            return Err(ConfigError::ValidationFailed(
                "activation setpoints must be within 16-30",
            ));
        }
        if !setpoint_ok(r.comfort_setpoint_min_c)
            || !setpoint_ok(r.comfort_setpoint_max_c)
            || r.comfort_setpoint_min_c > r.comfort_setpoint_max_c
        {
            return Err(ConfigError::ValidationFailed(
                "comfort setpoint window must be ordered and within 16-30",
            ));
        }
        Ok(())
    }
}
