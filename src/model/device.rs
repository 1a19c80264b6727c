//! Commanded AC configuration and protocol capability sets.
//!
//! [`DeviceState`] is what the firmware *believes* the AC is doing: there is
//! no feedback channel from an IR-controlled unit, so this is the last
//! configuration we commanded.  [`Capabilities`] describes what a given IR
//! protocol can express; every state is normalised against it before it is
//! encoded.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lowest setpoint any supported unit accepts (°C).
pub const SETPOINT_MIN_C: u8 = 16;
/// Highest setpoint any supported unit accepts (°C).
pub const SETPOINT_MAX_C: u8 = 30;

/// Clamp an arbitrary integer temperature into `[16, 30]`.
pub fn clamp_setpoint(value: i64) -> u8 {
    value.clamp(SETPOINT_MIN_C as i64, SETPOINT_MAX_C as i64) as u8
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AcMode {
    Cool,
    Dry,
    Fan,
    Heat,
    Auto,
}

impl AcMode {
    /// Case-insensitive parse of the wire names (`"COOL"`, `"dry"`, ...).
    /// A few vendor aliases are accepted.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        [
            ("cool", Self::Cool),
            ("dry", Self::Dry),
            ("dehumidify", Self::Dry),
            ("fan", Self::Fan),
            ("fan_only", Self::Fan),
            ("heat", Self::Heat),
            ("auto", Self::Auto),
        ]
        .into_iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, mode)| mode)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cool => "COOL",
            Self::Dry => "DRY",
            Self::Fan => "FAN",
            Self::Heat => "HEAT",
            Self::Auto => "AUTO",
        }
    }

    /// 3-bit code used in the stateful frame.
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Cool => 0b001,
            Self::Dry => 0b010,
            Self::Fan => 0b011,
            Self::Heat => 0b100,
            Self::Auto => 0b000,
        }
    }
}

impl fmt::Display for AcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Fan speed
// ---------------------------------------------------------------------------

/// Fan speed on the canonical 5-level named scale.  Protocols that only
/// support three speeds expose the Low/Medium/High subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum FanSpeed {
    Quiet = 1,
    Low = 2,
    Medium = 3,
    High = 4,
    Turbo = 5,
}

impl FanSpeed {
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        [
            ("quiet", Self::Quiet),
            ("silent", Self::Quiet),
            ("low", Self::Low),
            ("medium", Self::Medium),
            ("mid", Self::Medium),
            ("high", Self::High),
            ("turbo", Self::Turbo),
            ("max", Self::Turbo),
        ]
        .into_iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, fan)| fan)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiet => "QUIET",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Turbo => "TURBO",
        }
    }

    /// Position on the canonical scale (1 = Quiet … 5 = Turbo).
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Device state
// ---------------------------------------------------------------------------

/// The AC's current commanded configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub power: bool,
    /// Target temperature, always within `[16, 30]`.
    pub setpoint_c: u8,
    pub mode: AcMode,
    pub fan: FanSpeed,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            power: false,
            setpoint_c: 25,
            mode: AcMode::Cool,
            fan: FanSpeed::Medium,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}C {} fan {}",
            if self.power { "ON" } else { "OFF" },
            self.setpoint_c,
            self.mode,
            self.fan
        )
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// What an IR protocol can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Legal fan speeds in ascending order.  Never empty.
    pub fan_levels: &'static [FanSpeed],
    /// Legal modes, in preferred fallback order.  Never empty.
    pub modes: &'static [AcMode],
    /// Highest fan speed allowed while in Dry mode, if limited.
    pub dry_fan_limit: Option<FanSpeed>,
}

impl Capabilities {
    /// Three-speed unit accepting every mode.
    pub const GENERIC: Self = Self {
        fan_levels: &[FanSpeed::Low, FanSpeed::Medium, FanSpeed::High],
        modes: &[AcMode::Cool, AcMode::Dry, AcMode::Fan, AcMode::Heat, AcMode::Auto],
        dry_fan_limit: None,
    };

    /// Five-speed unit without an Auto mode; Dry runs the fan at Low at most.
    pub const FULL_STATE: Self = Self {
        fan_levels: &[
            FanSpeed::Quiet,
            FanSpeed::Low,
            FanSpeed::Medium,
            FanSpeed::High,
            FanSpeed::Turbo,
        ],
        modes: &[AcMode::Cool, AcMode::Dry, AcMode::Fan, AcMode::Heat],
        dry_fan_limit: Some(FanSpeed::Low),
    };

    /// Nearest legal fan speed by rank.  Ties resolve to the slower speed.
    pub fn legal_fan(&self, fan: FanSpeed) -> FanSpeed {
        let mut best = self.fan_levels[0];
        for &level in self.fan_levels {
            let d_best = best.rank().abs_diff(fan.rank());
            let d_level = level.rank().abs_diff(fan.rank());
            if d_level < d_best {
                best = level;
            }
        }
        best
    }

    /// The mode itself if legal, else the first legal mode (the preferred
    /// fallback, Cool on every supported unit).
    pub fn legal_mode(&self, mode: AcMode) -> AcMode {
        if self.modes.contains(&mode) {
            mode
        } else {
            self.modes[0]
        }
    }

    /// Resolve a 1-based fan ordinal from the action schema, clamping it to
    /// the number of legal speeds.
    pub fn fan_from_ordinal(&self, ordinal: i64) -> FanSpeed {
        let max = self.fan_levels.len() as i64;
        let idx = ordinal.clamp(1, max) - 1;
        self.fan_levels[idx as usize]
    }

    /// Next legal fan speed, wrapping from the fastest to the slowest.
    pub fn next_fan(&self, fan: FanSpeed) -> FanSpeed {
        let current = self.legal_fan(fan);
        let pos = self
            .fan_levels
            .iter()
            .position(|&f| f == current)
            .unwrap_or(0);
        self.fan_levels[(pos + 1) % self.fan_levels.len()]
    }

    /// One step faster, saturating at the fastest legal speed.
    pub fn fan_step_up(&self, fan: FanSpeed) -> FanSpeed {
        let current = self.legal_fan(fan);
        self.fan_levels
            .iter()
            .copied()
            .find(|&f| f > current)
            .unwrap_or(current)
    }

    /// One step slower, saturating at the slowest legal speed.
    pub fn fan_step_down(&self, fan: FanSpeed) -> FanSpeed {
        let current = self.legal_fan(fan);
        self.fan_levels
            .iter()
            .rev()
            .copied()
            .find(|&f| f < current)
            .unwrap_or(current)
    }

    /// Next legal mode in the protocol's cycle order, wrapping.
    pub fn next_mode(&self, mode: AcMode) -> AcMode {
        let current = self.legal_mode(mode);
        let pos = self.modes.iter().position(|&m| m == current).unwrap_or(0);
        self.modes[(pos + 1) % self.modes.len()]
    }

    /// Map every field of `state` into the legal range/set.
    pub fn normalize(&self, state: DeviceState) -> DeviceState {
        let mode = self.legal_mode(state.mode);
        let mut fan = self.legal_fan(state.fan);
        if mode == AcMode::Dry {
            if let Some(limit) = self.dry_fan_limit {
                fan = self.legal_fan(fan.min(limit));
            }
        }
        DeviceState {
            power: state.power,
            setpoint_c: clamp_setpoint(state.setpoint_c as i64),
            mode,
            fan,
        }
    }
}
