//! The action vocabulary shared by the rule engine, the advisory channel,
//! the IR keymap and external command handlers, plus the JSON schema
//! boundary that external collaborators speak.
//!
//! ```text
//!   {"action":"adjust","temperature":99,"fan_speed":"high","mode":"dry"}
//!        │
//!        ▼  ActionRequest::resolve(current, caps)      (clamp + fall back)
//!   Action::Adjust { setpoint: Some(30), fan: Some(High), mode: Some(Dry) }
//! ```
//!
//! Everything is validated and clamped here, once.  Business logic past this
//! point only ever sees in-range values.

use core::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::device::{AcMode, Capabilities, DeviceState, FanSpeed, clamp_setpoint};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Partial change to the device configuration.  `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjustment {
    pub setpoint_c: Option<u8>,
    pub fan: Option<FanSpeed>,
    pub mode: Option<AcMode>,
}

impl Adjustment {
    pub fn is_empty(&self) -> bool {
        self.setpoint_c.is_none() && self.fan.is_none() && self.mode.is_none()
    }
}

/// Exactly one of these is produced per decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Maintain,
    TurnOn {
        setpoint_c: u8,
        fan: FanSpeed,
        mode: AcMode,
    },
    TurnOff,
    Adjust(Adjustment),
}

impl Action {
    /// Wire tag as used in the action schema.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Maintain => "maintain",
            Self::TurnOn { .. } => "turn_on",
            Self::TurnOff => "turn_off",
            Self::Adjust(_) => "adjust",
        }
    }

    pub fn is_maintain(&self) -> bool {
        matches!(self, Self::Maintain)
    }

    /// The state that results from applying this action to `current`.
    /// Setpoints are clamped; mode/fan legality is the dispatcher's job.
    pub fn apply(&self, current: &DeviceState) -> DeviceState {
        match *self {
            Self::Maintain => *current,
            Self::TurnOn {
                setpoint_c,
                fan,
                mode,
            } => DeviceState {
                power: true,
                setpoint_c: clamp_setpoint(setpoint_c as i64),
                mode,
                fan,
            },
            Self::TurnOff => DeviceState {
                power: false,
                ..*current
            },
            Self::Adjust(adj) => DeviceState {
                power: current.power,
                setpoint_c: adj
                    .setpoint_c
                    .map_or(current.setpoint_c, |t| clamp_setpoint(t as i64)),
                mode: adj.mode.unwrap_or(current.mode),
                fan: adj.fan.unwrap_or(current.fan),
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maintain | Self::TurnOff => f.write_str(self.tag()),
            Self::TurnOn {
                setpoint_c,
                fan,
                mode,
            } => write!(f, "turn_on {}C {} fan {}", setpoint_c, mode, fan),
            Self::Adjust(adj) => {
                f.write_str("adjust")?;
                if let Some(t) = adj.setpoint_c {
                    write!(f, " setpoint={t}C")?;
                }
                if let Some(m) = adj.mode {
                    write!(f, " mode={m}")?;
                }
                if let Some(fan) = adj.fan {
                    write!(f, " fan={fan}")?;
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Schema boundary
// ---------------------------------------------------------------------------

/// `fan_speed` may be a number (1-based ordinal) or a named level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FanField {
    Level(f64),
    Named(String),
}

impl FanField {
    fn resolve(&self, caps: &Capabilities) -> Option<FanSpeed> {
        match self {
            Self::Level(n) if n.is_finite() => Some(caps.fan_from_ordinal(n.round() as i64)),
            Self::Level(_) => None,
            Self::Named(name) => match name.trim().parse::<i64>() {
                Ok(n) => Some(caps.fan_from_ordinal(n)),
                Err(_) => FanSpeed::parse(name).map(|f| caps.legal_fan(f)),
            },
        }
    }
}

/// Structured action record exchanged with HTTP handlers and the advisory
/// service.
///
/// ```json
/// { "action": "turn_on", "temperature": 24, "fan_speed": 2, "mode": "COOL",
///   "reason": "room is warm and occupied" }
/// ```
///
/// Decoding never fails on a field: a missing `action` or one of the wrong
/// type reads as an empty tag (Maintain), and an optional field of the wrong
/// type reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default, deserialize_with = "lenient_tag")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<FanField>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Diagnostic only.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn lenient_tag<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(tag) => tag,
        _ => String::new(),
    })
}

/// Numbers, and strings holding a number (`"24"`, `" 23.5 "`).
fn lenient_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(de)?).ok())
}

impl ActionRequest {
    /// Convenience constructor for a bare tag.
    pub fn new(action: &str) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    /// Turn the loosely-typed record into an [`Action`].
    ///
    /// Missing, unparseable or unknown optional fields fall back to the
    /// current device value (never to zero).  Temperatures clamp to
    /// `[16, 30]`; fan ordinals clamp to the protocol's range.  An
    /// unrecognised `action` tag is treated as `maintain`.
    pub fn resolve(&self, current: &DeviceState, caps: &Capabilities) -> Action {
        let setpoint_c = self
            .temperature
            .filter(|t| t.is_finite())
            .map(|t| clamp_setpoint(t.round() as i64));
        let fan = self.fan_speed.as_ref().and_then(|f| f.resolve(caps));
        let mode = self
            .mode
            .as_deref()
            .and_then(AcMode::parse)
            .map(|m| caps.legal_mode(m));

        match self.action.trim().to_ascii_lowercase().as_str() {
            "turn_on" => Action::TurnOn {
                setpoint_c: setpoint_c.unwrap_or(current.setpoint_c),
                fan: fan.unwrap_or(current.fan),
                mode: mode.unwrap_or(current.mode),
            },
            "turn_off" => Action::TurnOff,
            "adjust" => Action::Adjust(Adjustment {
                setpoint_c,
                fan,
                mode,
            }),
            _ => Action::Maintain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> DeviceState {
        DeviceState {
            power: true,
            setpoint_c: 24,
            mode: AcMode::Cool,
            fan: FanSpeed::Medium,
        }
    }

    fn parse(json: &str) -> ActionRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn adjust_temperature_99_clamps_to_30() {
        let req = parse(r#"{"action":"adjust","temperature":99}"#);
        let action = req.resolve(&current(), &Capabilities::GENERIC);
        assert_eq!(
            action,
            Action::Adjust(Adjustment {
                setpoint_c: Some(30),
                ..Default::default()
            })
        );
        assert_eq!(action.apply(&current()).setpoint_c, 30);
    }

    #[test]
    fn turn_on_missing_fields_fall_back_to_current_state() {
        let req = parse(r#"{"action":"turn_on","mode":"PLASMA"}"#);
        let action = req.resolve(&current(), &Capabilities::GENERIC);
        assert_eq!(
            action,
            Action::TurnOn {
                setpoint_c: 24,
                fan: FanSpeed::Medium,
                mode: AcMode::Cool,
            }
        );
    }

    #[test]
    fn unknown_tag_is_maintain() {
        for tag in ["", "explode", "TURN ON"] {
            let req = ActionRequest::new(tag);
            assert_eq!(
                req.resolve(&current(), &Capabilities::GENERIC),
                Action::Maintain
            );
        }
    }

    #[test]
    fn fan_accepts_ordinal_and_names() {
        let caps = Capabilities::GENERIC;
        let by_number = parse(r#"{"action":"adjust","fan_speed":7}"#);
        let by_name = parse(r#"{"action":"adjust","fan_speed":"turbo"}"#);
        let by_string_number = parse(r#"{"action":"adjust","fan_speed":"1"}"#);
        let fan_of = |r: &ActionRequest| match r.resolve(&current(), &caps) {
            Action::Adjust(a) => a.fan,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(fan_of(&by_number), Some(FanSpeed::High));
        assert_eq!(fan_of(&by_name), Some(FanSpeed::High));
        assert_eq!(fan_of(&by_string_number), Some(FanSpeed::Low));
    }

    #[test]
    fn tag_is_case_insensitive_and_reason_is_ignored() {
        let req = parse(r#"{"action":"TURN_OFF","reason":"room empty","extra":1}"#);
        assert_eq!(
            req.resolve(&current(), &Capabilities::GENERIC),
            Action::TurnOff
        );
    }

    #[test]
    fn mistyped_optional_fields_read_as_absent() {
        let req = parse(r#"{"action":"turn_off","temperature":[24],"mode":3,"reason":{"why":"empty"},"fan_speed":true}"#);
        assert_eq!(req.temperature, None);
        assert_eq!(req.mode, None);
        assert_eq!(req.reason, None);
        assert_eq!(req.fan_speed, None);
        assert_eq!(
            req.resolve(&current(), &Capabilities::GENERIC),
            Action::TurnOff
        );
    }

    #[test]
    fn temperature_accepts_numeric_string() {
        let req = parse(r#"{"action":"turn_on","temperature":" 21 "}"#);
        let Action::TurnOn { setpoint_c, .. } = req.resolve(&current(), &Capabilities::GENERIC) else {
            panic!("expected turn_on");
        };
        assert_eq!(setpoint_c, 21);

        let garbage = parse(r#"{"action":"adjust","temperature":"warm"}"#);
        assert_eq!(garbage.temperature, None);
    }

    #[test]
    fn missing_or_mistyped_tag_is_maintain() {
        for json in [r#"{"temperature":24}"#, r#"{"action":7,"temperature":24}"#, r#"{"action":null}"#] {
            assert_eq!(
                parse(json).resolve(&current(), &Capabilities::GENERIC),
                Action::Maintain,
                "{json}"
            );
        }
    }

    #[test]
    fn turn_off_keeps_logical_fields() {
        let next = Action::TurnOff.apply(&current());
        assert!(!next.power);
        assert_eq!(next.setpoint_c, 24);
        assert_eq!(next.fan, FanSpeed::Medium);
    }

    #[test]
    fn maintain_is_identity() {
        assert_eq!(Action::Maintain.apply(&current()), current());
    }
}
