//! The rule table.
//!
//! Seven rules as plain `fn` pointers in a fixed array, consulted strictly
//! in index order.  The first rule that returns `Some(action)` wins; later
//! rules are never consulted.
//!
//! ```text
//!  #  rule                 fires when                                     action
//!  ─  ───────────────────  ─────────────────────────────────────────────  ─────────────────────
//!  1  NoPresenceShutoff    on, room empty ≥ no_presence_shutoff_ms         TurnOff
//!  2  ExtremeHeat          off, occupied, T ≥ extreme_heat_c               TurnOn (22 °C, High)
//!  3  ModerateHeat         off, occupied, T > moderate_heat_c              TurnOn (25 °C, Medium)
//!  4  Overcool             on, T ≤ overcool_c                              TurnOff
//!  5  HumidityCorrection   on, RH > humidity_high_pct, T in band, not Dry  Adjust(mode = Dry)
//!  6  SetpointTracking     on, occupied, |T − setpoint| > tolerance        Adjust(setpoint, fan)
//!  7  Fallback             always                                          Maintain
//! ```
//!
//! Rules 2–6 read the climate pair and stay silent until it has been read
//! at least once.

use core::fmt;

use serde::Serialize;

use crate::config::RuleThresholds;
use crate::model::{AcMode, Action, Adjustment, Capabilities, DeviceState, SensorSnapshot};

// ---------------------------------------------------------------------------
// Rule identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RuleId {
    NoPresenceShutoff = 0,
    ExtremeHeat = 1,
    ModerateHeat = 2,
    Overcool = 3,
    HumidityCorrection = 4,
    SetpointTracking = 5,
    Fallback = 6,
}

impl RuleId {
    pub const COUNT: usize = 7;
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(RULES[*self as usize].name)
    }
}

/// Everything one rule may look at.  Borrowed for a single evaluation.
pub struct RuleContext<'a> {
    pub snapshot: &'a SensorSnapshot,
    pub device: &'a DeviceState,
    pub now_ms: u64,
    pub thresholds: &'a RuleThresholds,
    pub caps: &'a Capabilities,
}

pub type RuleCheckFn = fn(&RuleContext<'_>) -> Option<Action>;

/// Static descriptor for a single rule.
pub struct Rule {
    pub id: RuleId,
    pub name: &'static str,
    pub check: RuleCheckFn,
}

/// Indexed by `RuleId as usize`; index order is priority order.
pub static RULES: [Rule; RuleId::COUNT] = [
    Rule {
        id: RuleId::NoPresenceShutoff,
        name: "no_presence_shutoff",
        check: no_presence_shutoff,
    },
    Rule {
        id: RuleId::ExtremeHeat,
        name: "extreme_heat",
        check: extreme_heat,
    },
    Rule {
        id: RuleId::ModerateHeat,
        name: "moderate_heat",
        check: moderate_heat,
    },
    Rule {
        id: RuleId::Overcool,
        name: "overcool",
        check: overcool,
    },
    Rule {
        id: RuleId::HumidityCorrection,
        name: "humidity_correction",
        check: humidity_correction,
    },
    Rule {
        id: RuleId::SetpointTracking,
        name: "setpoint_tracking",
        check: setpoint_tracking,
    },
    Rule {
        id: RuleId::Fallback,
        name: "fallback",
        check: fallback,
    },
];

// ═══════════════════════════════════════════════════════════════════════════
//  Rule bodies
// ═══════════════════════════════════════════════════════════════════════════

fn no_presence_shutoff(ctx: &RuleContext<'_>) -> Option<Action> {
    let empty_for = ctx.snapshot.unoccupied_for_ms(ctx.now_ms);
    (ctx.device.power && empty_for >= ctx.thresholds.no_presence_shutoff_ms)
        .then_some(Action::TurnOff)
}

fn extreme_heat(ctx: &RuleContext<'_>) -> Option<Action> {
    let s = ctx.snapshot;
    let t = ctx.thresholds;
    (s.climate_valid && s.occupied && !ctx.device.power && s.temperature_c >= t.extreme_heat_c)
        .then_some(Action::TurnOn {
            setpoint_c: t.extreme_heat_setpoint_c,
            fan: ctx.caps.legal_fan(t.extreme_heat_fan),
            mode: ctx.caps.legal_mode(AcMode::Cool),
        })
}

fn moderate_heat(ctx: &RuleContext<'_>) -> Option<Action> {
    let s = ctx.snapshot;
    let t = ctx.thresholds;
    (s.climate_valid && s.occupied && !ctx.device.power && s.temperature_c > t.moderate_heat_c)
        .then_some(Action::TurnOn {
            setpoint_c: t.moderate_heat_setpoint_c,
            fan: ctx.caps.legal_fan(t.moderate_heat_fan),
            mode: ctx.caps.legal_mode(AcMode::Cool),
        })
}

fn overcool(ctx: &RuleContext<'_>) -> Option<Action> {
    let s = ctx.snapshot;
    (s.climate_valid && ctx.device.power && s.temperature_c <= ctx.thresholds.overcool_c)
        .then_some(Action::TurnOff)
}

fn humidity_correction(ctx: &RuleContext<'_>) -> Option<Action> {
    let s = ctx.snapshot;
    let t = ctx.thresholds;
    let in_band = (t.humidity_band_low_c..=t.humidity_band_high_c).contains(&s.temperature_c);
    let dry = ctx.caps.legal_mode(AcMode::Dry);
    (s.climate_valid
        && ctx.device.power
        && ctx.device.mode != dry
        && s.humidity_pct > t.humidity_high_pct
        && in_band)
        .then_some(Action::Adjust(Adjustment {
            mode: Some(dry),
            ..Adjustment::default()
        }))
}

/// Step the setpoint one degree in the direction of the gap and the fan one
/// step the same way.  The setpoint only steps while it stays inside the
/// comfort window; a setpoint already outside it is left alone so the two
/// changes never pull against each other.  Silent when neither would change.
fn setpoint_tracking(ctx: &RuleContext<'_>) -> Option<Action> {
    let s = ctx.snapshot;
    let d = ctx.device;
    let t = ctx.thresholds;
    if !(s.climate_valid && d.power && s.occupied) {
        return None;
    }
    if !matches!(d.mode, AcMode::Cool | AcMode::Auto) {
        return None;
    }

    let gap = s.temperature_c - f32::from(d.setpoint_c);
    let sp = d.setpoint_c;
    let (setpoint_c, fan) = if gap > t.tracking_tolerance_c {
        let colder = if sp > t.comfort_setpoint_min_c { sp - 1 } else { sp };
        (colder, ctx.caps.fan_step_up(d.fan))
    } else if gap < -t.tracking_tolerance_c {
        let warmer = if sp < t.comfort_setpoint_max_c { sp + 1 } else { sp };
        (warmer, ctx.caps.fan_step_down(d.fan))
    } else {
        return None;
    };

    let adj = Adjustment {
        setpoint_c: (setpoint_c != d.setpoint_c).then_some(setpoint_c),
        fan: (fan != d.fan).then_some(fan),
        mode: None,
    };
    (!adj.is_empty()).then_some(Action::Adjust(adj))
}

fn fallback(_ctx: &RuleContext<'_>) -> Option<Action> {
    Some(Action::Maintain)
}
