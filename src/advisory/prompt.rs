//! Request body construction and response extraction for the inference
//! proxy.
//!
//! The proxy accepts `{"query": "<text>"}` and replies with whatever text the
//! model produced.  The reply is expected to contain one JSON action object,
//! possibly wrapped in prose or a code fence; the outermost `{ … }` span is
//! taken and parsed as an [`ActionRequest`].

use core::fmt::Write as _;

use serde::Serialize;

use crate::error::AdvisoryError;
use crate::model::{ActionRequest, DeviceState, SensorSnapshot};

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// Describe the room and the unit in one paragraph, followed by the
/// optional user request.
pub fn describe(snapshot: &SensorSnapshot, device: &DeviceState, user_query: Option<&str>) -> String {
    let mut q = String::with_capacity(256);
    if snapshot.climate_valid {
        let _ = write!(
            q,
            "Room: {:.1}C, humidity {:.0}%",
            snapshot.temperature_c, snapshot.humidity_pct
        );
    } else {
        q.push_str("Room: temperature unknown");
    }
    let _ = write!(
        q,
        ", light {}/4095, {}",
        snapshot.light_level,
        if snapshot.occupied { "occupied" } else { "empty" }
    );
    if let Some(d) = snapshot.occupancy_distance_cm {
        let _ = write!(q, " (nearest object {:.0} cm)", d);
    }
    let _ = write!(q, ". AC: {}.", device);
    if let Some(user) = user_query.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = write!(q, " User request: {}", user);
    }
    q
}

/// JSON body for one advisory request.
pub fn request_body(
    snapshot: &SensorSnapshot,
    device: &DeviceState,
    user_query: Option<&str>,
) -> Result<String, AdvisoryError> {
    let query = describe(snapshot, device, user_query);
    serde_json::to_string(&QueryBody { query: &query }).map_err(|_| AdvisoryError::Malformed)
}

/// Pull the action object out of a model reply.
pub fn parse_response(text: &str) -> Result<ActionRequest, AdvisoryError> {
    let start = text.find('{').ok_or(AdvisoryError::Malformed)?;
    let end = text.rfind('}').ok_or(AdvisoryError::Malformed)?;
    if end < start {
        return Err(AdvisoryError::Malformed);
    }
    let value: serde_json::Value =
        serde_json::from_str(&text[start..=end]).map_err(|_| AdvisoryError::Malformed)?;
    let fields = value.as_object().ok_or(AdvisoryError::Malformed)?;
    // The proxy reports its own failures as {"error": ..} or {"raw_text": ..}.
    if !fields.contains_key("action") && (fields.contains_key("error") || fields.contains_key("raw_text")) {
        return Err(AdvisoryError::Malformed);
    }
    serde_json::from_value(value).map_err(|_| AdvisoryError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FanField;

    #[test]
    fn body_is_a_query_object() {
        let snap = SensorSnapshot {
            temperature_c: 28.5,
            humidity_pct: 64.0,
            climate_valid: true,
            occupied: true,
            ..SensorSnapshot::default()
        };
        let body = request_body(&snap, &DeviceState::default(), Some("too hot")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        let q = v["query"].as_str().unwrap();
        assert!(q.contains("28.5C"));
        assert!(q.contains("occupied"));
        assert!(q.ends_with("User request: too hot"));
    }

    #[test]
    fn extracts_object_from_fenced_reply() {
        let reply = "Sure!\n```json\n{\"action\":\"turn_on\",\"temperature\":24,\"fan_speed\":2,\"mode\":\"COOL\",\"reason\":\"warm\"}\n```";
        let req = parse_response(reply).unwrap();
        assert_eq!(req.action, "turn_on");
        assert_eq!(req.temperature, Some(24.0));
        assert_eq!(req.fan_speed, Some(FanField::Level(2.0)));
    }

    #[test]
    fn mistyped_fields_do_not_lose_the_action() {
        let req = parse_response(r#"{"action":"turn_off","temperature":"24"}"#).unwrap();
        assert_eq!(req.action, "turn_off");
        assert_eq!(req.temperature, Some(24.0));

        let req = parse_response(r#"{"action":"turn_off","reason":{"why":"empty"}}"#).unwrap();
        assert_eq!(req.action, "turn_off");
        assert_eq!(req.reason, None);
    }

    #[test]
    fn object_without_tag_is_maintain_not_malformed() {
        let req = parse_response(r#"{"temperature":24}"#).unwrap();
        assert_eq!(req.action, "");
        assert_eq!(
            req.resolve(&DeviceState::default(), &crate::model::Capabilities::GENERIC),
            crate::model::Action::Maintain
        );
    }

    #[test]
    fn proxy_error_objects_are_malformed() {
        assert_eq!(
            parse_response(r#"{"error":"Timeout"}"#),
            Err(AdvisoryError::Malformed)
        );
        assert_eq!(
            parse_response(r#"{"raw_text":"I cannot help"}"#),
            Err(AdvisoryError::Malformed)
        );
        assert_eq!(parse_response("no json here"), Err(AdvisoryError::Malformed));
        assert_eq!(parse_response("} backwards {"), Err(AdvisoryError::Malformed));
    }
}
