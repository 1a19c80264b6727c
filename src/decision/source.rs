//! Which component proposes automatic actions.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Selectable at runtime.  Both sources feed the same dispatch path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// The on-device rule table.
    #[default]
    LocalRules,
    /// The remote inference service, reached through the advisory channel.
    RemoteAdvisory,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalRules => f.write_str("local_rules"),
            Self::RemoteAdvisory => f.write_str("remote_advisory"),
        }
    }
}
