//! Named extension points.
//!
//! Declarations are registered against one of three points. The string IDs
//! are what plugin manifests and log output refer to.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEVICE_DRIVER_POINT: &str = "plotkit.device.driver";
pub const DEVICE_PROTOCOL_POINT: &str = "plotkit.device.protocols";
pub const DEVICE_TRANSPORT_POINT: &str = "plotkit.device.transport";

/// The three device extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionPoint {
    Driver,
    Protocol,
    Transport,
}

impl ExtensionPoint {
    pub const ALL: [ExtensionPoint; 3] = [Self::Driver, Self::Protocol, Self::Transport];

    /// Fully qualified extension point ID
    pub fn id(&self) -> &'static str {
        match self {
            Self::Driver => DEVICE_DRIVER_POINT,
            Self::Protocol => DEVICE_PROTOCOL_POINT,
            Self::Transport => DEVICE_TRANSPORT_POINT,
        }
    }

    /// Looks up a point by its fully qualified ID.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ids_round_trip() {
        for point in ExtensionPoint::ALL {
            assert_eq!(ExtensionPoint::from_id(point.id()), Some(point));
        }
        assert_eq!(ExtensionPoint::from_id("plotkit.device.unknown"), None);
    }

    #[test]
    fn test_point_serde() {
        let json = serde_json::to_string(&ExtensionPoint::Transport).unwrap();
        assert_eq!(json, "\"transport\"");
    }
}
