//! Device session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device bound to a player account.
///
/// Sessions only feed the device cap; they are not request credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque identifier generated by the browser and kept in local storage
    pub device_id: String,
    /// First login of this device, never refreshed
    pub login_time: DateTime<Utc>,
    /// Last successful login from this device
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session for a device logging in at `now`
    pub fn new(device_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            login_time: now,
            last_activity: now,
        }
    }
}
