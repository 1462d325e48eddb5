//! Device cap enforcement
//!
//! A player may keep at most [`DevicePolicy::max_devices`] devices whose last
//! activity falls within [`DevicePolicy::session_ttl`]. Expired sessions are
//! pruned lazily every time the guard runs; there is no background sweep.
//! A device that finds every slot taken is turned away until the password is
//! reset or another device's session expires. Nothing evicts the oldest
//! session on its own.

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::Session;

/// Number of live devices allowed per account
pub const DEFAULT_MAX_DEVICES: usize = 3;

/// Sliding expiry of a device session, in hours
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Device cap configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePolicy {
    pub max_devices: usize,
    pub session_ttl: TimeDelta,
}

impl Default for DevicePolicy {
    fn default() -> Self {
        Self {
            max_devices: DEFAULT_MAX_DEVICES,
            session_ttl: TimeDelta::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

/// Outcome of a login attempt from one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The device already holds a live session; its last activity is refreshed
    Renew,
    /// A free slot was available; a new session was appended
    Admit,
    /// Every slot is taken by other devices; a password reset is required
    Reject,
}

impl Decision {
    pub fn is_admitted(self) -> bool {
        !matches!(self, Decision::Reject)
    }
}

/// Decision plus the session list the caller must persist.
///
/// The list is meant to be written back in every branch, `Reject`
/// included, so that expired sessions are dropped even on a refused login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub decision: Decision,
    pub sessions: Vec<Session>,
    /// How many stored sessions were discarded as expired or duplicated
    pub pruned: usize,
}

/// Decide whether `device_id` may log in at `now` given the stored sessions.
pub fn admit(
    sessions: &[Session],
    device_id: &str,
    now: DateTime<Utc>,
    policy: &DevicePolicy,
) -> Admission {
    let cutoff = now - policy.session_ttl;

    let mut live: Vec<Session> = Vec::with_capacity(sessions.len() + 1);
    for session in sessions {
        // Strictly after the cutoff; a session exactly one TTL old is gone.
        if session.last_activity <= cutoff {
            continue;
        }
        if live.iter().any(|s| s.device_id == session.device_id) {
            continue;
        }
        live.push(session.clone());
    }
    let pruned = sessions.len() - live.len();

    let decision = if let Some(existing) = live.iter_mut().find(|s| s.device_id == device_id) {
        existing.last_activity = now;
        Decision::Renew
    } else if live.len() < policy.max_devices {
        live.push(Session::new(device_id, now));
        Decision::Admit
    } else {
        Decision::Reject
    };

    Admission {
        decision,
        sessions: live,
        pruned,
    }
}

/// Session list installed by a password reset: the resetting device only.
pub fn reset_sessions(device_id: &str, now: DateTime<Utc>) -> Vec<Session> {
    vec![Session::new(device_id, now)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn session(device: &str, hours_ago: i64) -> Session {
        let at = now() - TimeDelta::hours(hours_ago);
        Session::new(device, at)
    }

    fn devices(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|s| s.device_id.as_str()).collect()
    }

    #[test]
    fn test_first_device_is_admitted() {
        let admission = admit(&[], "A", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Admit);
        assert_eq!(admission.sessions, vec![Session::new("A", now())]);
        assert_eq!(admission.pruned, 0);
    }

    #[test]
    fn test_new_device_appended_while_slots_remain() {
        let stored = vec![session("A", 3), session("B", 1)];

        let admission = admit(&stored, "C", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Admit);
        assert_eq!(devices(&admission.sessions), vec!["A", "B", "C"]);
        assert_eq!(admission.sessions[..2], stored[..]);
    }

    #[test]
    fn test_known_device_only_refreshes_last_activity() {
        let stored = vec![session("A", 5), session("B", 2), session("C", 1)];

        let admission = admit(&stored, "B", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Renew);
        assert_eq!(devices(&admission.sessions), vec!["A", "B", "C"]);
        assert_eq!(admission.sessions[0], stored[0]);
        assert_eq!(admission.sessions[2], stored[2]);
        assert_eq!(admission.sessions[1].login_time, stored[1].login_time);
        assert_eq!(admission.sessions[1].last_activity, now());
    }

    #[test]
    fn test_fourth_device_rejected_without_touching_membership() {
        let stored = vec![session("A", 1), session("B", 1), session("C", 1)];

        let admission = admit(&stored, "D", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Reject);
        assert!(!admission.decision.is_admitted());
        assert_eq!(admission.sessions, stored);
    }

    #[test]
    fn test_expired_sessions_do_not_count_toward_cap() {
        let stored = vec![session("A", 30), session("B", 1), session("C", 1)];

        let admission = admit(&stored, "D", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Admit);
        assert_eq!(devices(&admission.sessions), vec!["B", "C", "D"]);
        assert_eq!(admission.pruned, 1);
    }

    #[test]
    fn test_expired_sessions_pruned_even_on_reject() {
        let stored = vec![
            session("A", 48),
            session("B", 1),
            session("C", 2),
            session("E", 3),
        ];

        let admission = admit(&stored, "D", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Reject);
        assert_eq!(devices(&admission.sessions), vec!["B", "C", "E"]);
        assert_eq!(admission.pruned, 1);
    }

    #[test]
    fn test_device_returning_after_expiry_is_treated_as_new() {
        let mut stale = session("A", 24);
        stale.last_activity -= TimeDelta::milliseconds(1);
        let stored = vec![stale.clone(), session("B", 1), session("C", 1)];

        let admission = admit(&stored, "A", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Admit);
        let renewed = admission.sessions.last().unwrap();
        assert_eq!(renewed.device_id, "A");
        assert_eq!(renewed.login_time, now());
        assert_ne!(renewed.login_time, stale.login_time);
    }

    #[test]
    fn test_session_exactly_at_cutoff_is_expired() {
        let stored = vec![session("A", 24)];

        let admission = admit(&stored, "B", now(), &DevicePolicy::default());

        assert_eq!(devices(&admission.sessions), vec!["B"]);
        assert_eq!(admission.pruned, 1);
    }

    #[test]
    fn test_duplicate_device_entries_are_collapsed() {
        let stored = vec![session("A", 2), session("A", 1), session("B", 1)];

        let admission = admit(&stored, "A", now(), &DevicePolicy::default());

        assert_eq!(admission.decision, Decision::Renew);
        assert_eq!(devices(&admission.sessions), vec!["A", "B"]);
        assert_eq!(admission.pruned, 1);
    }

    #[test]
    fn test_custom_policy_limits() {
        let policy = DevicePolicy {
            max_devices: 1,
            session_ttl: TimeDelta::hours(1),
        };
        let stored = vec![session("A", 2)];

        let admitted = admit(&stored, "B", now(), &policy);
        assert_eq!(admitted.decision, Decision::Admit);

        let rejected = admit(&admitted.sessions, "C", now(), &policy);
        assert_eq!(rejected.decision, Decision::Reject);
    }

    #[test]
    fn test_reset_leaves_only_resetting_device() {
        let sessions = reset_sessions("D", now());

        assert_eq!(sessions, vec![Session::new("D", now())]);
    }
}
