//! Player model and its public projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Session;

/// Player entity as stored in the account store.
///
/// Deliberately not `Serialize`: handlers must go through [`PlayerProfile`]
/// or [`PlayerSummary`] so the password hash never reaches a response.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub gmail: String,
    pub wins: u32,
    pub losses: u32,
    /// Insertion order is login order
    pub active_sessions: Vec<Session>,
    /// Bumped on every write; session updates compare-and-swap on it
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// New player creation payload
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub username: String,
    pub password_hash: String,
    pub gmail: String,
    pub wins: u32,
    pub losses: u32,
}

/// Minimal player view returned by login and password reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub username: String,
    pub wins: u32,
    pub losses: u32,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            username: player.username.clone(),
            wins: player.wins,
            losses: player.losses,
        }
    }
}

/// Every player field except the credentials and the storage version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub username: String,
    pub gmail: String,
    pub wins: u32,
    pub losses: u32,
    pub active_sessions: Vec<Session>,
    pub created_at: DateTime<Utc>,
}

impl From<Player> for PlayerProfile {
    fn from(player: Player) -> Self {
        Self {
            username: player.username,
            gmail: player.gmail,
            wins: player.wins,
            losses: player.losses,
            active_sessions: player.active_sessions,
            created_at: player.created_at,
        }
    }
}

/// Ranking order used by the leaderboard: wins descending, then newest first
pub fn ranking_order(a: &Player, b: &Player) -> std::cmp::Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| b.created_at.cmp(&a.created_at))
}
