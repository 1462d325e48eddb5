//! In-process player store
//!
//! Used by the test suite and by `ACCOUNTS_STORE=memory` for local play.
//! Everything is lost when the process exits.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlayerStore, StoreError, StoreResult};
use crate::models::{NewPlayer, Player, Session, ranking_order};

#[derive(Clone, Default)]
pub struct MemoryPlayerStore {
    players: Arc<RwLock<HashMap<Uuid, Player>>>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryPlayerStore {
    async fn insert(&self, new_player: NewPlayer) -> StoreResult<Player> {
        let mut players = self.players.write().await;

        if players.values().any(|p| p.username == new_player.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if players.values().any(|p| p.gmail == new_player.gmail) {
            return Err(StoreError::Duplicate("gmail"));
        }

        let player = Player {
            id: Uuid::new_v4(),
            username: new_player.username,
            password_hash: new_player.password_hash,
            gmail: new_player.gmail,
            wins: new_player.wins,
            losses: new_player.losses,
            active_sessions: Vec::new(),
            version: 0,
            created_at: Utc::now(),
        };
        players.insert(player.id, player.clone());

        Ok(player)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Player>> {
        let players = self.players.read().await;
        Ok(players.values().find(|p| p.username == username).cloned())
    }

    async fn find_by_gmail(&self, gmail: &str) -> StoreResult<Option<Player>> {
        let players = self.players.read().await;
        Ok(players.values().find(|p| p.gmail == gmail).cloned())
    }

    async fn list_ranked(&self) -> StoreResult<Vec<Player>> {
        let players = self.players.read().await;
        let mut ranked: Vec<Player> = players.values().cloned().collect();
        ranked.sort_by(ranking_order);
        Ok(ranked)
    }

    async fn replace_sessions(
        &self,
        id: Uuid,
        expected_version: i64,
        sessions: &[Session],
    ) -> StoreResult<bool> {
        let mut players = self.players.write().await;

        match players.get_mut(&id) {
            Some(player) if player.version == expected_version => {
                player.active_sessions = sessions.to_vec();
                player.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        sessions: &[Session],
    ) -> StoreResult<Option<Player>> {
        let mut players = self.players.write().await;

        Ok(players.get_mut(&id).map(|player| {
            player.password_hash = password_hash.to_string();
            player.active_sessions = sessions.to_vec();
            player.version += 1;
            player.clone()
        }))
    }

    async fn update_score(
        &self,
        username: &str,
        wins: u32,
        losses: u32,
    ) -> StoreResult<Option<Player>> {
        let mut players = self.players.write().await;

        Ok(players
            .values_mut()
            .find(|p| p.username == username)
            .map(|player| {
                player.wins = wins;
                player.losses = losses;
                player.version += 1;
                player.clone()
            }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}
