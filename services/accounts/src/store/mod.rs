//! Account store: persistence of player records
//!
//! Handlers only see the [`PlayerStore`] trait. Session lists are written
//! with a compare-and-swap on the player's version so two logins racing on
//! the same account cannot silently drop each other's device.

use std::future::Future;

use common::error::DatabaseError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewPlayer, Player, Session};

pub mod memory;
pub mod postgres;

pub use memory::MemoryPlayerStore;
pub use postgres::PgPlayerStore;

/// Errors raised by a player store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique field (`username` or `gmail`) is already taken
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent collection of players keyed by username and gmail.
pub trait PlayerStore: Clone + Send + Sync + 'static {
    /// Insert a new player with an empty session list
    fn insert(&self, new_player: NewPlayer) -> impl Future<Output = StoreResult<Player>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<Player>>> + Send;

    /// Look up by normalized gmail
    fn find_by_gmail(&self, gmail: &str)
    -> impl Future<Output = StoreResult<Option<Player>>> + Send;

    /// All players, wins descending then newest first
    fn list_ranked(&self) -> impl Future<Output = StoreResult<Vec<Player>>> + Send;

    /// Replace the session list if the stored version still equals
    /// `expected_version`. Returns `false` when another write got there
    /// first; nothing is written in that case.
    fn replace_sessions(
        &self,
        id: Uuid,
        expected_version: i64,
        sessions: &[Session],
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Unconditionally set a new password hash and session list
    fn reset_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        sessions: &[Session],
    ) -> impl Future<Output = StoreResult<Option<Player>>> + Send;

    fn update_score(
        &self,
        username: &str,
        wins: u32,
        losses: u32,
    ) -> impl Future<Output = StoreResult<Option<Player>>> + Send;

    /// Name of the backend, for health reporting
    fn backend(&self) -> &'static str;

    fn health_check(&self) -> impl Future<Output = StoreResult<bool>> + Send;
}
