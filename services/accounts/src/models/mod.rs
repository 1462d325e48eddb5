//! Account service models

pub mod player;
pub mod session;

pub use player::{NewPlayer, Player, PlayerProfile, PlayerSummary, ranking_order};
pub use session::Session;
