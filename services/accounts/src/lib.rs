//! Account service for the Prop Game
//!
//! Players register, log in from at most a few devices at a time, keep their
//! win/loss tally, and reset their password by gmail to regain access. The only
//! real rule lives in [`guard`]; everything else is request plumbing around
//! the [`store::PlayerStore`].

pub mod error;
pub mod extract;
pub mod guard;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod recovery;
pub mod routes;
pub mod settings;
pub mod state;
pub mod store;
pub mod validation;

pub use routes::create_router;
pub use settings::{Settings, StoreBackend};
pub use state::AppState;
