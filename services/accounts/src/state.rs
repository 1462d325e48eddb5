//! Application state shared across handlers

use crate::{
    guard::DevicePolicy, rate_limiter::RateLimiter, recovery::RecoveryTokens, settings::Settings,
    store::PlayerStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub policy: DevicePolicy,
    pub recovery_tokens: RecoveryTokens,
    pub rate_limiter: RateLimiter,
    pub require_recovery_token: bool,
}

impl<S: PlayerStore> AppState<S> {
    pub fn new(store: S, settings: &Settings) -> Self {
        Self {
            store,
            policy: settings.device_policy(),
            recovery_tokens: RecoveryTokens::new(settings.recovery_token_ttl()),
            rate_limiter: RateLimiter::new(settings.rate_limiter_config()),
            require_recovery_token: settings.require_recovery_token,
        }
    }
}
