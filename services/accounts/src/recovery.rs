//! Time-limited recovery tokens
//!
//! `/recover` issues a token per gmail address and `/resetPassword` consumes
//! it, so changing a password takes proof of access to the mailbox rather
//! than knowledge of the address alone. Tokens live in process memory; a
//! restart invalidates every outstanding token.

use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, distributions::Alphanumeric};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const TOKEN_LENGTH: usize = 32;

#[derive(Debug)]
struct IssuedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Outstanding recovery tokens, one per gmail address
#[derive(Debug, Clone)]
pub struct RecoveryTokens {
    ttl: TimeDelta,
    entries: Arc<Mutex<HashMap<String, IssuedToken>>>,
}

impl RecoveryTokens {
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Issue a token for `gmail`, replacing any earlier one
    pub async fn issue(&self, gmail: &str, now: DateTime<Utc>) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        let mut entries = self.entries.lock().await;
        entries.retain(|_, issued| issued.expires_at > now);
        entries.insert(
            gmail.to_string(),
            IssuedToken {
                token: token.clone(),
                expires_at: now + self.ttl,
            },
        );

        token
    }

    /// Redeem a token. Succeeds at most once, and only before expiry.
    pub async fn consume(&self, gmail: &str, token: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock().await;

        let Some(issued) = entries.get(gmail) else {
            return false;
        };

        if issued.expires_at <= now {
            entries.remove(gmail);
            return false;
        }

        if !constant_time_eq(issued.token.as_bytes(), token.as_bytes()) {
            return false;
        }

        entries.remove(gmail);
        true
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
