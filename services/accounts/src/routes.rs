//! Account service routes
//!
//! Paths and JSON field names match what the browser game already sends.
//! Bodies that fail to decode are answered like any other validation error.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    error::{AccountError, AccountResult},
    extract::AccountJson,
    guard::{self, Decision},
    models::{NewPlayer, PlayerProfile, PlayerSummary},
    password::{hash_password_blocking, verify_password_blocking},
    state::AppState,
    store::PlayerStore,
    validation::{
        normalize_gmail, required, validate_device_id, validate_gmail, validate_password,
        validate_score, validate_username,
    },
};

/// Session writes retried this many times when another write wins the race
pub const MAX_SESSION_WRITE_ATTEMPTS: u32 = 5;

/// Request for player registration
#[derive(Deserialize)]
pub struct SavePlayerRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub gmail: Option<String>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
}

/// Request for player login
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_id: Option<String>,
}

/// Request for a password reset
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub gmail: Option<String>,
    pub new_password: Option<String>,
    pub device_id: Option<String>,
    pub recovery_token: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateScoreRequest {
    pub username: Option<String>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
}

#[derive(Deserialize)]
pub struct GetPlayerQuery {
    pub username: Option<String>,
}

#[derive(Deserialize)]
pub struct RecoverRequest {
    pub gmail: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response for login and password reset
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub player: PlayerSummary,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub message: String,
    pub player: PlayerProfile,
}

#[derive(Serialize)]
pub struct LoginDetails {
    pub username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverResponse {
    pub message: String,
    pub login_details: LoginDetails,
}

/// Create the router for the account service
pub fn create_router<S: PlayerStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check::<S>))
        .route("/savePlayer", post(save_player::<S>))
        .route("/login", post(login::<S>))
        .route("/resetPassword", post(reset_password::<S>))
        .route("/players", get(list_players::<S>))
        .route("/updateScore", post(update_score::<S>))
        .route("/getPlayer", get(get_player::<S>))
        .route("/recover", post(recover::<S>))
        .fallback(endpoint_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check<S: PlayerStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            error!("Store health check failed: {}", e);
            false
        }
    };

    Json(json!({
        "status": if store_healthy { "ok" } else { "degraded" },
        "service": "account-service",
        "store": state.store.backend(),
        "storeHealthy": store_healthy,
    }))
}

/// Player registration endpoint
pub async fn save_player<S: PlayerStore>(
    State(state): State<AppState<S>>,
    AccountJson(payload): AccountJson<SavePlayerRequest>,
) -> AccountResult<Json<MessageResponse>> {
    let SavePlayerRequest {
        username,
        password,
        gmail,
        wins,
        losses,
    } = payload;

    let (Some(username), Some(password), Some(gmail)) =
        (required(username), required(password), required(gmail))
    else {
        return Err(AccountError::Validation(
            "Username, password, and gmail are required.".to_string(),
        ));
    };

    let username = username.trim().to_string();
    validate_username(&username).map_err(AccountError::Validation)?;
    validate_password(&password).map_err(AccountError::Validation)?;
    let gmail = normalize_gmail(&gmail);
    validate_gmail(&gmail).map_err(AccountError::Validation)?;
    let wins = validate_score("wins", wins.unwrap_or(0)).map_err(AccountError::Validation)?;
    let losses =
        validate_score("losses", losses.unwrap_or(0)).map_err(AccountError::Validation)?;

    let password_hash = hash_password_blocking(password).await?;

    let player = state
        .store
        .insert(NewPlayer {
            username,
            password_hash,
            gmail,
            wins,
            losses,
        })
        .await?;

    info!("Registered player: {}", player.username);

    Ok(Json(MessageResponse {
        message: "Player registered successfully!".to_string(),
    }))
}

/// Player login endpoint, subject to the device cap
pub async fn login<S: PlayerStore>(
    State(state): State<AppState<S>>,
    AccountJson(payload): AccountJson<LoginRequest>,
) -> AccountResult<Json<LoginResponse>> {
    let LoginRequest {
        username,
        password,
        device_id,
    } = payload;

    let (Some(username), Some(password), Some(device_id)) =
        (required(username), required(password), required(device_id))
    else {
        return Err(AccountError::Validation(
            "Username, password, and deviceId are required.".to_string(),
        ));
    };
    validate_device_id(&device_id).map_err(AccountError::Validation)?;

    let username = username.trim();
    info!("Login attempt for player: {}", username);

    let limiter_key = format!("login:{}", username);
    if !state.rate_limiter.is_allowed(&limiter_key).await {
        warn!("Login blocked by rate limiter for player: {}", username);
        return Err(AccountError::TooManyAttempts);
    }

    let Some(mut player) = state.store.find_by_username(username).await? else {
        state.rate_limiter.record(&limiter_key).await;
        return Err(AccountError::InvalidCredentials);
    };

    let verified_hash = player.password_hash.clone();
    if !verify_password_blocking(password, verified_hash.clone()).await? {
        state.rate_limiter.record(&limiter_key).await;
        return Err(AccountError::InvalidCredentials);
    }
    state.rate_limiter.clear(&limiter_key).await;

    for attempt in 1..=MAX_SESSION_WRITE_ATTEMPTS {
        let admission = guard::admit(
            &player.active_sessions,
            &device_id,
            Utc::now(),
            &state.policy,
        );

        // Written in every branch so expired sessions go away even on Reject
        let written = state
            .store
            .replace_sessions(player.id, player.version, &admission.sessions)
            .await?;

        if written {
            if admission.pruned > 0 {
                info!(
                    "Pruned {} expired session(s) for player: {}",
                    admission.pruned, player.username
                );
            }

            return match admission.decision {
                Decision::Reject => {
                    warn!(
                        "Device limit reached for player {}; rejected device {}",
                        player.username, device_id
                    );
                    Err(AccountError::DeviceLimit(state.policy.max_devices))
                }
                Decision::Renew | Decision::Admit => {
                    info!(
                        "Player {} logged in from device {} ({:?})",
                        player.username, device_id, admission.decision
                    );
                    Ok(Json(LoginResponse {
                        message: "Login successful!".to_string(),
                        player: PlayerSummary::from(&player),
                    }))
                }
            };
        }

        warn!(
            "Sessions of player {} changed concurrently (attempt {}), re-reading",
            player.username, attempt
        );
        player = state
            .store
            .find_by_username(&player.username)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        // Password was reset after it was verified
        if player.password_hash != verified_hash {
            warn!(
                "Password of player {} changed during login, rejecting device {}",
                player.username, device_id
            );
            return Err(AccountError::InvalidCredentials);
        }
    }

    Err(AccountError::Internal(format!(
        "Gave up updating sessions of player {} after {} attempts",
        username, MAX_SESSION_WRITE_ATTEMPTS
    )))
}

/// Password reset endpoint: clears every session and logs in this device
pub async fn reset_password<S: PlayerStore>(
    State(state): State<AppState<S>>,
    AccountJson(payload): AccountJson<ResetPasswordRequest>,
) -> AccountResult<Json<LoginResponse>> {
    let ResetPasswordRequest {
        gmail,
        new_password,
        device_id,
        recovery_token,
    } = payload;

    let (Some(gmail), Some(new_password), Some(device_id)) =
        (required(gmail), required(new_password), required(device_id))
    else {
        return Err(AccountError::Validation(
            "gmail, newPassword, and deviceId are required.".to_string(),
        ));
    };
    validate_password(&new_password).map_err(AccountError::Validation)?;
    validate_device_id(&device_id).map_err(AccountError::Validation)?;

    let gmail = normalize_gmail(&gmail);

    let limiter_key = format!("reset:{}", gmail);
    if !state.rate_limiter.is_allowed(&limiter_key).await {
        warn!("Password reset blocked by rate limiter for: {}", gmail);
        return Err(AccountError::TooManyAttempts);
    }

    let player = state
        .store
        .find_by_gmail(&gmail)
        .await?
        .ok_or_else(|| AccountError::NotFound("No user with that gmail.".to_string()))?;

    if state.require_recovery_token {
        let Some(token) = required(recovery_token) else {
            return Err(AccountError::Validation(
                "recoveryToken is required. Request one via /recover.".to_string(),
            ));
        };

        if !state
            .recovery_tokens
            .consume(&gmail, &token, Utc::now())
            .await
        {
            state.rate_limiter.record(&limiter_key).await;
            return Err(AccountError::InvalidRecoveryToken);
        }
    }

    let password_hash = hash_password_blocking(new_password).await?;
    let sessions = guard::reset_sessions(&device_id, Utc::now());

    let player = state
        .store
        .reset_credentials(player.id, &password_hash, &sessions)
        .await?
        .ok_or_else(|| AccountError::NotFound("No user with that gmail.".to_string()))?;

    state.rate_limiter.clear(&limiter_key).await;
    info!(
        "Password reset for player {}; device {} is now the only session",
        player.username, device_id
    );

    Ok(Json(LoginResponse {
        message: "Password reset successful! You are now logged in.".to_string(),
        player: PlayerSummary::from(&player),
    }))
}

/// Leaderboard: every player without credentials, best first
pub async fn list_players<S: PlayerStore>(
    State(state): State<AppState<S>>,
) -> AccountResult<Json<Vec<PlayerProfile>>> {
    let players = state.store.list_ranked().await?;

    Ok(Json(players.into_iter().map(PlayerProfile::from).collect()))
}

/// Overwrite a player's win/loss tally
pub async fn update_score<S: PlayerStore>(
    State(state): State<AppState<S>>,
    AccountJson(payload): AccountJson<UpdateScoreRequest>,
) -> AccountResult<Json<ScoreResponse>> {
    let (Some(username), Some(wins), Some(losses)) =
        (required(payload.username), payload.wins, payload.losses)
    else {
        return Err(AccountError::Validation(
            "Username, wins, and losses are required.".to_string(),
        ));
    };

    let wins = validate_score("wins", wins).map_err(AccountError::Validation)?;
    let losses = validate_score("losses", losses).map_err(AccountError::Validation)?;

    let player = state
        .store
        .update_score(username.trim(), wins, losses)
        .await?
        .ok_or_else(|| AccountError::NotFound("Player not found.".to_string()))?;

    info!(
        "Score of player {} set to {}W/{}L",
        player.username, player.wins, player.losses
    );

    Ok(Json(ScoreResponse {
        message: "Score updated successfully!".to_string(),
        player: player.into(),
    }))
}

pub async fn get_player<S: PlayerStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<GetPlayerQuery>,
) -> AccountResult<Json<PlayerProfile>> {
    let Some(username) = required(query.username) else {
        return Err(AccountError::Validation("Username is required.".to_string()));
    };

    let player = state
        .store
        .find_by_username(username.trim())
        .await?
        .ok_or_else(|| AccountError::NotFound("Player not found.".to_string()))?;

    Ok(Json(player.into()))
}

/// Account recovery: issues a reset token and "mails" it.
///
/// Delivery is simulated through the service log; the token never appears
/// in the response.
pub async fn recover<S: PlayerStore>(
    State(state): State<AppState<S>>,
    AccountJson(payload): AccountJson<RecoverRequest>,
) -> AccountResult<Json<RecoverResponse>> {
    let Some(gmail) = required(payload.gmail) else {
        return Err(AccountError::Validation("Gmail is required.".to_string()));
    };
    let gmail = normalize_gmail(&gmail);

    let limiter_key = format!("recover:{}", gmail);
    if !state.rate_limiter.is_allowed(&limiter_key).await {
        warn!("Recovery blocked by rate limiter for: {}", gmail);
        return Err(AccountError::TooManyAttempts);
    }
    state.rate_limiter.record(&limiter_key).await;

    let player = state
        .store
        .find_by_gmail(&gmail)
        .await?
        .ok_or_else(|| AccountError::NotFound("No user found with this gmail.".to_string()))?;

    let token = state.recovery_tokens.issue(&gmail, Utc::now()).await;
    info!(
        "Recovery email (simulated) to {}: token {} valid for {} minutes",
        gmail,
        token,
        state.recovery_tokens.ttl().num_minutes()
    );

    Ok(Json(RecoverResponse {
        message: "Recovery email sent (simulated).".to_string(),
        login_details: LoginDetails {
            username: player.username,
        },
    }))
}

pub async fn endpoint_not_found() -> AccountError {
    AccountError::NotFound("Endpoint not found".to_string())
}
