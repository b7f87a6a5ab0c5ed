use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use arena_combat::EnemyType;
use arena_core::{EnemyId, HeroId};
use arena_infra::kill_coordinator::KillError;
use arena_infra::store::StoreError;

/// Message for every infrastructure failure; details go to the log only.
pub const COMBAT_FAILURE_MESSAGE: &str = "An unexpected error occurred during combat";

pub fn kill_error_to_response(err: KillError) -> axum::response::Response {
    match err {
        KillError::HeroNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "hero_not_found",
            format!("Hero with ID {id} not found"),
        ),
        KillError::EnemyNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "enemy_not_found",
            format!("Enemy with ID {id} not found"),
        ),
        KillError::EnemyAlreadyKilled { enemy_id, .. } => json_error(
            StatusCode::CONFLICT,
            "enemy_already_killed",
            format!("Enemy {enemy_id} has already been killed"),
        ),
        KillError::EnemyTypeMismatch {
            enemy_id, expected, ..
        } => json_error(
            StatusCode::BAD_REQUEST,
            "enemy_type_mismatch",
            format!("Enemy {enemy_id} is not of type {expected}"),
        ),
        KillError::Domain(e) => {
            tracing::error!(error = %e, "kill rejected by domain after pre-checks");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "combat_error", COMBAT_FAILURE_MESSAGE)
        }
        KillError::Store(e) => {
            tracing::error!(error = %e, "kill failed in store");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "combat_error", COMBAT_FAILURE_MESSAGE)
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "read failed in store");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_error",
        "An unexpected error occurred while reading the arena",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_hero_id(s: &str) -> Result<HeroId, axum::response::Response> {
    s.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid hero id"))
}

pub fn parse_enemy_id(s: &str) -> Result<EnemyId, axum::response::Response> {
    s.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid enemy id"))
}

pub fn parse_enemy_type(s: &str) -> Result<EnemyType, axum::response::Response> {
    s.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_enemy_type",
            "enemy type must be one of: DRAGON, ORC, GOBLIN, TROLL",
        )
    })
}
