use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use arena_combat::KillEnemy;

use crate::app::errors;
use crate::app::services::AppServices;

/// `PUT /combat/heroes/:hero_id/kill/:enemy_type/:enemy_id`
///
/// 200 `{"actionId": <enemy id>}` on success. Losing a race and killing an
/// already-dead enemy both answer 409.
pub async fn kill_enemy(
    Extension(services): Extension<Arc<AppServices>>,
    Path((hero_id, enemy_type, enemy_id)): Path<(String, String, String)>,
) -> axum::response::Response {
    let hero_id = match errors::parse_hero_id(&hero_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let enemy_type = match errors::parse_enemy_type(&enemy_type) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let enemy_id = match errors::parse_enemy_id(&enemy_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = KillEnemy {
        hero_id,
        enemy_id,
        enemy_type,
    };

    match services.attempt_kill(cmd).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => errors::kill_error_to_response(e),
    }
}
