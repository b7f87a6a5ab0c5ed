use std::sync::Arc;

use axum::{
    Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_enemies))
}

/// Type (DRAGON, ORC, GOBLIN, TROLL), then level desc, then name.
pub async fn list_enemies(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_enemies().await {
        Ok(records) => {
            let body: Vec<dto::EnemyResponse> = records.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
