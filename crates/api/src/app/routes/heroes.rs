use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_heroes))
        .route("/:hero_id/kills", get(list_kills))
}

/// Level desc, kill count desc, name asc.
pub async fn list_heroes(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_heroes().await {
        Ok(records) => {
            let body: Vec<dto::HeroResponse> = records.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Enemies killed by the hero, by name.
pub async fn list_kills(
    Extension(services): Extension<Arc<AppServices>>,
    Path(hero_id): Path<String>,
) -> axum::response::Response {
    let hero_id = match errors::parse_hero_id(&hero_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let store = services.store();
    match store.read_hero(hero_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(
                StatusCode::NOT_FOUND,
                "hero_not_found",
                format!("Hero with ID {hero_id} not found"),
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    match store.enemies_killed_by(hero_id).await {
        Ok(records) => {
            let body: Vec<dto::EnemyResponse> = records.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
