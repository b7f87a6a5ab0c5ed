use axum::{Router, routing::put};

pub mod combat;
pub mod enemies;
pub mod heroes;
pub mod system;

/// Router for all arena endpoints except `/health`.
pub fn router() -> Router {
    Router::new()
        .route(
            "/combat/heroes/:hero_id/kill/:enemy_type/:enemy_id",
            put(combat::kill_enemy),
        )
        .nest("/heroes", heroes::router())
        .nest("/enemies", enemies::router())
}
