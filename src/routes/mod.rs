use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod judging;
pub mod legacy;
pub mod overlay;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(judging::router())
        .merge(overlay::router())
        .merge(legacy::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
