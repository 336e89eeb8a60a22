/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Judge cards, match installation and the versioned judging state.
pub mod judging_service;
/// Broadcast overlay and robot cards.
pub mod overlay_service;
