//! State and city routes

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use drydock_db::{City, NewCity, NewState, State as GeoState};
use tracing::info;

use crate::error::ApiError;
use crate::routes::portal::auth::RequireAuth;
use crate::state::AppState;

use super::types::CitiesQuery;

/// GET /api/v1/states
async fn list_states(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<GeoState>>, ApiError> {
    let states = state.db.list_states().await?;
    Ok(Json(states))
}

/// POST /api/v1/states
async fn create_state(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<NewState>,
) -> Result<(StatusCode, Json<GeoState>), ApiError> {
    if request.name.is_empty() || request.code.is_empty() {
        return Err(ApiError::BadRequest(
            "Name and code are required".to_string(),
        ));
    }

    let created = state.db.insert_state(request).await?;
    info!("Added state: {}", created.code);

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/cities[?state_id=]
async fn list_cities(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<CitiesQuery>,
) -> Result<Json<Vec<City>>, ApiError> {
    let cities = match query.state_id {
        Some(state_id) => state.db.list_cities_by_state(state_id).await?,
        None => state.db.list_cities().await?,
    };
    Ok(Json(cities))
}

/// POST /api/v1/cities
async fn create_city(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<NewCity>,
) -> Result<(StatusCode, Json<City>), ApiError> {
    if request.name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if state.db.get_state_by_id(request.state_id).await?.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Unknown state: {}",
            request.state_id
        )));
    }

    let created = state.db.insert_city(request).await?;
    info!("Added city: {}", created.name);

    Ok((StatusCode::CREATED, Json(created)))
}

/// Create geography routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/states", get(list_states).post(create_state))
        .route("/api/v1/cities", get(list_cities).post(create_city))
}
