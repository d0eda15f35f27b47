use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{coordinator_or_admin_middleware, jwt_auth_middleware, AuthService};
use crate::models::{Cadre, County, CreateFacility, Department, Facility, Subcounty, UpdateFacility};
use crate::services::GeoService;

#[derive(Clone)]
pub struct AppState {
    pub geo_service: GeoService,
}

/// Counties, subcounties, facilities, and the classification lookups.
pub fn facility_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = AppState {
        geo_service: GeoService::new(db),
    };

    Router::new()
        .route("/counties", get(list_counties))
        .route("/counties/:id/subcounties", get(list_subcounties))
        .route("/cadres", get(list_cadres))
        .route("/departments", get(list_departments))
        .route("/facilities", get(list_facilities).post(create_facility))
        .route(
            "/facilities/:id",
            get(get_facility).put(update_facility).delete(delete_facility),
        )
        .route_layer(middleware::from_fn(coordinator_or_admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn list_counties(State(state): State<AppState>) -> Result<Json<Vec<County>>, StatusCode> {
    let counties = state
        .geo_service
        .list_counties()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(counties))
}

async fn list_subcounties(
    State(state): State<AppState>,
    Path(county_id): Path<Uuid>,
) -> Result<Json<Vec<Subcounty>>, StatusCode> {
    let subcounties = state
        .geo_service
        .list_subcounties(county_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(subcounties))
}

async fn list_cadres(State(state): State<AppState>) -> Result<Json<Vec<Cadre>>, StatusCode> {
    let cadres = state
        .geo_service
        .list_cadres()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(cadres))
}

async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Department>>, StatusCode> {
    let departments = state
        .geo_service
        .list_departments()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(departments))
}

#[derive(Debug, Deserialize)]
pub struct FacilityListQuery {
    pub subcounty_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

async fn list_facilities(
    State(state): State<AppState>,
    Query(query): Query<FacilityListQuery>,
) -> Result<Json<Vec<Facility>>, StatusCode> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let facilities = state
        .geo_service
        .list_facilities(query.subcounty_id, limit, offset)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(facilities))
}

async fn create_facility(
    State(state): State<AppState>,
    Json(facility_data): Json<CreateFacility>,
) -> Result<(StatusCode, Json<Facility>), StatusCode> {
    let facility = state
        .geo_service
        .create_facility(facility_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(facility)))
}

async fn get_facility(
    State(state): State<AppState>,
    Path(facility_id): Path<Uuid>,
) -> Result<Json<Facility>, StatusCode> {
    let facility = state
        .geo_service
        .get_facility_by_id(facility_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(facility))
}

async fn update_facility(
    State(state): State<AppState>,
    Path(facility_id): Path<Uuid>,
    Json(facility_data): Json<UpdateFacility>,
) -> Result<Json<Facility>, StatusCode> {
    let facility = state
        .geo_service
        .update_facility(facility_id, facility_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(facility))
}

async fn delete_facility(
    State(state): State<AppState>,
    Path(facility_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state
        .geo_service
        .delete_facility(facility_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
