use super::AppState;
use super::models::{ListingResponse, PageQuery};
use crate::catalog::{PageRequest, normalize_price};
use crate::errors::ApiError;
use crate::models::{
    CarDoc, CarId, CarPatch, DeleteOutcome, InsertOutcome, SubCategory, UpdateOutcome,
};
use crate::store::CarFilter;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body_or_bad_request(body: Result<Json<CarDoc>, JsonRejection>) -> Result<CarDoc, ApiError> {
    body.map(|Json(car)| car)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn path_or_bad_request(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    path.map(|Path(segment)| segment)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<CarId, ApiError> {
    Ok(path_or_bad_request(path)?.parse::<CarId>()?)
}

/// Prices leave the API as numbers whatever their stored form.
fn normalized(mut cars: Vec<CarDoc>) -> Vec<CarDoc> {
    cars.iter_mut().for_each(normalize_price);
    cars
}

/// GET / — liveness text
pub async fn root() -> &'static str {
    "Toy cars is running..."
}

/// GET /car?page=N — 20 cars per page, cheapest first, prices as numbers
pub async fn list_cars(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<ListingResponse> {
    // an unreadable query string is treated like a missing page
    let query = query
        .map(|Query(pairs)| PageQuery::from_pairs(pairs))
        .unwrap_or_default();
    let request = PageRequest::parse(query.page.as_deref());

    let (total_count, data) = tokio::try_join!(
        state.store.count(),
        state.store.list_by_price(request.skip(), request.limit()),
    )?;

    Ok(Json(ListingResponse {
        data: normalized(data),
        page: request.page(),
        total_pages: PageRequest::total_pages(total_count),
    }))
}

async fn by_category(state: &AppState, category: SubCategory) -> ApiResult<Vec<CarDoc>> {
    let cars = state.store.find(&CarFilter::SubCategory(category)).await?;
    Ok(Json(normalized(cars)))
}

/// GET /sportsCar
pub async fn sports_cars(State(state): State<AppState>) -> ApiResult<Vec<CarDoc>> {
    by_category(&state, SubCategory::SportsCar).await
}

/// GET /policeCar
pub async fn police_cars(State(state): State<AppState>) -> ApiResult<Vec<CarDoc>> {
    by_category(&state, SubCategory::PoliceCar).await
}

/// GET /miniFireTruck
pub async fn mini_fire_trucks(State(state): State<AppState>) -> ApiResult<Vec<CarDoc>> {
    by_category(&state, SubCategory::FiretruckCar).await
}

/// GET /car/{id} — the car, or `null` when there is none
pub async fn get_car(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Option<CarDoc>> {
    let id = parse_id(path)?;
    let car = state.store.find_by_id(id).await?.map(|mut car| {
        normalize_price(&mut car);
        car
    });
    Ok(Json(car))
}

/// GET /searchCar/{name} — case-insensitive substring match on name
pub async fn search_cars(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Vec<CarDoc>> {
    let name = path_or_bad_request(path)?;
    let cars = state.store.find(&CarFilter::NameContains(name.clone())).await?;
    tracing::debug!("search {:?}: {} match(es)", name, cars.len());
    Ok(Json(normalized(cars)))
}

/// GET /myToy/{email}
pub async fn my_toys(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Vec<CarDoc>> {
    let email = path_or_bad_request(path)?;
    let cars = state.store.find(&CarFilter::SellerEmail(email)).await?;
    Ok(Json(normalized(cars)))
}

/// POST /allCars
pub async fn add_car(
    State(state): State<AppState>,
    body: Result<Json<CarDoc>, JsonRejection>,
) -> ApiResult<InsertOutcome> {
    let car = body_or_bad_request(body)?;
    Ok(Json(state.store.insert(car).await?))
}

/// PATCH /car/{id} — writes allow-listed fields, creating the car if missing
pub async fn update_car(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<CarDoc>, JsonRejection>,
) -> ApiResult<UpdateOutcome> {
    let id = parse_id(path)?;
    let patch = CarPatch::from_body(&body_or_bad_request(body)?, state.update_mode);
    Ok(Json(state.store.upsert(id, &patch).await?))
}

/// DELETE /car/{id}
pub async fn delete_car(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<DeleteOutcome> {
    let id = parse_id(path)?;
    let outcome = state.store.delete(id).await?;
    tracing::info!("deleted car {}: {} document(s)", id, outcome.deleted_count);
    Ok(Json(outcome))
}
