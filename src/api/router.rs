use super::{AppState, handlers};
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds and returns the full Axum router with all routes and shared state.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/car", get(handlers::list_cars))
        .route(
            "/car/{id}",
            get(handlers::get_car)
                .patch(handlers::update_car)
                .delete(handlers::delete_car),
        )
        .route("/sportsCar", get(handlers::sports_cars))
        .route("/policeCar", get(handlers::police_cars))
        .route("/miniFireTruck", get(handlers::mini_fire_trucks))
        .route("/searchCar/{name}", get(handlers::search_cars))
        .route("/myToy/{email}", get(handlers::my_toys))
        .route("/allCars", post(handlers::add_car))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
