//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{BookingLifecycle, StationCapacityReconciler};
use crate::interfaces::http::common::ApiResponse;

use super::modules::bookings::{self, dto as booking_dto, BookingAppState};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{self as http_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::stations::{self, dto as station_dto, StationAppState};

/// Everything the HTTP layer needs. Axum hands each handler its own
/// slice via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingLifecycle>,
    pub stations: Arc<StationCapacityReconciler>,
    pub db: Option<DatabaseConnection>,
    pub started_at: Arc<Instant>,
}

impl AppState {
    pub fn new(
        bookings: Arc<BookingLifecycle>,
        stations: Arc<StationCapacityReconciler>,
        db: Option<DatabaseConnection>,
    ) -> Self {
        Self {
            bookings,
            stations,
            db,
            started_at: Arc::new(Instant::now()),
        }
    }
}

impl FromRef<AppState> for BookingAppState {
    fn from_ref(s: &AppState) -> Self {
        BookingAppState {
            lifecycle: Arc::clone(&s.bookings),
            stations: Arc::clone(&s.stations),
        }
    }
}

impl FromRef<AppState> for StationAppState {
    fn from_ref(s: &AppState) -> Self {
        StationAppState {
            stations: Arc::clone(&s.stations),
        }
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Bookings
        bookings::handlers::create_booking,
        bookings::handlers::list_bookings,
        bookings::handlers::user_booking_stats,
        bookings::handlers::get_booking,
        bookings::handlers::update_booking,
        bookings::handlers::cancel_booking,
        bookings::handlers::approve_booking,
        bookings::handlers::start_booking,
        bookings::handlers::complete_booking,
        bookings::handlers::delete_booking,
        // Stations
        stations::handlers::create_station,
        stations::handlers::list_stations,
        stations::handlers::nearby_stations,
        stations::handlers::list_operator_stations,
        stations::handlers::get_station,
        stations::handlers::update_station,
        stations::handlers::activate_station,
        stations::handlers::deactivate_station,
        stations::handlers::maintenance_station,
        stations::handlers::reconcile_station,
        stations::handlers::update_capacity,
    ),
    components(schemas(
        ApiResponse<booking_dto::BookingDto>,
        ApiResponse<booking_dto::BookingCreatedResponse>,
        ApiResponse<booking_dto::UserBookingStatsDto>,
        ApiResponse<station_dto::StationDto>,
        booking_dto::CreateBookingRequest,
        booking_dto::UpdateBookingRequest,
        booking_dto::BookingDto,
        booking_dto::BookingCreatedResponse,
        booking_dto::UserBookingStatsDto,
        station_dto::CreateStationRequest,
        station_dto::UpdateStationRequest,
        station_dto::UpdateCapacityRequest,
        station_dto::StationDto,
        station_dto::NearbyStationDto,
        station_dto::LocationDto,
        station_dto::OperatingHoursDto,
        health::HealthResponse,
        health::ComponentHealth,
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Bookings", description = "Charging slot bookings"),
        (name = "Stations", description = "Charging stations and capacity")
    ),
    info(
        title = "EV Charging Booking API",
        description = "Booking lifecycle and station capacity service"
    )
)]
pub struct ApiDoc;

pub fn create_api_router(state: AppState, prometheus: Option<PrometheusHandle>) -> Router {
    let booking_routes = Router::new()
        .route(
            "/",
            post(bookings::handlers::create_booking).get(bookings::handlers::list_bookings),
        )
        .route(
            "/{id}",
            get(bookings::handlers::get_booking)
                .put(bookings::handlers::update_booking)
                .delete(bookings::handlers::delete_booking),
        )
        .route("/stats/{user_id}", get(bookings::handlers::user_booking_stats))
        .route("/{id}/cancel", patch(bookings::handlers::cancel_booking))
        .route("/{id}/approve", patch(bookings::handlers::approve_booking))
        .route("/{id}/start", patch(bookings::handlers::start_booking))
        .route("/{id}/complete", patch(bookings::handlers::complete_booking));

    let station_routes = Router::new()
        .route(
            "/",
            post(stations::handlers::create_station).get(stations::handlers::list_stations),
        )
        .route("/nearby", get(stations::handlers::nearby_stations))
        .route(
            "/operator/{operator_id}",
            get(stations::handlers::list_operator_stations),
        )
        .route(
            "/{id}",
            get(stations::handlers::get_station).put(stations::handlers::update_station),
        )
        .route("/{id}/activate", patch(stations::handlers::activate_station))
        .route("/{id}/deactivate", patch(stations::handlers::deactivate_station))
        .route("/{id}/maintenance", patch(stations::handlers::maintenance_station))
        .route("/{id}/update-slots", patch(stations::handlers::reconcile_station))
        .route("/{id}/capacity", patch(stations::handlers::update_capacity));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .route("/health", get(health::health_check))
        .nest("/api/v1/bookings", booking_routes)
        .nest("/api/v1/stations", station_routes)
        .with_state(state);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(http_metrics::prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(http_metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────
