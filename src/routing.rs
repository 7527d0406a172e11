//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde::Serialize;

use crate::{
    AppState, endpoints,
    error::error_response,
    record::{
        create_record_endpoint, get_record_endpoint, get_summary_endpoint, list_records_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_health))
        .route(
            endpoints::RECORDS,
            get(list_records_endpoint).post(create_record_endpoint),
        )
        .route(endpoints::RECORDS_SUMMARY, get(get_summary_endpoint))
        .route(endpoints::RECORD, get(get_record_endpoint))
        .fallback(get_404_not_found)
        .method_not_allowed_fallback(get_405_method_not_allowed)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

/// The root path '/' reports that the service is running.
async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "Family ledger is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_404_not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "The requested route does not exist.",
        None,
    )
}

async fn get_405_method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "The requested route does not support this method.",
        None,
    )
}
