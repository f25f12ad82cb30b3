//! HTTP transport
//!
//! Handlers decode the request, hand it to [`DomainLogic`] and wrap the outcome in the JSON
//! envelope from [`response`]. Mapping errors onto status codes happens in [`ApiError`] only.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::{
    commands::DomainLogic, domain::validation::ValidationError, ports::database::DatabasePort,
};

use self::response::ApiError;

pub mod brand;
pub mod customer;
pub mod response;
pub mod transaction;
pub mod voucher;

pub struct AppState<D> {
    logic: DomainLogic<D>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            logic: self.logic.clone(),
        }
    }
}

/// Build the `/api/v1` router on top of the domain logic
pub fn router<D>(logic: DomainLogic<D>) -> Router
where
    D: DatabasePort + 'static,
{
    let api = Router::new()
        .route("/brand/create", post(brand::create::<D>))
        .route("/brand/list", get(brand::list::<D>))
        .route("/brand/detail", get(brand::detail::<D>))
        .route("/customer/create", post(customer::create::<D>))
        .route("/customer/list", get(customer::list::<D>))
        .route("/customer/detail", get(customer::detail::<D>))
        .route("/customer/update-points", put(customer::update_points::<D>))
        .route("/voucher/create", post(voucher::create::<D>))
        .route("/voucher/list", get(voucher::list::<D>))
        .route("/voucher/detail", get(voucher::detail::<D>))
        .route("/transaction/redemption", post(transaction::redeem::<D>))
        .route("/transaction/list", get(transaction::list::<D>))
        .route("/transaction/detail", get(transaction::detail::<D>));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { logic })
}

/// Unwrap a JSON body, turning any decoding failure into a validation error
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!(error = %rejection, "rejected request body");
        ApiError::BadRequest("Invalid".to_string())
    })
}

/// Unwrap query parameters, turning any decoding failure into a validation error
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(value)| value).map_err(|rejection| {
        debug!(error = %rejection, "rejected query string");
        ApiError::BadRequest("Invalid".to_string())
    })
}

/// Parse a mandatory numeric query parameter
fn required_id(label: &str, value: Option<String>) -> Result<i64, ApiError> {
    optional_id(label, value)?.ok_or_else(|| ValidationError::required(label).into())
}

/// Parse an optional numeric query parameter, treating an empty value as absent
fn optional_id(label: &str, value: Option<String>) -> Result<Option<i64>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ValidationError::invalid_format(label).into()),
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}
