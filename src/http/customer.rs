use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;

use crate::{
    commands::customer::{
        CreateCustomerRequest, CustomerDetailRequest, ListCustomersRequest,
        UpdateCustomerPointsRequest,
    },
    domain::Customer,
    ports::database::DatabasePort,
};

use super::{
    format_date, json_body, query_params, required_id,
    response::{ApiError, ApiSuccess},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCustomerBody {
    pub full_name: String,
    pub email: String,
    pub points: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePointsBody {
    /// Customer to update
    pub id: i64,
    pub points: i64,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    #[serde(rename = "customerId")]
    customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub points: i64,
    pub is_deleted: bool,
    pub created_date: String,
    pub modified_date: String,
}

impl From<Customer> for CustomerBody {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            full_name: customer.full_name,
            email: customer.email,
            points: customer.points,
            is_deleted: customer.is_deleted,
            created_date: format_date(&customer.created_date),
            modified_date: format_date(&customer.modified_date),
        }
    }
}

pub async fn create<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<CreateCustomerBody>, JsonRejection>,
) -> Result<ApiSuccess<CustomerBody>, ApiError> {
    let body = json_body(body)?;
    let customer = state
        .logic
        .oneshot(CreateCustomerRequest {
            full_name: body.full_name,
            email: body.email,
            points: body.points,
        })
        .await?;

    Ok(ApiSuccess(customer.into()))
}

pub async fn list<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
) -> Result<ApiSuccess<Vec<CustomerBody>>, ApiError> {
    let customers = state.logic.oneshot(ListCustomersRequest).await?;

    Ok(ApiSuccess(customers.into_iter().map(Into::into).collect()))
}

pub async fn detail<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<ApiSuccess<CustomerBody>, ApiError> {
    let query = query_params(query)?;
    let customer_id = required_id("customerId", query.customer_id)?;
    let customer = state
        .logic
        .oneshot(CustomerDetailRequest { customer_id })
        .await?;

    Ok(ApiSuccess(customer.into()))
}

pub async fn update_points<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<UpdatePointsBody>, JsonRejection>,
) -> Result<ApiSuccess<CustomerBody>, ApiError> {
    let body = json_body(body)?;
    let customer = state
        .logic
        .oneshot(UpdateCustomerPointsRequest {
            customer_id: body.id,
            points: body.points,
        })
        .await?;

    Ok(ApiSuccess(customer.into()))
}

#[cfg(test)]
mod tests {
    use crate::{
        adapters::database::memory::MemoryDatabase,
        commands::DomainLogic,
        http::{router, tests::send},
    };
    use axum::http::StatusCode;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::BoxError;

    #[tokio::test]
    async fn test_create_and_update_points() -> Result<(), BoxError> {
        let app = router(DomainLogic::new(Arc::new(MemoryDatabase::default())));

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/customer/create",
            Some(r#"{"fullName": "Jane Doe", "email": "jane@example.com", "points": 10}"#),
        )
        .await?;
        assert_that!(status).is_equal_to(StatusCode::OK);
        let id = body["result"]["id"].as_i64().unwrap_or_default();

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/customer/update-points",
            Some(&format!(r#"{{"id": {id}, "points": 500}}"#)),
        )
        .await?;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["result"]["points"].as_i64()).is_equal_to(Some(500));

        let (_, body) = send(&app, "GET", "/api/v1/customer/list", None).await?;
        assert_that!(body["result"].as_array().map(Vec::len)).is_equal_to(Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_invalid_email() -> Result<(), BoxError> {
        let app = router(DomainLogic::new(Arc::new(MemoryDatabase::default())));

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/customer/create",
            Some(r#"{"fullName": "Jane Doe", "email": "jane"}"#),
        )
        .await?;

        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body["messageError"].as_str())
            .is_equal_to(Some("email must be a valid email address"));

        Ok(())
    }

    #[tokio::test]
    async fn test_detail_unknown_customer() -> Result<(), BoxError> {
        let app = router(DomainLogic::new(Arc::new(MemoryDatabase::default())));

        let (status, body) = send(&app, "GET", "/api/v1/customer/detail?customerId=42", None).await?;

        assert_that!(status).is_equal_to(StatusCode::INTERNAL_SERVER_ERROR);
        assert_that!(body["code"].as_str()).is_equal_to(Some("5001"));
        assert_that!(body["messageError"].as_str()).is_equal_to(Some("customer not found"));

        Ok(())
    }
}
