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
    commands::{
        redeem_points::RedeemPointsRequest,
        transaction::{ListTransactionsRequest, TransactionDetailRequest},
    },
    domain::Transaction,
    ports::database::DatabasePort,
};

use super::{
    format_date, json_body, optional_id, query_params, required_id,
    response::{ApiError, ApiSuccess},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedemptionBody {
    pub customer_id: i64,
    pub voucher_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "customerId")]
    customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    #[serde(rename = "transactionId")]
    transaction_id: Option<String>,
}

/// Transaction as returned right after a redemption
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionResult {
    pub id: i64,
    pub customer_id: i64,
    pub voucher_id: i64,
    pub quantity: i64,
    pub voucher_cost_in_point: i64,
    pub total: i64,
    pub status: i32,
    pub redeem_date: String,
}

impl From<&Transaction> for RedemptionResult {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            customer_id: transaction.customer_id,
            voucher_id: transaction.voucher_id,
            quantity: transaction.quantity,
            voucher_cost_in_point: transaction.voucher_cost_in_point,
            total: transaction.total,
            status: transaction.status.code(),
            redeem_date: format_date(&transaction.redeem_date),
        }
    }
}

/// Transaction as returned by list and detail
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    #[serde(flatten)]
    pub redemption: RedemptionResult,
    pub is_deleted: bool,
    pub created_date: String,
    pub modified_date: String,
}

impl From<Transaction> for TransactionBody {
    fn from(transaction: Transaction) -> Self {
        Self {
            redemption: RedemptionResult::from(&transaction),
            is_deleted: transaction.is_deleted,
            created_date: format_date(&transaction.created_date),
            modified_date: format_date(&transaction.modified_date),
        }
    }
}

pub async fn redeem<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<RedemptionBody>, JsonRejection>,
) -> Result<ApiSuccess<RedemptionResult>, ApiError> {
    let body = json_body(body)?;
    let transaction = state
        .logic
        .oneshot(RedeemPointsRequest {
            customer_id: body.customer_id,
            voucher_id: body.voucher_id,
            quantity: body.quantity,
        })
        .await?;

    Ok(ApiSuccess(RedemptionResult::from(&transaction)))
}

pub async fn list<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ApiSuccess<Vec<TransactionBody>>, ApiError> {
    let query = query_params(query)?;
    let customer_id = optional_id("customerId", query.customer_id)?;
    let transactions = state
        .logic
        .oneshot(ListTransactionsRequest { customer_id })
        .await?;

    Ok(ApiSuccess(transactions.into_iter().map(Into::into).collect()))
}

pub async fn detail<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<ApiSuccess<TransactionBody>, ApiError> {
    let query = query_params(query)?;
    let transaction_id = required_id("transactionId", query.transaction_id)?;
    let transaction = state
        .logic
        .oneshot(TransactionDetailRequest { transaction_id })
        .await?;

    Ok(ApiSuccess(transaction.into()))
}

#[cfg(test)]
mod tests {
    use crate::{
        adapters::database::memory::MemoryDatabase,
        commands::DomainLogic,
        http::{router, tests::send},
    };
    use axum::{http::StatusCode, Router};
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::BoxError;

    /// Router with one customer holding `points` and one voucher costing 100
    async fn seeded_app(points: i64) -> Result<(Router, i64, i64), BoxError> {
        let app = router(DomainLogic::new(Arc::new(MemoryDatabase::default())));

        let (_, body) = send(&app, "POST", "/api/v1/brand/create", Some(r#"{"name": "Acme"}"#)).await?;
        let brand_id = body["result"]["id"].as_i64().unwrap_or_default();

        let payload = format!(
            r#"{{"brandId": {brand_id}, "name": "Coffee", "costInPoint": 100, "voucherCode": "COFFEE-1"}}"#
        );
        let (_, body) = send(&app, "POST", "/api/v1/voucher/create", Some(&payload)).await?;
        let voucher_id = body["result"]["id"].as_i64().unwrap_or_default();

        let payload = format!(
            r#"{{"fullName": "Jane Doe", "email": "jane@example.com", "points": {points}}}"#
        );
        let (_, body) = send(&app, "POST", "/api/v1/customer/create", Some(&payload)).await?;
        let customer_id = body["result"]["id"].as_i64().unwrap_or_default();

        Ok((app, customer_id, voucher_id))
    }

    #[tokio::test]
    async fn test_redemption_success() -> Result<(), BoxError> {
        let (app, customer_id, voucher_id) = seeded_app(1000).await?;

        let payload = format!(
            r#"{{"customerId": {customer_id}, "voucherId": {voucher_id}, "quantity": 2}}"#
        );
        let (status, body) =
            send(&app, "POST", "/api/v1/transaction/redemption", Some(&payload)).await?;

        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["codeSystem"].as_str()).is_equal_to(Some("CVS"));
        assert_that!(body["code"].as_str()).is_equal_to(Some("00"));
        assert_that!(body["message"].as_str()).is_equal_to(Some("success"));
        assert_that!(body["result"]["total"].as_i64()).is_equal_to(Some(200));
        assert_that!(body["result"]["status"].as_i64()).is_equal_to(Some(1));
        let transaction_id = body["result"]["id"].as_i64().unwrap_or_default();

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/v1/customer/detail?customerId={customer_id}"),
            None,
        )
        .await?;
        assert_that!(body["result"]["points"].as_i64()).is_equal_to(Some(800));

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/transaction/detail?transactionId={transaction_id}"),
            None,
        )
        .await?;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["result"]["voucherCostInPoint"].as_i64()).is_equal_to(Some(100));
        assert_that!(body["result"]["isDeleted"].as_bool()).is_equal_to(Some(false));

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/v1/transaction/list?customerId={customer_id}"),
            None,
        )
        .await?;
        assert_that!(body["result"].as_array().map(Vec::len)).is_equal_to(Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn test_redemption_not_enough_points() -> Result<(), BoxError> {
        let (app, customer_id, voucher_id) = seeded_app(50).await?;

        let payload = format!(
            r#"{{"customerId": {customer_id}, "voucherId": {voucher_id}, "quantity": 1}}"#
        );
        let (status, body) =
            send(&app, "POST", "/api/v1/transaction/redemption", Some(&payload)).await?;

        assert_that!(status).is_equal_to(StatusCode::INTERNAL_SERVER_ERROR);
        assert_that!(body["code"].as_str()).is_equal_to(Some("5001"));
        assert_that!(body["messageError"].as_str()).is_equal_to(Some("not enough points to redeem"));
        assert_that!(body["result"].as_str()).is_equal_to(Some(""));

        let (_, body) = send(&app, "GET", "/api/v1/transaction/list", None).await?;
        assert_that!(body["result"].as_array().map(Vec::len)).is_equal_to(Some(0));

        Ok(())
    }

    #[rstest]
    #[case(r#"{"voucherId": 1, "quantity": 1}"#, "customerId is required")]
    #[case(r#"{"customerId": 1, "voucherId": 1, "quantity": 0}"#, "quantity is required")]
    #[case(r#"{"customerId": "#, "Invalid")]
    #[case(r#"{"customerId": "one", "voucherId": 1, "quantity": 1}"#, "Invalid")]
    #[tokio::test]
    async fn test_redemption_bad_request(
        #[case] payload: &str,
        #[case] message: &str,
    ) -> Result<(), BoxError> {
        let (app, _, _) = seeded_app(1000).await?;

        let (status, body) =
            send(&app, "POST", "/api/v1/transaction/redemption", Some(payload)).await?;

        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body["code"].as_str()).is_equal_to(Some("4001"));
        assert_that!(body["messageError"].as_str()).is_equal_to(Some(message));

        Ok(())
    }

    #[tokio::test]
    async fn test_redemption_quantity_overflow() -> Result<(), BoxError> {
        let (app, customer_id, voucher_id) = seeded_app(50).await?;

        // 100 * quantity wraps around to -16 in unchecked i64 arithmetic
        let payload = format!(
            r#"{{"customerId": {customer_id}, "voucherId": {voucher_id}, "quantity": 184467440737095516}}"#
        );
        let (status, body) =
            send(&app, "POST", "/api/v1/transaction/redemption", Some(&payload)).await?;

        assert_that!(status).is_equal_to(StatusCode::INTERNAL_SERVER_ERROR);
        assert_that!(body["messageError"].as_str()).is_equal_to(Some("not enough points to redeem"));

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/v1/customer/detail?customerId={customer_id}"),
            None,
        )
        .await?;
        assert_that!(body["result"]["points"].as_i64()).is_equal_to(Some(50));

        let (_, body) = send(&app, "GET", "/api/v1/transaction/list", None).await?;
        assert_that!(body["result"].as_array().map(Vec::len)).is_equal_to(Some(0));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_repeated_customer_filter() -> Result<(), BoxError> {
        let (app, _, _) = seeded_app(1000).await?;

        let (status, body) =
            send(&app, "GET", "/api/v1/transaction/list?customerId=1&customerId=2", None).await?;

        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body["codeSystem"].as_str()).is_equal_to(Some("CVS"));
        assert_that!(body["code"].as_str()).is_equal_to(Some("4001"));
        assert_that!(body["messageError"].as_str()).is_equal_to(Some("Invalid"));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_bad_customer_filter() -> Result<(), BoxError> {
        let (app, _, _) = seeded_app(1000).await?;

        let (status, body) = send(&app, "GET", "/api/v1/transaction/list?customerId=x", None).await?;

        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body["messageError"].as_str()).is_equal_to(Some("customerId invalid format"));

        Ok(())
    }
}
