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
    commands::voucher::{CreateVoucherRequest, ListVouchersRequest, VoucherDetailRequest},
    domain::Voucher,
    ports::database::DatabasePort,
};

use super::{
    format_date, json_body, optional_id, query_params, required_id,
    response::{ApiError, ApiSuccess},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateVoucherBody {
    pub brand_id: i64,
    pub name: String,
    pub description: String,
    pub cost_in_point: i64,
    pub voucher_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "brandId")]
    brand_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    #[serde(rename = "voucherId")]
    voucher_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherBody {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub description: String,
    pub cost_in_point: i64,
    pub voucher_code: String,
    pub is_deleted: bool,
    pub created_date: String,
    pub modified_date: String,
}

impl From<Voucher> for VoucherBody {
    fn from(voucher: Voucher) -> Self {
        Self {
            id: voucher.id,
            brand_id: voucher.brand_id,
            name: voucher.name,
            description: voucher.description,
            cost_in_point: voucher.cost_in_point,
            voucher_code: voucher.voucher_code,
            is_deleted: voucher.is_deleted,
            created_date: format_date(&voucher.created_date),
            modified_date: format_date(&voucher.modified_date),
        }
    }
}

pub async fn create<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<CreateVoucherBody>, JsonRejection>,
) -> Result<ApiSuccess<VoucherBody>, ApiError> {
    let body = json_body(body)?;
    let voucher = state
        .logic
        .oneshot(CreateVoucherRequest {
            brand_id: body.brand_id,
            name: body.name,
            description: body.description,
            cost_in_point: body.cost_in_point,
            voucher_code: body.voucher_code,
        })
        .await?;

    Ok(ApiSuccess(voucher.into()))
}

pub async fn list<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ApiSuccess<Vec<VoucherBody>>, ApiError> {
    let query = query_params(query)?;
    let brand_id = optional_id("brandId", query.brand_id)?;
    let vouchers = state.logic.oneshot(ListVouchersRequest { brand_id }).await?;

    Ok(ApiSuccess(vouchers.into_iter().map(Into::into).collect()))
}

pub async fn detail<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<ApiSuccess<VoucherBody>, ApiError> {
    let query = query_params(query)?;
    let voucher_id = required_id("voucherId", query.voucher_id)?;
    let voucher = state
        .logic
        .oneshot(VoucherDetailRequest { voucher_id })
        .await?;

    Ok(ApiSuccess(voucher.into()))
}
