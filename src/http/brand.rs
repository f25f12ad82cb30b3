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
    commands::brand::{BrandDetailRequest, CreateBrandRequest, ListBrandsRequest},
    domain::Brand,
    ports::database::DatabasePort,
};

use super::{
    format_date, json_body, query_params, required_id,
    response::{ApiError, ApiSuccess},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBrandBody {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    #[serde(rename = "brandId")]
    brand_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandBody {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_deleted: bool,
    pub created_date: String,
    pub modified_date: String,
}

impl From<Brand> for BrandBody {
    fn from(brand: Brand) -> Self {
        Self {
            id: brand.id,
            name: brand.name,
            description: brand.description,
            is_deleted: brand.is_deleted,
            created_date: format_date(&brand.created_date),
            modified_date: format_date(&brand.modified_date),
        }
    }
}

pub async fn create<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<CreateBrandBody>, JsonRejection>,
) -> Result<ApiSuccess<BrandBody>, ApiError> {
    let body = json_body(body)?;
    let brand = state
        .logic
        .oneshot(CreateBrandRequest {
            name: body.name,
            description: body.description,
        })
        .await?;

    Ok(ApiSuccess(brand.into()))
}

pub async fn list<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
) -> Result<ApiSuccess<Vec<BrandBody>>, ApiError> {
    let brands = state.logic.oneshot(ListBrandsRequest).await?;

    Ok(ApiSuccess(brands.into_iter().map(Into::into).collect()))
}

pub async fn detail<D: DatabasePort + 'static>(
    State(state): State<AppState<D>>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<ApiSuccess<BrandBody>, ApiError> {
    let query = query_params(query)?;
    let brand_id = required_id("brandId", query.brand_id)?;
    let brand = state.logic.oneshot(BrandDetailRequest { brand_id }).await?;

    Ok(ApiSuccess(brand.into()))
}
