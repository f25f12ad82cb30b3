use std::task::{Context, Poll};

use crate::{
    domain::{
        validation::{max_length, require_positive, require_text, ValidationError},
        Brand, NewBrand,
    },
    ports::database::DatabasePort,
};
use tower::Service;
use tracing::info;

use super::{CommandFuture, DomainLogic, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateBrandRequest {
    pub name: String,
    pub description: String,
}

impl CreateBrandRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        max_length("description", &self.description)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListBrandsRequest;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrandDetailRequest {
    pub brand_id: i64,
}

impl<D> Service<CreateBrandRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Brand;
    type Error = Error;
    type Future = CommandFuture<Brand>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CreateBrandRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            req.validate()?;
            let brand = database
                .create_brand(NewBrand {
                    name: req.name,
                    description: req.description,
                })
                .await?;
            info!(brand_id = brand.id, "brand created");

            Ok(brand)
        })
    }
}

impl<D> Service<ListBrandsRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Vec<Brand>;
    type Error = Error;
    type Future = CommandFuture<Vec<Brand>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ListBrandsRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move { Ok(database.list_brands().await?) })
    }
}

impl<D> Service<BrandDetailRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Brand;
    type Error = Error;
    type Future = CommandFuture<Brand>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: BrandDetailRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            require_positive("brandId", req.brand_id)?;
            Ok(database.find_brand(req.brand_id).await?)
        })
    }
}
