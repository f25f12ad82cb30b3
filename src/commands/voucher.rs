use std::task::{Context, Poll};

use crate::{
    domain::{
        validation::{max_length, require_positive, require_text, ValidationError},
        NewVoucher, Voucher,
    },
    ports::database::{DatabasePort, Entity},
};
use tower::Service;
use tracing::{debug, info};

use super::{CommandFuture, DomainLogic, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateVoucherRequest {
    pub brand_id: i64,
    pub name: String,
    pub description: String,
    pub cost_in_point: i64,
    pub voucher_code: String,
}

impl CreateVoucherRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_positive("brandId", self.brand_id)?;
        require_text("name", &self.name)?;
        max_length("description", &self.description)?;
        require_positive("costInPoint", self.cost_in_point)?;
        require_text("voucherCode", &self.voucher_code)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListVouchersRequest {
    /// Only list the vouchers of this brand
    pub brand_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoucherDetailRequest {
    pub voucher_id: i64,
}

impl<D> Service<CreateVoucherRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Voucher;
    type Error = Error;
    type Future = CommandFuture<Voucher>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CreateVoucherRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            req.validate()?;

            // Vouchers can only be published by a live brand
            let brand = database.find_brand(req.brand_id).await.map_err(|err| {
                debug!(error = %err, "brand lookup failed");
                Error::NotFound(Entity::Brand)
            })?;

            let voucher = database
                .create_voucher(NewVoucher {
                    brand_id: brand.id,
                    name: req.name,
                    description: req.description,
                    cost_in_point: req.cost_in_point,
                    voucher_code: req.voucher_code,
                })
                .await?;
            info!(voucher_id = voucher.id, brand_id = brand.id, "voucher created");

            Ok(voucher)
        })
    }
}

impl<D> Service<ListVouchersRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Vec<Voucher>;
    type Error = Error;
    type Future = CommandFuture<Vec<Voucher>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListVouchersRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move { Ok(database.list_vouchers(req.brand_id).await?) })
    }
}

impl<D> Service<VoucherDetailRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Voucher;
    type Error = Error;
    type Future = CommandFuture<Voucher>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: VoucherDetailRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            require_positive("voucherId", req.voucher_id)?;
            Ok(database.find_voucher(req.voucher_id).await?)
        })
    }
}
