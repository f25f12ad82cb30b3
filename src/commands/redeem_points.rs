use std::task::{Context, Poll};

use crate::{
    domain::{
        redemption::{can_redeem, compute_total, remaining_balance},
        validation::{require_positive, ValidationError},
        Customer, NewRedemption, Transaction, TransactionStatus, Voucher,
    },
    ports::database::{self, DatabasePort, Entity},
};
use chrono::Utc;
use tower::Service;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{CommandFuture, DomainLogic, Error};

/// Number of times a redemption is computed and submitted before giving up on a balance that
/// keeps moving
const MAX_ATTEMPTS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedeemPointsRequest {
    pub customer_id: i64,
    pub voucher_id: i64,
    pub quantity: i64,
}

impl RedeemPointsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_positive("customerId", self.customer_id)?;
        require_positive("voucherId", self.voucher_id)?;
        require_positive("quantity", self.quantity)
    }
}

impl<D> Service<RedeemPointsRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Transaction;
    type Error = Error;
    type Future = CommandFuture<Transaction>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RedeemPointsRequest) -> Self::Future {
        let database = self.database.clone();
        let span = info_span!(
            "redeem_points",
            redemption_id = %Uuid::new_v4(),
            customer_id = req.customer_id,
            voucher_id = req.voucher_id,
            quantity = req.quantity,
        );

        Box::pin(
            async move {
                req.validate()?;

                for attempt in 1..=MAX_ATTEMPTS {
                    // Fetch necessary data
                    let customer = database.find_customer(req.customer_id).await.map_err(|err| {
                        debug!(error = %err, "customer lookup failed");
                        Error::NotFound(Entity::Customer)
                    })?;
                    let voucher = database.find_voucher(req.voucher_id).await.map_err(|err| {
                        debug!(error = %err, "voucher lookup failed");
                        Error::NotFound(Entity::Voucher)
                    })?;

                    // Store the transaction and debit the customer in one go
                    let redemption = prepare_redemption(&customer, &voucher, req.quantity)?;
                    match database.record_redemption(redemption).await {
                        Ok(transaction) => {
                            info!(
                                transaction_id = transaction.id,
                                total = transaction.total,
                                "points redeemed"
                            );
                            return Ok(transaction);
                        }
                        Err(database::Error::BalanceChanged { .. }) => {
                            warn!(attempt, "customer balance changed during redemption");
                        }
                        Err(err) => return Err(err.into()),
                    }
                }

                Err(Error::RedemptionConflict {
                    customer_id: req.customer_id,
                    attempts: MAX_ATTEMPTS,
                })
            }
            .instrument(span),
        )
    }
}

/// Price the redemption and check the customer can afford it
fn prepare_redemption(
    customer: &Customer,
    voucher: &Voucher,
    quantity: i64,
) -> Result<NewRedemption, Error> {
    // A total or balance beyond i64 can never be paid for
    let representable = voucher
        .cost_in_point
        .checked_mul(quantity)
        .and_then(|total| customer.points.checked_sub(total))
        .is_some();
    if !representable {
        return Err(Error::InsufficientPoints);
    }

    let total = compute_total(voucher.cost_in_point, quantity);
    if !can_redeem(total, customer.points) {
        return Err(Error::InsufficientPoints);
    }

    Ok(NewRedemption {
        customer_id: customer.id,
        voucher_id: voucher.id,
        quantity,
        voucher_cost_in_point: voucher.cost_in_point,
        total,
        status: TransactionStatus::Completed,
        redeem_date: Utc::now(),
        expected_points: customer.points,
        remaining_points: remaining_balance(total, customer.points),
    })
}
