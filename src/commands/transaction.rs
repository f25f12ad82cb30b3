use std::task::{Context, Poll};

use crate::{
    domain::{validation::require_positive, Transaction},
    ports::database::DatabasePort,
};
use tower::Service;

use super::{CommandFuture, DomainLogic, Error};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListTransactionsRequest {
    /// Only list the transactions of this customer
    pub customer_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDetailRequest {
    pub transaction_id: i64,
}

impl<D> Service<ListTransactionsRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Vec<Transaction>;
    type Error = Error;
    type Future = CommandFuture<Vec<Transaction>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListTransactionsRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move { Ok(database.list_transactions(req.customer_id).await?) })
    }
}

impl<D> Service<TransactionDetailRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Transaction;
    type Error = Error;
    type Future = CommandFuture<Transaction>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: TransactionDetailRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            require_positive("transactionId", req.transaction_id)?;
            Ok(database.find_transaction(req.transaction_id).await?)
        })
    }
}
