use std::fmt;

use crate::domain::{
    Brand, Customer, NewBrand, NewCustomer, NewRedemption, NewVoucher, Transaction, Voucher,
};

/// Storage for brands, customers, vouchers and redemption transactions
///
/// Soft-deleted rows are invisible through this port: every `find_*` returns
/// [`Error::NotFound`] for them and every `list_*` leaves them out.
#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort: Send + Sync {
    async fn create_brand(&self, brand: NewBrand) -> Result<Brand, Error>;
    async fn list_brands(&self) -> Result<Vec<Brand>, Error>;
    async fn find_brand(&self, brand_id: i64) -> Result<Brand, Error>;

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, Error>;
    async fn list_customers(&self) -> Result<Vec<Customer>, Error>;
    async fn find_customer(&self, customer_id: i64) -> Result<Customer, Error>;
    async fn update_customer_points(&self, customer_id: i64, points: i64)
        -> Result<Customer, Error>;

    async fn create_voucher(&self, voucher: NewVoucher) -> Result<Voucher, Error>;
    async fn list_vouchers(&self, brand_id: Option<i64>) -> Result<Vec<Voucher>, Error>;
    async fn find_voucher(&self, voucher_id: i64) -> Result<Voucher, Error>;

    /// Store a redemption transaction and debit the customer, atomically
    ///
    /// The debit only happens if the customer still holds `expected_points`. Otherwise nothing
    /// is written and [`Error::BalanceChanged`] is returned.
    async fn record_redemption(&self, redemption: NewRedemption) -> Result<Transaction, Error>;
    async fn list_transactions(&self, customer_id: Option<i64>)
        -> Result<Vec<Transaction>, Error>;
    async fn find_transaction(&self, transaction_id: i64) -> Result<Transaction, Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Brand,
    Customer,
    Voucher,
    Transaction,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Brand => "brand",
            Entity::Customer => "customer",
            Entity::Voucher => "voucher",
            Entity::Transaction => "transaction",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The row does not exist or is soft-deleted
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// A unique column already holds this value
    #[error("duplicate value for {field}")]
    Duplicate { field: &'static str },

    /// The customer balance moved since the redemption was computed
    #[error("balance of customer {customer_id} is no longer {expected_points}")]
    BalanceChanged {
        customer_id: i64,
        expected_points: i64,
    },

    /// The store itself failed
    ///
    /// Wraps whatever the backing store reports: a broken SQLite connection, a failed statement,
    /// a poisoned in-memory lock.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
