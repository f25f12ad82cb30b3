use chrono::{DateTime, Utc};

pub mod redemption;
pub mod validation;

/// A brand publishing vouchers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_deleted: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// A customer accruing loyalty points
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customer {
    /// Store-assigned identifier
    pub id: i64,
    pub full_name: String,
    /// Unique across all customers
    pub email: String,
    /// Current point balance
    ///
    /// The service never persists a negative balance.
    pub points: i64,
    pub is_deleted: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// A voucher that customers can redeem against their points
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voucher {
    pub id: i64,
    /// Brand publishing this voucher
    pub brand_id: i64,
    pub name: String,
    pub description: String,
    /// Price of a single unit, in loyalty points
    pub cost_in_point: i64,
    /// Human-facing code handed to the customer
    pub voucher_code: String,
    pub is_deleted: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// Status code of a redemption transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Completed,
    /// Status code written by another system
    Other(i32),
}

impl TransactionStatus {
    pub fn code(&self) -> i32 {
        match self {
            TransactionStatus::Completed => 1,
            TransactionStatus::Other(code) => *code,
        }
    }
}

impl From<i32> for TransactionStatus {
    fn from(code: i32) -> Self {
        match code {
            1 => TransactionStatus::Completed,
            code => TransactionStatus::Other(code),
        }
    }
}

/// A persisted point redemption
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub customer_id: i64,
    pub voucher_id: i64,
    pub quantity: i64,
    /// Unit cost of the voucher at the time of the redemption
    ///
    /// Later changes to the voucher price do not affect this value.
    pub voucher_cost_in_point: i64,
    /// `quantity * voucher_cost_in_point`
    pub total: i64,
    pub status: TransactionStatus,
    pub redeem_date: DateTime<Utc>,
    pub is_deleted: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// Redemption ready to be recorded by the store
///
/// `remaining_points` is the balance the customer is left with once the transaction is stored,
/// and `expected_points` the balance it was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRedemption {
    pub customer_id: i64,
    pub voucher_id: i64,
    pub quantity: i64,
    pub voucher_cost_in_point: i64,
    pub total: i64,
    pub status: TransactionStatus,
    pub redeem_date: DateTime<Utc>,
    pub expected_points: i64,
    pub remaining_points: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBrand {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomer {
    pub full_name: String,
    pub email: String,
    pub points: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVoucher {
    pub brand_id: i64,
    pub name: String,
    pub description: String,
    pub cost_in_point: i64,
    pub voucher_code: String,
}
