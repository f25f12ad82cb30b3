use std::{future::Future, pin::Pin, sync::Arc};

use crate::{
    domain::validation::ValidationError,
    ports::database::{self, Entity},
};

pub mod brand;
pub mod customer;
pub mod redeem_points;
pub mod transaction;
pub mod voucher;

/// Entry point for every operation of the service
///
/// Each request type gets its own [`tower::Service`] implementation, in the module named after
/// it. The store handle is shared between clones.
pub struct DomainLogic<D> {
    database: Arc<D>,
}

impl<D> DomainLogic<D> {
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }
}

impl<D> Clone for DomainLogic<D> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
        }
    }
}

pub type CommandFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A request field is missing or malformed
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A referenced row does not exist or is soft-deleted
    #[error("{0} not found")]
    NotFound(Entity),

    /// The customer balance would not stay above zero after the redemption
    #[error("not enough points to redeem")]
    InsufficientPoints,

    /// The customer balance kept changing under concurrent redemptions
    #[error("redemption for customer {customer_id} conflicted {attempts} times")]
    RedemptionConflict { customer_id: i64, attempts: usize },

    #[error("database port error: {0:?}")]
    Database(database::Error),
}

impl From<database::Error> for Error {
    fn from(err: database::Error) -> Self {
        match err {
            database::Error::NotFound { entity, .. } => Self::NotFound(entity),
            database::Error::Duplicate { field } => {
                Self::Validation(ValidationError(format!("{field} already exists")))
            }
            err => Self::Database(err),
        }
    }
}

/// Coarse classification of [`Error`], for callers mapping errors onto a wire protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    BusinessRule,
    System,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InsufficientPoints => ErrorKind::BusinessRule,
            Error::RedemptionConflict { .. } | Error::Database(_) => ErrorKind::System,
        }
    }
}
