use crate::{
    domain::{
        Brand, Customer, NewBrand, NewCustomer, NewRedemption, NewVoucher, Transaction, Voucher,
    },
    ports::database::{DatabasePort, Entity, Error},
};
use chrono::Utc;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

/// In-process store
///
/// All tables sit behind a single lock, so every operation, `record_redemption` included, is
/// atomic with respect to the others.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    brands: BTreeMap<i64, Brand>,
    customers: BTreeMap<i64, Customer>,
    vouchers: BTreeMap<i64, Voucher>,
    transactions: BTreeMap<i64, Transaction>,
}

/// Rows are never physically removed, so the highest key is also the last one handed out
fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

fn live<T: Clone>(
    table: &BTreeMap<i64, T>,
    id: i64,
    entity: Entity,
    is_deleted: impl Fn(&T) -> bool,
) -> Result<T, Error> {
    table
        .get(&id)
        .filter(|row| !is_deleted(row))
        .cloned()
        .ok_or(Error::NotFound { entity, id })
}

impl MemoryDatabase {
    /// Flag a row as deleted without removing it
    pub fn soft_delete(&self, entity: Entity, id: i64) -> Result<(), Error> {
        let mut tables = self.tables.lock()?;
        let now = Utc::now();
        let flagged = match entity {
            Entity::Brand => tables.brands.get_mut(&id).map(|row| {
                row.is_deleted = true;
                row.modified_date = now;
            }),
            Entity::Customer => tables.customers.get_mut(&id).map(|row| {
                row.is_deleted = true;
                row.modified_date = now;
            }),
            Entity::Voucher => tables.vouchers.get_mut(&id).map(|row| {
                row.is_deleted = true;
                row.modified_date = now;
            }),
            Entity::Transaction => tables.transactions.get_mut(&id).map(|row| {
                row.is_deleted = true;
                row.modified_date = now;
            }),
        };

        flagged.ok_or(Error::NotFound { entity, id })
    }
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn create_brand(&self, brand: NewBrand) -> Result<Brand, Error> {
        let mut tables = self.tables.lock()?;
        let now = Utc::now();
        let brand = Brand {
            id: next_id(&tables.brands),
            name: brand.name,
            description: brand.description,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        };
        tables.brands.insert(brand.id, brand.clone());

        Ok(brand)
    }

    async fn list_brands(&self) -> Result<Vec<Brand>, Error> {
        let tables = self.tables.lock()?;
        Ok(tables
            .brands
            .values()
            .filter(|brand| !brand.is_deleted)
            .cloned()
            .collect())
    }

    async fn find_brand(&self, brand_id: i64) -> Result<Brand, Error> {
        let tables = self.tables.lock()?;
        live(&tables.brands, brand_id, Entity::Brand, |row| row.is_deleted)
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, Error> {
        let mut tables = self.tables.lock()?;
        // The unique index covers soft-deleted rows too
        if tables
            .customers
            .values()
            .any(|existing| existing.email == customer.email)
        {
            return Err(Error::Duplicate { field: "email" });
        }

        let now = Utc::now();
        let customer = Customer {
            id: next_id(&tables.customers),
            full_name: customer.full_name,
            email: customer.email,
            points: customer.points,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        };
        tables.customers.insert(customer.id, customer.clone());

        Ok(customer)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, Error> {
        let tables = self.tables.lock()?;
        Ok(tables
            .customers
            .values()
            .filter(|customer| !customer.is_deleted)
            .cloned()
            .collect())
    }

    async fn find_customer(&self, customer_id: i64) -> Result<Customer, Error> {
        let tables = self.tables.lock()?;
        live(&tables.customers, customer_id, Entity::Customer, |row| {
            row.is_deleted
        })
    }

    async fn update_customer_points(
        &self,
        customer_id: i64,
        points: i64,
    ) -> Result<Customer, Error> {
        let mut tables = self.tables.lock()?;
        let customer = tables
            .customers
            .get_mut(&customer_id)
            .filter(|customer| !customer.is_deleted)
            .ok_or(Error::NotFound {
                entity: Entity::Customer,
                id: customer_id,
            })?;
        customer.points = points;
        customer.modified_date = Utc::now();

        Ok(customer.clone())
    }

    async fn create_voucher(&self, voucher: NewVoucher) -> Result<Voucher, Error> {
        let mut tables = self.tables.lock()?;
        let now = Utc::now();
        let voucher = Voucher {
            id: next_id(&tables.vouchers),
            brand_id: voucher.brand_id,
            name: voucher.name,
            description: voucher.description,
            cost_in_point: voucher.cost_in_point,
            voucher_code: voucher.voucher_code,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        };
        tables.vouchers.insert(voucher.id, voucher.clone());

        Ok(voucher)
    }

    async fn list_vouchers(&self, brand_id: Option<i64>) -> Result<Vec<Voucher>, Error> {
        let tables = self.tables.lock()?;
        Ok(tables
            .vouchers
            .values()
            .filter(|voucher| !voucher.is_deleted)
            .filter(|voucher| brand_id.map_or(true, |brand_id| voucher.brand_id == brand_id))
            .cloned()
            .collect())
    }

    async fn find_voucher(&self, voucher_id: i64) -> Result<Voucher, Error> {
        let tables = self.tables.lock()?;
        live(&tables.vouchers, voucher_id, Entity::Voucher, |row| {
            row.is_deleted
        })
    }

    async fn record_redemption(&self, redemption: NewRedemption) -> Result<Transaction, Error> {
        let mut tables = self.tables.lock()?;
        let Tables {
            customers,
            transactions,
            ..
        } = &mut *tables;

        let customer = customers
            .get_mut(&redemption.customer_id)
            .filter(|customer| !customer.is_deleted)
            .ok_or(Error::NotFound {
                entity: Entity::Customer,
                id: redemption.customer_id,
            })?;
        if customer.points != redemption.expected_points {
            return Err(Error::BalanceChanged {
                customer_id: customer.id,
                expected_points: redemption.expected_points,
            });
        }

        let now = Utc::now();
        let transaction = Transaction {
            id: next_id(transactions),
            customer_id: redemption.customer_id,
            voucher_id: redemption.voucher_id,
            quantity: redemption.quantity,
            voucher_cost_in_point: redemption.voucher_cost_in_point,
            total: redemption.total,
            status: redemption.status,
            redeem_date: redemption.redeem_date,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        };
        transactions.insert(transaction.id, transaction.clone());

        customer.points = redemption.remaining_points;
        customer.modified_date = now;

        Ok(transaction)
    }

    async fn list_transactions(&self, customer_id: Option<i64>) -> Result<Vec<Transaction>, Error> {
        let tables = self.tables.lock()?;
        Ok(tables
            .transactions
            .values()
            .filter(|transaction| !transaction.is_deleted)
            .filter(|transaction| {
                customer_id.map_or(true, |customer_id| transaction.customer_id == customer_id)
            })
            .cloned()
            .collect())
    }

    async fn find_transaction(&self, transaction_id: i64) -> Result<Transaction, Error> {
        let tables = self.tables.lock()?;
        live(
            &tables.transactions,
            transaction_id,
            Entity::Transaction,
            |row| row.is_deleted,
        )
    }
}

/// Tables left behind by a writer that panicked mid-operation
#[derive(Debug, thiserror::Error)]
#[error("memory tables poisoned: {0}")]
pub struct PoisonedTables(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(PoisonedTables(err.to_string())))
    }
}
