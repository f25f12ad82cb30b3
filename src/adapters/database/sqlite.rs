use crate::{
    domain::{
        Brand, Customer, NewBrand, NewCustomer, NewRedemption, NewVoucher, Transaction,
        TransactionStatus, Voucher,
    },
    ports::database::{DatabasePort, Entity, Error},
};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, error, info};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS brand (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_date TEXT NOT NULL,
        modified_date TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customer (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        points INTEGER NOT NULL DEFAULT 0,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_date TEXT NOT NULL,
        modified_date TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS voucher (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        brand_id INTEGER NOT NULL REFERENCES brand (id),
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        cost_in_point INTEGER NOT NULL,
        voucher_code TEXT NOT NULL,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_date TEXT NOT NULL,
        modified_date TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "transaction" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL REFERENCES customer (id),
        voucher_id INTEGER NOT NULL REFERENCES voucher (id),
        quantity INTEGER NOT NULL,
        voucher_cost_in_point INTEGER NOT NULL,
        total INTEGER NOT NULL,
        status INTEGER NOT NULL,
        redeem_date TEXT NOT NULL,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_date TEXT NOT NULL,
        modified_date TEXT NOT NULL
    )
    "#,
];

/// Relational store backed by SQLite
///
/// Every read filters on `is_deleted = 0`; there is no way to reach a soft-deleted row through
/// this adapter.
#[derive(Clone, Debug)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct BrandRow {
    id: i64,
    name: String,
    description: String,
    is_deleted: bool,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            is_deleted: row.is_deleted,
            created_date: row.created_date,
            modified_date: row.modified_date,
        }
    }
}

#[derive(FromRow)]
struct CustomerRow {
    id: i64,
    full_name: String,
    email: String,
    points: i64,
    is_deleted: bool,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            points: row.points,
            is_deleted: row.is_deleted,
            created_date: row.created_date,
            modified_date: row.modified_date,
        }
    }
}

#[derive(FromRow)]
struct VoucherRow {
    id: i64,
    brand_id: i64,
    name: String,
    description: String,
    cost_in_point: i64,
    voucher_code: String,
    is_deleted: bool,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<VoucherRow> for Voucher {
    fn from(row: VoucherRow) -> Self {
        Self {
            id: row.id,
            brand_id: row.brand_id,
            name: row.name,
            description: row.description,
            cost_in_point: row.cost_in_point,
            voucher_code: row.voucher_code,
            is_deleted: row.is_deleted,
            created_date: row.created_date,
            modified_date: row.modified_date,
        }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i64,
    customer_id: i64,
    voucher_id: i64,
    quantity: i64,
    voucher_cost_in_point: i64,
    total: i64,
    status: i32,
    redeem_date: DateTime<Utc>,
    is_deleted: bool,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            voucher_id: row.voucher_id,
            quantity: row.quantity,
            voucher_cost_in_point: row.voucher_cost_in_point,
            total: row.total,
            status: TransactionStatus::from(row.status),
            redeem_date: row.redeem_date,
            is_deleted: row.is_deleted,
            created_date: row.created_date,
            modified_date: row.modified_date,
        }
    }
}

impl SqliteDatabase {
    /// Open (creating it if needed) the database at `url` and make sure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.setup_schema().await?;
        info!(url, "sqlite database ready");

        Ok(database)
    }

    /// Private in-memory database
    ///
    /// An in-memory SQLite database lives as long as its connection, so the pool is pinned to
    /// a single connection that never expires.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.setup_schema().await?;

        Ok(database)
    }

    async fn setup_schema(&self) -> Result<(), Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Flag a row as deleted without removing it
    pub async fn soft_delete(&self, entity: Entity, id: i64) -> Result<(), Error> {
        let statement = match entity {
            Entity::Brand => "UPDATE brand SET is_deleted = 1, modified_date = ? WHERE id = ?",
            Entity::Customer => {
                "UPDATE customer SET is_deleted = 1, modified_date = ? WHERE id = ?"
            }
            Entity::Voucher => "UPDATE voucher SET is_deleted = 1, modified_date = ? WHERE id = ?",
            Entity::Transaction => {
                r#"UPDATE "transaction" SET is_deleted = 1, modified_date = ? WHERE id = ?"#
            }
        };
        let result = sqlx::query(statement)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound { entity, id });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DatabasePort for SqliteDatabase {
    async fn create_brand(&self, brand: NewBrand) -> Result<Brand, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO brand (name, description, created_date, modified_date) VALUES (?, ?, ?, ?)",
        )
        .bind(&brand.name)
        .bind(&brand.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Brand {
            id: result.last_insert_rowid(),
            name: brand.name,
            description: brand.description,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        })
    }

    async fn list_brands(&self) -> Result<Vec<Brand>, Error> {
        let rows = sqlx::query_as::<_, BrandRow>(
            "SELECT * FROM brand WHERE is_deleted = 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Brand::from).collect())
    }

    async fn find_brand(&self, brand_id: i64) -> Result<Brand, Error> {
        sqlx::query_as::<_, BrandRow>("SELECT * FROM brand WHERE id = ? AND is_deleted = 0")
            .bind(brand_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Brand::from)
            .ok_or(Error::NotFound {
                entity: Entity::Brand,
                id: brand_id,
            })
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO customer (full_name, email, points, created_date, modified_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(customer.points)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Duplicate { field: "email" }
            }
            err => err.into(),
        })?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            full_name: customer.full_name,
            email: customer.email,
            points: customer.points,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        })
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, Error> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT * FROM customer WHERE is_deleted = 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn find_customer(&self, customer_id: i64) -> Result<Customer, Error> {
        sqlx::query_as::<_, CustomerRow>("SELECT * FROM customer WHERE id = ? AND is_deleted = 0")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Customer::from)
            .ok_or(Error::NotFound {
                entity: Entity::Customer,
                id: customer_id,
            })
    }

    async fn update_customer_points(
        &self,
        customer_id: i64,
        points: i64,
    ) -> Result<Customer, Error> {
        let result = sqlx::query(
            "UPDATE customer SET points = ?, modified_date = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(points)
        .bind(Utc::now())
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                entity: Entity::Customer,
                id: customer_id,
            });
        }
        self.find_customer(customer_id).await
    }

    async fn create_voucher(&self, voucher: NewVoucher) -> Result<Voucher, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO voucher
                (brand_id, name, description, cost_in_point, voucher_code, created_date, modified_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(voucher.brand_id)
        .bind(&voucher.name)
        .bind(&voucher.description)
        .bind(voucher.cost_in_point)
        .bind(&voucher.voucher_code)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Voucher {
            id: result.last_insert_rowid(),
            brand_id: voucher.brand_id,
            name: voucher.name,
            description: voucher.description,
            cost_in_point: voucher.cost_in_point,
            voucher_code: voucher.voucher_code,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        })
    }

    async fn list_vouchers(&self, brand_id: Option<i64>) -> Result<Vec<Voucher>, Error> {
        let rows = sqlx::query_as::<_, VoucherRow>(
            r#"
            SELECT * FROM voucher
            WHERE is_deleted = 0 AND (?1 IS NULL OR brand_id = ?1)
            ORDER BY id
            "#,
        )
        .bind(brand_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Voucher::from).collect())
    }

    async fn find_voucher(&self, voucher_id: i64) -> Result<Voucher, Error> {
        sqlx::query_as::<_, VoucherRow>("SELECT * FROM voucher WHERE id = ? AND is_deleted = 0")
            .bind(voucher_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Voucher::from)
            .ok_or(Error::NotFound {
                entity: Entity::Voucher,
                id: voucher_id,
            })
    }

    async fn record_redemption(&self, redemption: NewRedemption) -> Result<Transaction, Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO "transaction"
                (customer_id, voucher_id, quantity, voucher_cost_in_point, total, status,
                 redeem_date, created_date, modified_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(redemption.customer_id)
        .bind(redemption.voucher_id)
        .bind(redemption.quantity)
        .bind(redemption.voucher_cost_in_point)
        .bind(redemption.total)
        .bind(redemption.status.code())
        .bind(redemption.redeem_date)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            error!(customer_id = redemption.customer_id, error = %err, "transaction insert failed");
            err
        })?;

        // Compare-and-swap on the balance the redemption was computed from
        let debited = sqlx::query(
            r#"
            UPDATE customer SET points = ?, modified_date = ?
            WHERE id = ? AND is_deleted = 0 AND points = ?
            "#,
        )
        .bind(redemption.remaining_points)
        .bind(now)
        .bind(redemption.customer_id)
        .bind(redemption.expected_points)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            error!(customer_id = redemption.customer_id, error = %err, "customer debit failed");
            err
        })?;

        if debited.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(
                customer_id = redemption.customer_id,
                "debit rejected, rolled back transaction insert"
            );
            // Tell a vanished customer apart from a moved balance
            self.find_customer(redemption.customer_id).await?;
            return Err(Error::BalanceChanged {
                customer_id: redemption.customer_id,
                expected_points: redemption.expected_points,
            });
        }

        tx.commit().await?;

        Ok(Transaction {
            id: inserted.last_insert_rowid(),
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
        })
    }

    async fn list_transactions(&self, customer_id: Option<i64>) -> Result<Vec<Transaction>, Error> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM "transaction"
            WHERE is_deleted = 0 AND (?1 IS NULL OR customer_id = ?1)
            ORDER BY id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn find_transaction(&self, transaction_id: i64) -> Result<Transaction, Error> {
        sqlx::query_as::<_, TransactionRow>(
            r#"SELECT * FROM "transaction" WHERE id = ? AND is_deleted = 0"#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Transaction::from)
        .ok_or(Error::NotFound {
            entity: Entity::Transaction,
            id: transaction_id,
        })
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Adapter(Box::new(err))
    }
}
