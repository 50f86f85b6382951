//! SQLite-backed data-access operations for the harness to measure.
//!
//! The same eight operations run through one of two access paths
//! ([`StatementMode`]) so their costs can be compared side by side.
//! Everything here is setup and glue; the harness only sees
//! [`Operation`](crate::operation::Operation) trait objects.

pub mod fixtures;
pub mod models;
pub mod sql;
mod sqlite_alloc;

use std::path::Path;
use std::rc::Rc;

use clap::ValueEnum;
use rusqlite::{Connection, OptionalExtension, Params, Row, Statement};
use thiserror::Error;
use tracing::debug;

use crate::operation::Operation;

pub use fixtures::{seed, FixtureConfig};
pub use sqlite_alloc::track_sqlite_allocations;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The fixture tables hold no row to point the operations at.
    #[error("no {0} found to benchmark against; seed the database first")]
    MissingReference(&'static str),

    /// Seeding was pointed at a database that already holds fixture rows.
    #[error("database already holds {table} rows; seed only into an empty database")]
    NotEmpty { table: &'static str },

    #[error("sqlite allocator hook rejected (code {0}); install it before opening any connection")]
    AllocatorHook(std::ffi::c_int),
}

/// How operations turn SQL text into statements.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum StatementMode {
    /// Parse and plan every statement on every call.
    #[default]
    Direct,
    /// Reuse statements from the connection's prepared-statement cache.
    Cached,
}

impl StatementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementMode::Direct => "direct",
            StatementMode::Cached => "cached",
        }
    }

    fn execute<P: Params>(self, conn: &Connection, sql: &str, params: P) -> rusqlite::Result<usize> {
        match self {
            StatementMode::Direct => conn.execute(sql, params),
            StatementMode::Cached => conn.prepare_cached(sql)?.execute(params),
        }
    }

    fn query_row<T, P, F>(self, conn: &Connection, sql: &str, params: P, f: F) -> rusqlite::Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        match self {
            StatementMode::Direct => conn.query_row(sql, params, f),
            StatementMode::Cached => conn.prepare_cached(sql)?.query_row(params, f),
        }
    }

    fn query_map<T, P, F>(self, conn: &Connection, sql: &str, params: P, f: F) -> rusqlite::Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        fn collect<T, P, F>(stmt: &mut Statement<'_>, params: P, f: F) -> rusqlite::Result<Vec<T>>
        where
            P: Params,
            F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
        {
            stmt.query_map(params, f)?.collect()
        }

        match self {
            StatementMode::Direct => {
                let mut stmt = conn.prepare(sql)?;
                collect(&mut stmt, params, f)
            }
            StatementMode::Cached => {
                let mut stmt = conn.prepare_cached(sql)?;
                collect(&mut stmt, params, f)
            }
        }
    }
}

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    price REAL NOT NULL,
    stock INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    total REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS order_products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    quantity INTEGER NOT NULL,
    price REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);
CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id);
CREATE INDEX IF NOT EXISTS idx_order_products_order ON order_products(order_id);
CREATE INDEX IF NOT EXISTS idx_order_products_product ON order_products(product_id);
"#;

const FIXTURE_TABLES: [&str; 4] = ["customers", "products", "orders", "order_products"];

/// Shared connection handle plus the statement mode its operations use.
#[derive(Clone, Debug)]
pub struct Database {
    conn: Rc<Connection>,
    mode: StatementMode,
}

impl Database {
    pub fn open_in_memory(mode: StatementMode) -> Result<Self, WorkloadError> {
        Self::from_connection(Connection::open_in_memory()?, mode)
    }

    pub fn open(path: &Path, mode: StatementMode) -> Result<Self, WorkloadError> {
        Self::from_connection(Connection::open(path)?, mode)
    }

    fn from_connection(conn: Connection, mode: StatementMode) -> Result<Self, WorkloadError> {
        conn.execute_batch(SCHEMA)?;
        debug!(mode = mode.as_str(), "opened benchmark database");
        Ok(Self {
            conn: Rc::new(conn),
            mode,
        })
    }

    pub fn mode(&self) -> StatementMode {
        self.mode
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// First fixture table that holds any row, if there is one.
    pub fn first_populated_table(&self) -> Result<Option<&'static str>, WorkloadError> {
        for table in FIXTURE_TABLES {
            let populated: bool = self.conn.query_row(
                &format!("SELECT EXISTS (SELECT 1 FROM {table})"),
                [],
                |row| row.get(0),
            )?;
            if populated {
                return Ok(Some(table));
            }
        }
        Ok(None)
    }

    /// True when none of the fixture tables holds a row.
    pub fn is_empty(&self) -> Result<bool, WorkloadError> {
        Ok(self.first_populated_table()?.is_none())
    }
}

/// Row ids the single-row operations target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceIds {
    pub customer_id: i64,
    pub product_id: i64,
    pub order_id: i64,
}

impl ReferenceIds {
    /// First customer, product and order in the database.
    pub fn load(db: &Database) -> Result<Self, WorkloadError> {
        let first = |table: &'static str| -> Result<i64, WorkloadError> {
            db.connection()
                .query_row(&format!("SELECT id FROM {table} ORDER BY id LIMIT 1"), [], |row| {
                    row.get(0)
                })
                .optional()?
                .ok_or(WorkloadError::MissingReference(table))
        };

        Ok(Self {
            customer_id: first("customers")?,
            product_id: first("products")?,
            order_id: first("orders")?,
        })
    }
}

/// The full operation list, in benchmark order.
///
/// `Create Product` runs first and `Delete Product by Name` last so the
/// delete finds the rows the create inserted under the same iteration keys.
pub fn suite(db: &Database, ids: ReferenceIds) -> Vec<Box<dyn Operation>> {
    vec![
        Box::new(sql::CreateProduct::new(db.clone())),
        Box::new(sql::GetCustomerById::new(db.clone(), ids.customer_id)),
        Box::new(sql::UpdateProductPriceById::new(db.clone(), ids.product_id, 89.99)),
        Box::new(sql::CreateOrderWithProducts::new(
            db.clone(),
            ids.customer_id,
            ids.product_id,
        )),
        Box::new(sql::GetCustomerStatsById::new(db.clone(), ids.customer_id)),
        Box::new(sql::GetProductSalesByLimit::new(db.clone(), 10)),
        Box::new(sql::GetOrderFullDetailsById::new(db.clone(), ids.order_id)),
        Box::new(sql::DeleteProductByName::new(db.clone())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_ids_missing_on_empty_db() {
        let db = Database::open_in_memory(StatementMode::Direct).unwrap();
        let err = ReferenceIds::load(&db).unwrap_err();
        assert!(matches!(err, WorkloadError::MissingReference("customers")));
    }

    #[test]
    fn test_is_empty_tracks_rows() {
        let db = Database::open_in_memory(StatementMode::Direct).unwrap();
        assert!(db.is_empty().unwrap());
        db.connection()
            .execute(
                "INSERT INTO products (name, price, stock) VALUES ('Lone Product', 1.0, 1)",
                [],
            )
            .unwrap();
        assert!(!db.is_empty().unwrap());
        assert_eq!(db.first_populated_table().unwrap(), Some("products"));
    }

    #[test]
    fn test_query_map_both_modes() {
        for mode in [StatementMode::Direct, StatementMode::Cached] {
            let db = Database::open_in_memory(mode).unwrap();
            db.connection()
                .execute_batch(
                    "INSERT INTO products (name, price, stock) VALUES ('A', 1.5, 3), ('B', 2.5, 4);",
                )
                .unwrap();
            let sql = "SELECT name FROM products WHERE price > ?1 ORDER BY id";
            // Second pass hits the statement cache in cached mode.
            for _ in 0..2 {
                let names: Vec<String> = mode
                    .query_map(db.connection(), sql, [1.0], |row| row.get(0))
                    .unwrap();
                assert_eq!(names, vec!["A".to_string(), "B".to_string()], "{mode:?}");
            }
        }
    }

    #[test]
    fn test_suite_order_and_names() {
        let db = Database::open_in_memory(StatementMode::Cached).unwrap();
        let ids = ReferenceIds {
            customer_id: 1,
            product_id: 1,
            order_id: 1,
        };
        let names: Vec<String> = suite(&db, ids).iter().map(|op| op.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Create Product",
                "Get Customer by ID",
                "Update Product Price by ID",
                "Create Order with Products By Customer ID (Transaction)",
                "Get Customer Stats by ID (Aggregation)",
                "Get Product Sales by Limit (Complex Join)",
                "Get Order Full Details by ID (Nested Preload)",
                "Delete Product by Name",
            ]
        );
    }

    #[test]
    fn test_schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.sqlite");
        Database::open(&path, StatementMode::Direct).unwrap();
        let db = Database::open(&path, StatementMode::Direct).unwrap();
        let tables: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }
}
