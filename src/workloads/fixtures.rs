//! Deterministic seed data for the benchmark schema.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rusqlite::params;
use tracing::info;

use super::{Database, ReferenceIds, WorkloadError};

/// How many rows to seed.
#[derive(Debug, Clone, Copy)]
pub struct FixtureConfig {
    pub customers: usize,
    pub products: usize,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            customers: 100,
            products: 200,
        }
    }
}

/// Populate an empty database: every customer gets one order with two
/// line items drawn from the product table.
///
/// Fails with [`WorkloadError::NotEmpty`] if any fixture table already has
/// rows, since seeded emails would collide with existing customers.
pub fn seed(
    db: &Database,
    config: &FixtureConfig,
    rng: &mut ChaCha8Rng,
) -> Result<ReferenceIds, WorkloadError> {
    if config.customers == 0 {
        return Err(WorkloadError::MissingReference("customers"));
    }
    if config.products == 0 {
        return Err(WorkloadError::MissingReference("products"));
    }
    if let Some(table) = db.first_populated_table()? {
        return Err(WorkloadError::NotEmpty { table });
    }

    let conn = db.connection();
    let tx = conn.unchecked_transaction()?;

    let mut product_ids = Vec::with_capacity(config.products);
    {
        let mut stmt = tx.prepare(
            "INSERT INTO products (name, description, price, stock) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for i in 0..config.products {
            let price = (rng.gen_range(100..50_000) as f64) / 100.0;
            let stock: i64 = rng.gen_range(0..1_000);
            stmt.execute(params![
                format!("Seed Product {i}"),
                format!("Seeded product #{i}"),
                price,
                stock
            ])?;
            product_ids.push(tx.last_insert_rowid());
        }
    }

    {
        let mut customer_stmt =
            tx.prepare("INSERT INTO customers (name, email) VALUES (?1, ?2)")?;
        let mut order_stmt = tx.prepare("INSERT INTO orders (customer_id, total) VALUES (?1, ?2)")?;
        let mut line_stmt = tx.prepare(
            "INSERT INTO order_products (order_id, product_id, quantity, price) VALUES (?1, ?2, ?3, ?4)",
        )?;

        for i in 0..config.customers {
            customer_stmt.execute(params![
                format!("Customer {i}"),
                format!("customer{i}@example.com")
            ])?;
            let customer_id = tx.last_insert_rowid();

            let lines: Vec<(i64, i64, f64)> = (0..2)
                .map(|_| {
                    let product_id = product_ids[rng.gen_range(0..product_ids.len())];
                    let quantity: i64 = rng.gen_range(1..5);
                    let price = (rng.gen_range(100..50_000) as f64) / 100.0;
                    (product_id, quantity, price)
                })
                .collect();
            let total: f64 = lines.iter().map(|(_, q, p)| *q as f64 * p).sum();

            order_stmt.execute(params![customer_id, total])?;
            let order_id = tx.last_insert_rowid();
            for (product_id, quantity, price) in lines {
                line_stmt.execute(params![order_id, product_id, quantity, price])?;
            }
        }
    }

    tx.commit()?;
    info!(
        customers = config.customers,
        products = config.products,
        "seeded benchmark database"
    );

    ReferenceIds::load(db)
}
