//! The eight benchmarked data-access operations, written as plain SQL.

use std::hint::black_box;

use rusqlite::params;

use super::models::{Customer, CustomerStats, Order, OrderProduct, Product, ProductSales};
use super::Database;
use crate::operation::{BoxError, Operation};

fn product_name(iteration: u64) -> String {
    format!("Product_{iteration}")
}

pub struct CreateProduct {
    db: Database,
}

impl CreateProduct {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Operation for CreateProduct {
    fn name(&self) -> &str {
        "Create Product"
    }

    fn execute(&mut self, iteration: u64) -> Result<(), BoxError> {
        self.db.mode.execute(
            &self.db.conn,
            "INSERT INTO products (name, description, price, stock) VALUES (?1, ?2, ?3, ?4)",
            params![product_name(iteration), "Test product", 99.99, 100],
        )?;
        Ok(())
    }
}

pub struct GetCustomerById {
    db: Database,
    id: i64,
}

impl GetCustomerById {
    pub fn new(db: Database, id: i64) -> Self {
        Self { db, id }
    }
}

impl Operation for GetCustomerById {
    fn name(&self) -> &str {
        "Get Customer by ID"
    }

    fn execute(&mut self, _iteration: u64) -> Result<(), BoxError> {
        let customer = self.db.mode.query_row(
            &self.db.conn,
            "SELECT id, name, email, created_at FROM customers WHERE id = ?1",
            params![self.id],
            |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )?;
        black_box(customer);
        Ok(())
    }
}

pub struct UpdateProductPriceById {
    db: Database,
    id: i64,
    price: f64,
}

impl UpdateProductPriceById {
    pub fn new(db: Database, id: i64, price: f64) -> Self {
        Self { db, id, price }
    }
}

impl Operation for UpdateProductPriceById {
    fn name(&self) -> &str {
        "Update Product Price by ID"
    }

    fn execute(&mut self, _iteration: u64) -> Result<(), BoxError> {
        self.db.mode.execute(
            &self.db.conn,
            "UPDATE products SET price = ?1 WHERE id = ?2",
            params![self.price, self.id],
        )?;
        Ok(())
    }
}

pub struct CreateOrderWithProducts {
    db: Database,
    customer_id: i64,
    product_id: i64,
}

impl CreateOrderWithProducts {
    pub fn new(db: Database, customer_id: i64, product_id: i64) -> Self {
        Self {
            db,
            customer_id,
            product_id,
        }
    }
}

impl Operation for CreateOrderWithProducts {
    fn name(&self) -> &str {
        "Create Order with Products By Customer ID (Transaction)"
    }

    fn execute(&mut self, _iteration: u64) -> Result<(), BoxError> {
        let mode = self.db.mode;
        // Rolled back on drop unless committed.
        let tx = self.db.conn.unchecked_transaction()?;

        let order_id: i64 = mode.query_row(
            &tx,
            "INSERT INTO orders (customer_id, total) VALUES (?1, ?2) RETURNING id",
            params![self.customer_id, 199.98],
            |row| row.get(0),
        )?;
        mode.execute(
            &tx,
            "INSERT INTO order_products (order_id, product_id, quantity, price) VALUES (?1, ?2, ?3, ?4)",
            params![order_id, self.product_id, 2, 99.99],
        )?;

        tx.commit()?;
        Ok(())
    }
}

pub struct GetCustomerStatsById {
    db: Database,
    customer_id: i64,
}

impl GetCustomerStatsById {
    pub fn new(db: Database, customer_id: i64) -> Self {
        Self { db, customer_id }
    }
}

impl Operation for GetCustomerStatsById {
    fn name(&self) -> &str {
        "Get Customer Stats by ID (Aggregation)"
    }

    fn execute(&mut self, _iteration: u64) -> Result<(), BoxError> {
        let stats = self.db.mode.query_row(
            &self.db.conn,
            "SELECT COUNT(*) AS total_orders, COALESCE(SUM(total), 0) AS total_spent \
             FROM orders WHERE customer_id = ?1",
            params![self.customer_id],
            |row| {
                Ok(CustomerStats {
                    total_orders: row.get(0)?,
                    total_spent: row.get(1)?,
                })
            },
        )?;
        black_box(stats);
        Ok(())
    }
}

pub struct GetProductSalesByLimit {
    db: Database,
    limit: i64,
}

impl GetProductSalesByLimit {
    pub fn new(db: Database, limit: i64) -> Self {
        Self { db, limit }
    }
}

impl Operation for GetProductSalesByLimit {
    fn name(&self) -> &str {
        "Get Product Sales by Limit (Complex Join)"
    }

    fn execute(&mut self, _iteration: u64) -> Result<(), BoxError> {
        let sales = self.db.mode.query_map(
            &self.db.conn,
            "SELECT op.product_id, p.name AS product_name, \
                    SUM(op.quantity) AS total_sales, \
                    SUM(op.price * op.quantity) AS revenue \
             FROM order_products op \
             JOIN products p ON p.id = op.product_id \
             GROUP BY op.product_id, p.name \
             ORDER BY revenue DESC \
             LIMIT ?1",
            params![self.limit],
            |row| {
                Ok(ProductSales {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    total_sales: row.get(2)?,
                    revenue: row.get(3)?,
                })
            },
        )?;
        black_box(sales);
        Ok(())
    }
}

pub struct GetOrderFullDetailsById {
    db: Database,
    order_id: i64,
}

impl GetOrderFullDetailsById {
    pub fn new(db: Database, order_id: i64) -> Self {
        Self { db, order_id }
    }
}

impl Operation for GetOrderFullDetailsById {
    fn name(&self) -> &str {
        "Get Order Full Details by ID (Nested Preload)"
    }

    fn execute(&mut self, _iteration: u64) -> Result<(), BoxError> {
        let mode = self.db.mode;
        let conn = &self.db.conn;

        let mut order = mode.query_row(
            conn,
            "SELECT id, customer_id, date, total, created_at FROM orders WHERE id = ?1",
            params![self.order_id],
            |row| {
                Ok(Order {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    date: row.get(2)?,
                    total: row.get(3)?,
                    products: Vec::new(),
                    created_at: row.get(4)?,
                })
            },
        )?;

        order.products = mode.query_map(
            conn,
            "SELECT op.id, op.order_id, op.product_id, op.quantity, op.price, \
                    p.name, p.description, p.price, p.stock, p.created_at \
             FROM order_products op \
             JOIN products p ON p.id = op.product_id \
             WHERE op.order_id = ?1",
            params![self.order_id],
            |row| {
                let product_id: i64 = row.get(2)?;
                Ok(OrderProduct {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    product_id,
                    quantity: row.get(3)?,
                    price: row.get(4)?,
                    product: Product {
                        id: product_id,
                        name: row.get(5)?,
                        description: row.get(6)?,
                        price: row.get(7)?,
                        stock: row.get(8)?,
                        created_at: row.get(9)?,
                    },
                })
            },
        )?;
        black_box(order);
        Ok(())
    }
}

pub struct DeleteProductByName {
    db: Database,
}

impl DeleteProductByName {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Operation for DeleteProductByName {
    fn name(&self) -> &str {
        "Delete Product by Name"
    }

    fn execute(&mut self, iteration: u64) -> Result<(), BoxError> {
        self.db.mode.execute(
            &self.db.conn,
            "DELETE FROM products WHERE name = ?1",
            params![product_name(iteration)],
        )?;
        Ok(())
    }
}
