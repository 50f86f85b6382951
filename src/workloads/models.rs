//! Row types the workloads scan query results into.

#[derive(Debug, Clone, Default)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub date: String,
    pub total: f64,
    pub products: Vec<OrderProduct>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct OrderProduct {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product: Product,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerStats {
    pub total_orders: i64,
    pub total_spent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductSales {
    pub product_id: i64,
    pub product_name: String,
    pub total_sales: i64,
    pub revenue: f64,
}
