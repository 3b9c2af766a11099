use thiserror::Error;

use crate::{
    db_types::{Order, OrderId, OrderItem},
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderQueryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderQueryError {
    fn from(e: sqlx::Error) -> Self {
        OrderQueryError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the read side for orders.
///
/// The [`MarketplaceDatabase`](super::MarketplaceDatabase) trait handles the machinery of reserving inventory,
/// settling payments and moving orders through fulfillment. `OrderManagement` provides methods for querying the
/// orders those flows produce.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given public order id, or `None` if it does not exist.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;

    /// Fetches the line items belonging to the order with the given internal row id.
    async fn fetch_order_items(&self, order_row_id: i64) -> Result<Vec<OrderItem>, OrderQueryError>;

    /// Searches orders according to the given filter, most recent first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError>;
}
