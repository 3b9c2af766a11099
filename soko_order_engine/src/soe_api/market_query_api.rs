use log::trace;

use crate::{
    db::traits::{OrderManagement, OrderQueryError, UserManagement},
    db_types::{Order, OrderId, User},
    soe_api::order_objects::{OrderQueryFilter, OrderResult},
};

/// The read side of the marketplace: order lookups, order history searches, and user resolution.
#[derive(Debug, Clone)]
pub struct MarketQueryApi<B> {
    db: B,
}

impl<B> MarketQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MarketQueryApi<B>
where B: OrderManagement + UserManagement
{
    /// Fetches an order and its line items by public order id, or `None` if it does not exist.
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<OrderResult>, OrderQueryError> {
        let Some(order) = self.db.fetch_order_by_order_id(order_id).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(Some(OrderResult { order, items }))
    }

    /// Returns the buyer's order history, most recent first, with line items attached.
    pub async fn orders_for_buyer(&self, buyer_id: &str) -> Result<Vec<OrderResult>, OrderQueryError> {
        let filter = OrderQueryFilter::default().with_buyer_id(buyer_id.to_string());
        let orders = self.db.search_orders(filter).await?;
        trace!("Fetched {} order(s) for buyer {buyer_id}", orders.len());
        let mut results = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.db.fetch_order_items(order.id).await?;
            results.push(OrderResult { order, items });
        }
        Ok(results)
    }

    /// Searches orders according to the given filter, most recent first.
    pub async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError> {
        self.db.search_orders(filter).await
    }

    /// Fetches the user with the given id, or `None` if it does not exist.
    pub async fn fetch_user(&self, user_id: &str) -> Result<Option<User>, OrderQueryError> {
        self.db.fetch_user(user_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
