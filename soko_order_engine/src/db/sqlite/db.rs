//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::db::traits`]
//! module.
use std::fmt::Debug;

use soko_common::Shillings;
use sqlx::SqlitePool;

use super::{carts, db_url, new_pool, orders, products, users};
use crate::{
    db::traits::{
        MarketplaceDatabase,
        OrderFlowError,
        OrderManagement,
        OrderQueryError,
        PaymentRequest,
        ReservationResult,
        SettlementUpdate,
        UserManagement,
    },
    db_types::{CartItem, NewOrder, NewProduct, Order, OrderId, OrderItem, OrderStatusType, Product, Role, User},
    order_objects::OrderQueryFilter,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the database URL from the `SOKO_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stores a new seller listing. Listings are created outside the order flow, but the reservation lock lives on
    /// the product row, so the engine owns the table.
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    /// Mirrors a user record from the upstream auth service.
    pub async fn upsert_user(&self, user_id: &str, role: Role) -> Result<User, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::upsert_user(user_id, role, &mut conn).await?;
        Ok(user)
    }

    /// Adds a product to the buyer's cart, bumping the counter if it is already there.
    pub async fn add_to_cart(&self, buyer_id: &str, product_id: &str) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        carts::add_to_cart(buyer_id, product_id, &mut conn).await?;
        Ok(())
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn try_reserve_product(&self, product_id: &str) -> Result<ReservationResult, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        products::try_reserve_product(product_id, &mut conn).await
    }

    async fn release_product(&self, product_id: &str) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        products::release_product(product_id, &mut conn).await
    }

    async fn consume_product(&self, product_id: &str) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        products::consume_product(product_id, &mut conn).await
    }

    async fn cart_for_buyer(&self, buyer_id: &str) -> Result<Vec<CartItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(buyer_id, &mut conn).await?;
        Ok(items)
    }

    async fn clear_cart(&self, buyer_id: &str) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_cart(buyer_id, &mut conn).await?;
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_checkout_ref(&self, checkout_ref: &str) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_checkout_ref(checkout_ref, &mut conn).await?;
        Ok(order)
    }

    async fn attach_payment_request(
        &self,
        order_id: &OrderId,
        request: PaymentRequest,
    ) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::attach_payment_request(order_id, request, &mut conn).await
    }

    async fn try_settle_payment(&self, checkout_ref: &str, update: SettlementUpdate) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::try_settle_payment(checkout_ref, update, &mut conn).await
    }

    async fn try_advance_order_status(
        &self,
        order_id: &OrderId,
        from: &[OrderStatusType],
        to: OrderStatusType,
    ) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::try_advance_order_status(order_id, from, to, &mut conn).await
    }

    async fn credit_seller(&self, seller_id: &str, amount: Shillings) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        users::credit_seller(seller_id, amount, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_row_id: i64) -> Result<Vec<OrderItem>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_row_id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}

impl UserManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: &str) -> Result<Option<User>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }
}
