use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::traits::{OrderFlowError, ReservationResult},
    db_types::{NewProduct, Product},
};

pub async fn fetch_product_by_id(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, OrderFlowError> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, seller_id, name, price, listing_type, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(&product.id)
    .bind(&product.seller_id)
    .bind(&product.name)
    .bind(product.price.value())
    .bind(product.listing_type.to_string())
    .bind(&product.category)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

/// The reservation lock. Exactly one caller can move a product `Available -> Pending`; the affected-row count is
/// the verdict. There is no read-then-write window here, so two racing orders can never both reserve the product.
pub async fn try_reserve_product(
    product_id: &str,
    conn: &mut SqliteConnection,
) -> Result<ReservationResult, OrderFlowError> {
    let result = sqlx::query(
        "UPDATE products SET status = 'Pending', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Available'",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 1 {
        debug!("📦️ Product {product_id} reserved");
        Ok(ReservationResult::Reserved)
    } else {
        Ok(ReservationResult::Unavailable)
    }
}

/// Returns a reserved product to the pool. Releasing a product that is not `Pending` is a no-op, so compensation
/// rollbacks and replayed cancellations are harmless.
pub async fn release_product(product_id: &str, conn: &mut SqliteConnection) -> Result<(), OrderFlowError> {
    let result = sqlx::query(
        "UPDATE products SET status = 'Available', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Pending'",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 1 {
        debug!("📦️ Product {product_id} released back to the pool");
    }
    Ok(())
}

/// Finalizes a reservation when the order containing it is delivered. Consuming an already-sold product is a no-op.
pub async fn consume_product(product_id: &str, conn: &mut SqliteConnection) -> Result<(), OrderFlowError> {
    let result = sqlx::query(
        "UPDATE products SET status = 'Sold', is_ordered = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND \
         status = 'Pending'",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 1 {
        debug!("📦️ Product {product_id} marked as sold");
    }
    Ok(())
}
