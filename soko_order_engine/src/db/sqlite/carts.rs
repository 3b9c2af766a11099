use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::CartItem;

pub async fn fetch_cart_items(buyer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT product_id, quantity FROM cart_items WHERE buyer_id = $1 ORDER BY created_at")
        .bind(buyer_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Adds a product to the buyer's cart. Products are single-quantity, so adding the same product again bumps the
/// counter on the existing line instead of creating a second one.
pub async fn add_to_cart(buyer_id: &str, product_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (buyer_id, product_id) VALUES ($1, $2)
            ON CONFLICT (buyer_id, product_id) DO UPDATE SET quantity = quantity + 1
        "#,
    )
    .bind(buyer_id)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn clear_cart(buyer_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1").bind(buyer_id).execute(conn).await?;
    debug!("🛒️ Cleared {} cart line(s) for buyer {buyer_id}", result.rows_affected());
    Ok(())
}
