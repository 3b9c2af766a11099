use log::debug;
use soko_common::Shillings;
use sqlx::SqliteConnection;

use crate::{
    db::traits::OrderFlowError,
    db_types::{Role, User},
};

pub async fn fetch_user_by_id(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn upsert_user(user_id: &str, role: Role, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (id, role) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET role = excluded.role, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(role.to_string())
    .fetch_one(conn)
    .await?;
    Ok(user)
}

/// Adds the item price to the seller's income and bumps their exchange counter. The ledger row is created on the
/// fly if the seller has never been credited before; roles live with the upstream auth service, so a missing row
/// here only means the seller has no ledger history yet.
pub async fn credit_seller(
    seller_id: &str,
    amount: Shillings,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    sqlx::query(
        r#"
            INSERT INTO users (id, role, total_income, total_exchanges) VALUES ($1, 'Seller', $2, 1)
            ON CONFLICT (id) DO UPDATE SET
                total_income = total_income + excluded.total_income,
                total_exchanges = total_exchanges + 1,
                updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(seller_id)
    .bind(amount.value())
    .execute(conn)
    .await?;
    debug!("🏦️ Credited seller {seller_id} with {amount}");
    Ok(())
}
