use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::traits::{OrderFlowError, PaymentRequest, SettlementUpdate},
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType},
    order_objects::OrderQueryFilter,
};

/// Inserts a new order and its line items using the given connection. This is not atomic across the order and its
/// items; the caller holds the product reservations and compensates by releasing them if this call fails.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderFlowError> {
    let result: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                buyer_id,
                shipping_address,
                shipping_fee,
                total_amount
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(&order.buyer_id)
    .bind(&order.shipping_address)
    .bind(order.shipping_fee.value())
    .bind(order.total_amount.value())
    .fetch_one(&mut *conn)
    .await?;
    for item in &order.items {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, product_id, seller_id, name, price, listing_type, category)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(result.id)
        .bind(&item.product_id)
        .bind(&item.seller_id)
        .bind(&item.name)
        .bind(item.price.value())
        .bind(item.listing_type.to_string())
        .bind(&item.category)
        .execute(&mut *conn)
        .await?;
    }
    debug!("📝️ Order [{}] inserted with id {} ({} items)", result.order_id, result.id, order.items.len());
    Ok(result)
}

pub async fn fetch_order_by_order_id(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the order carrying the given provider checkout reference. Settlement events identify their order through
/// this reference rather than the public order id.
pub async fn fetch_order_by_checkout_ref(
    checkout_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE checkout_ref = $1").bind(checkout_ref).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_row_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_row_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Records the provider references for a freshly initiated payment. Re-initiation after a failed attempt resets the
/// payment sub-record, so the settlement guard is armed again for the new checkout reference.
pub async fn attach_payment_request(
    order_id: &OrderId,
    request: PaymentRequest,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                checkout_ref = $1,
                merchant_ref = $2,
                payment_amount = $3,
                payer_phone = $4,
                payment_sub_status = 'Pending',
                receipt_number = NULL,
                settled_at = NULL,
                initiated_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $5
        "#,
    )
    .bind(&request.checkout_ref)
    .bind(&request.merchant_ref)
    .bind(request.amount.value())
    .bind(&request.payer_phone)
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(OrderFlowError::OrderNotFound(order_id.clone()));
    }
    debug!("💳️ Payment request {} recorded against order [{order_id}]", request.checkout_ref);
    Ok(())
}

/// Applies a settlement in a single conditional update. The guard is the payment sub-status still being `Pending`
/// for this checkout reference, so whichever of the webhook and the status poll lands second affects zero rows.
///
/// On success the order is advanced as well, but only from `Pending`. An order that was cancelled while the payment
/// was in flight keeps its status; the money side still settles.
pub async fn try_settle_payment(
    checkout_ref: &str,
    update: SettlementUpdate,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderFlowError> {
    let advance_to = update.advance_order_to.map(|s| s.to_string());
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                payment_sub_status = $1,
                payment_status = $2,
                receipt_number = COALESCE($3, receipt_number),
                settled_at = CURRENT_TIMESTAMP,
                order_status = CASE
                    WHEN $4 IS NOT NULL AND order_status = 'Pending' THEN $4
                    ELSE order_status
                END,
                updated_at = CURRENT_TIMESTAMP
            WHERE checkout_ref = $5 AND payment_sub_status = 'Pending'
        "#,
    )
    .bind(update.sub_status.to_string())
    .bind(update.payment_status.to_string())
    .bind(update.receipt_number)
    .bind(advance_to)
    .bind(checkout_ref)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Moves the order to `to` if and only if its current status is one of `from`. The affected-row count tells the
/// caller whether it won the transition, which is what keeps delivery side effects exactly-once.
pub async fn try_advance_order_status(
    order_id: &OrderId,
    from: &[OrderStatusType],
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderFlowError> {
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, order_status = ");
    builder.push_bind(to.to_string());
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.as_str());
    let statuses = from.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
    builder.push(format!(" AND order_status IN ({statuses})"));
    trace!("📝️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await.map_err(|e| OrderFlowError::DatabaseError(e.to_string()))?;
    Ok(result.rows_affected() == 1)
}

pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.to_string());
    }
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("id IN (SELECT order_id FROM order_items WHERE seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
        where_clause.push_unseparated(")");
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("order_status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("Result of search_orders: {:?}", orders.len());
    Ok(orders)
}
