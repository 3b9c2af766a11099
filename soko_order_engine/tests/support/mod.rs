#![allow(dead_code)]
use log::*;
use soko_common::Shillings;
use soko_order_engine::{
    db_types::{ListingType, NewProduct, Role},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    MarketplaceDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn setup() -> OrderFlowApi<SqliteDatabase> {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> OrderFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    OrderFlowApi::new(db, producers)
}

pub async fn tear_down(mut api: OrderFlowApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

/// Seeds a small marketplace: one buyer, two sellers, and three single-quantity listings (one of them a donation).
pub async fn seed_marketplace(db: &SqliteDatabase) {
    db.upsert_user("wanjiku", Role::Buyer).await.unwrap();
    db.upsert_user("otieno", Role::Seller).await.unwrap();
    db.upsert_user("amina", Role::Seller).await.unwrap();
    db.insert_product(listing("phone-case", "otieno", 500, ListingType::Resale)).await.unwrap();
    db.insert_product(listing("kettle", "amina", 1500, ListingType::Resale)).await.unwrap();
    db.insert_product(listing("maths-textbook", "otieno", 800, ListingType::Donation)).await.unwrap();
}

pub fn listing(id: &str, seller_id: &str, price: i64, listing_type: ListingType) -> NewProduct {
    NewProduct {
        id: id.to_string(),
        seller_id: seller_id.to_string(),
        name: id.replace('-', " "),
        price: Shillings::from(price),
        listing_type,
        category: "general".to_string(),
    }
}

pub async fn fill_cart(db: &SqliteDatabase, buyer_id: &str, product_ids: &[&str]) {
    for id in product_ids {
        db.add_to_cart(buyer_id, id).await.unwrap();
    }
}
