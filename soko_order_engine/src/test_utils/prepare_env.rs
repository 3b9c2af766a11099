use std::path::Path;

use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Gives a test run a clean slate: drops any leftover database at `url`, recreates it and applies the migrations.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    recreate_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to the test database");
    migrate!("./src/db/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Test database at {url} is migrated and ready");
}

/// A unique throwaway sqlite url, so concurrently running test binaries never share a database file.
pub fn random_db_path() -> String {
    format!("sqlite://../data/test_store_{}", rand::random::<u64>())
}

async fn recreate_database(url: &str) {
    // The data directory is not checked in, so it may not exist on a fresh checkout
    if let Some(dir) = url.strip_prefix("sqlite://").and_then(|f| Path::new(f).parent()) {
        let _ = std::fs::create_dir_all(dir);
    }
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("Could not drop leftover test database {url}: {e}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating test database");
}
