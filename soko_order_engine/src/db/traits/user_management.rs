use crate::{db_types::User, db::traits::order_management::OrderQueryError};

/// The `UserManagement` trait defines the read side for marketplace users: their role (which gates fulfillment
/// transitions) and their seller ledger counters.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Fetches the user with the given id, or `None` if it does not exist.
    async fn fetch_user(&self, user_id: &str) -> Result<Option<User>, OrderQueryError>;
}
