mod data_objects;
mod marketplace_database;
mod order_management;
mod user_management;

pub use data_objects::{PaymentRequest, ReservationResult, SettlementUpdate};
pub use marketplace_database::{MarketplaceDatabase, OrderFlowError};
pub use order_management::{OrderManagement, OrderQueryError};
pub use user_management::UserManagement;
