mod shillings;

pub mod helpers;
pub mod op;
mod secret;

pub use secret::Secret;
pub use shillings::{Shillings, ShillingsConversionError};
