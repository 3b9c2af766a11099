//! Simple stateless pub-sub event hooks.
//!
//! Components can subscribe to engine events (a payment settling, an order being delivered or cancelled) and react
//! to them without access to engine internals. Handlers are async and run on their own tokio task.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderCancelledEvent, OrderDeliveredEvent, OrderPaidEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
