//! Small, stateless utilities used across the engine.

use rand::Rng;
use regex::Regex;
use thiserror::Error;

use crate::db_types::OrderId;

#[derive(Debug, Clone, Error)]
#[error("Invalid phone number: {0}")]
pub struct PhoneNumberError(pub String);

/// Normalises a Kenyan mobile number to the canonical international form the payment provider requires
/// (`2547XXXXXXXX` or `2541XXXXXXXX`).
///
/// Accepts the usual ways subscribers write their numbers (`07..`, `01..`, `+2547..`, `2547..`, with optional spaces
/// or dashes) and rejects everything else locally, before any provider call is made.
pub fn normalize_msisdn(raw: &str) -> Result<String, PhoneNumberError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let re = Regex::new(r"^(?:\+?254|0)?([17]\d{8})$").expect("msisdn regex is valid");
    match re.captures(&cleaned) {
        Some(caps) => Ok(format!("254{}", &caps[1])),
        None => Err(PhoneNumberError(raw.to_string())),
    }
}

/// Generates a new public order id. The id is opaque; the prefix only helps humans grep logs.
pub fn new_order_id() -> OrderId {
    let mut rng = rand::thread_rng();
    OrderId(format!("SO-{:016x}", rng.gen::<u64>()))
}
