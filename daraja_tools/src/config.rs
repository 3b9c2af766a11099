use log::*;
use soko_common::Secret;

const DEFAULT_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct DarajaConfig {
    /// Base URL of the Daraja API, e.g. "https://api.safaricom.co.ke" for production.
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: Secret<String>,
    /// The paybill / till number payments are pushed to.
    pub shortcode: String,
    pub passkey: Secret<String>,
    /// The publicly reachable URL the provider posts the asynchronous STK result to.
    pub callback_url: String,
    /// Hard cap on any single request to the provider. The provider is the only unbounded-latency dependency in the
    /// system, so this must never be disabled.
    pub timeout_secs: u64,
}

impl Default for DarajaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            consumer_key: String::default(),
            consumer_secret: Secret::default(),
            shortcode: String::default(),
            passkey: Secret::default(),
            callback_url: String::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DarajaConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = std::env::var("SOKO_DARAJA_BASE_URL").unwrap_or_else(|_| {
            warn!("SOKO_DARAJA_BASE_URL not set, using the sandbox environment");
            DEFAULT_BASE_URL.to_string()
        });
        let consumer_key = std::env::var("SOKO_DARAJA_CONSUMER_KEY").unwrap_or_else(|_| {
            warn!("SOKO_DARAJA_CONSUMER_KEY not set. STK pushes will fail until it is configured.");
            String::default()
        });
        let consumer_secret = Secret::new(std::env::var("SOKO_DARAJA_CONSUMER_SECRET").unwrap_or_else(|_| {
            warn!("SOKO_DARAJA_CONSUMER_SECRET not set. STK pushes will fail until it is configured.");
            String::default()
        }));
        let shortcode = std::env::var("SOKO_DARAJA_SHORTCODE").unwrap_or_else(|_| {
            warn!("SOKO_DARAJA_SHORTCODE not set, using the sandbox shortcode");
            "174379".to_string()
        });
        let passkey = Secret::new(std::env::var("SOKO_DARAJA_PASSKEY").unwrap_or_else(|_| {
            warn!("SOKO_DARAJA_PASSKEY not set. STK pushes will fail until it is configured.");
            String::default()
        }));
        let callback_url = std::env::var("SOKO_DARAJA_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("SOKO_DARAJA_CALLBACK_URL not set. The provider will have nowhere to post results.");
            String::default()
        });
        let timeout_secs = std::env::var("SOKO_DARAJA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self { base_url, consumer_key, consumer_secret, shortcode, passkey, callback_url, timeout_secs }
    }
}
