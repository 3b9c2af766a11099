use std::{env, net::IpAddr, str::FromStr};

use daraja_tools::DarajaConfig;
use log::*;
use soko_common::{helpers::parse_boolean_flag, Shillings};

const DEFAULT_SOKO_HOST: &str = "127.0.0.1";
const DEFAULT_SOKO_PORT: u16 = 8460;
const DEFAULT_SHIPPING_FEE: i64 = 600;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Flat shipping fee added to every order total at creation time.
    pub shipping_fee: Shillings,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// If supplied, requests against the payment callback endpoint will be checked against this whitelist of
    /// provider IP addresses. To explicitly disable the whitelist, set the envar to "false", "none", or "0".
    pub callback_whitelist: Option<Vec<IpAddr>>,
    /// Payment provider configuration.
    pub daraja: DarajaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SOKO_HOST.to_string(),
            port: DEFAULT_SOKO_PORT,
            database_url: String::default(),
            shipping_fee: Shillings::from(DEFAULT_SHIPPING_FEE),
            use_x_forwarded_for: false,
            use_forwarded: false,
            callback_whitelist: None,
            daraja: DarajaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SOKO_HOST").ok().unwrap_or_else(|| DEFAULT_SOKO_HOST.into());
        let port = env::var("SOKO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SOKO_PORT. {e} Using the default, {DEFAULT_SOKO_PORT}, \
                         instead."
                    );
                    DEFAULT_SOKO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SOKO_PORT);
        let database_url = env::var("SOKO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SOKO_DATABASE_URL is not set. Please set it to the URL for the Soko database.");
            String::default()
        });
        let shipping_fee = env::var("SOKO_SHIPPING_FEE")
            .map(|s| {
                s.parse::<i64>().map(Shillings::from).unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid amount for SOKO_SHIPPING_FEE. {e} Using the default, \
                         {DEFAULT_SHIPPING_FEE}, instead."
                    );
                    Shillings::from(DEFAULT_SHIPPING_FEE)
                })
            })
            .ok()
            .unwrap_or_else(|| Shillings::from(DEFAULT_SHIPPING_FEE));
        let use_x_forwarded_for = parse_boolean_flag(env::var("SOKO_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SOKO_USE_FORWARDED").ok(), false);
        let callback_whitelist = configure_callback_whitelist();
        let daraja = DarajaConfig::from_env_or_default();
        Self { host, port, database_url, shipping_fee, use_x_forwarded_for, use_forwarded, callback_whitelist, daraja }
    }
}

fn configure_callback_whitelist() -> Option<Vec<IpAddr>> {
    let raw = env::var("SOKO_CALLBACK_IP_WHITELIST").ok()?;
    if ["false", "none", "0"].contains(&raw.to_lowercase().as_str()) {
        warn!("🪛️ The payment callback IP whitelist is explicitly disabled. Any host may post settlement callbacks.");
        return None;
    }
    let ips = raw
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            IpAddr::from_str(s)
                .map_err(|e| {
                    error!("🪛️ {s} in SOKO_CALLBACK_IP_WHITELIST is not a valid IP address and was ignored. {e}");
                })
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    if ips.is_empty() {
        warn!("🪛️ SOKO_CALLBACK_IP_WHITELIST contained no valid addresses. The callback endpoint will reject everyone.");
    }
    info!("🪛️ Payment callbacks are restricted to {} whitelisted address(es).", ips.len());
    Some(ips)
}
