use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::debug;
use regex::Regex;

/// Resolves the client address for a request.
///
/// Deployments behind a reverse proxy enable `use_x_forwarded_for` and/or `use_forwarded` so that the callback
/// whitelist sees the originating peer rather than the proxy; with both disabled, the socket's peer address is used.
/// A header source is only consulted when its flag is set, since either header is trivially spoofable unless a
/// trusted proxy strips and rewrites it.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    if use_x_forwarded_for {
        if let Some(ip) = x_forwarded_for_ip(req) {
            debug!("Remote address {ip} taken from the X-Forwarded-For header");
            return Some(ip);
        }
    }
    if use_forwarded {
        if let Some(ip) = forwarded_header_ip(req) {
            debug!("Remote address {ip} taken from the Forwarded header");
            return Some(ip);
        }
    }
    req.connection_info().peer_addr().and_then(|addr| IpAddr::from_str(addr).ok())
}

// X-Forwarded-For carries a comma-separated proxy chain; the leftmost entry is the originating client.
fn x_forwarded_for_ip(req: &HttpRequest) -> Option<IpAddr> {
    let header = req.headers().get("X-Forwarded-For")?.to_str().ok()?;
    let client = header.split(',').next()?.trim();
    IpAddr::from_str(client).ok()
}

// RFC 7239 form, e.g. `for=196.201.214.200;proto=https`. The for= value may be quoted.
fn forwarded_header_ip(req: &HttpRequest) -> Option<IpAddr> {
    let re = Regex::new(r#"for=(?P<ip>[^;,\s]+)"#).ok()?;
    let header = req.headers().get("Forwarded")?.to_str().ok()?;
    let ip = re.captures(header)?.name("ip")?.as_str().trim_matches('"');
    IpAddr::from_str(ip).ok()
}
