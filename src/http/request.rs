//! Request inspection helpers.
//!
//! # Responsibilities
//! - Resolve the client address used for logging and rate limiting
//! - Name the request ID header generated at the edge

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, Request},
};

/// Header carrying the per-request UUID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Where the client address comes from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpSource {
    trust_proxy: bool,
}

impl ClientIpSource {
    pub fn new(trust_proxy: bool) -> Self {
        Self { trust_proxy }
    }

    /// Leftmost `X-Forwarded-For` hop when proxies are trusted, otherwise the
    /// socket peer. `None` when neither is available.
    pub fn resolve<B>(&self, req: &Request<B>) -> Option<IpAddr> {
        if self.trust_proxy {
            if let Some(ip) = forwarded_for(req.headers()) {
                return Some(ip);
            }
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_canonical())
    }

    /// [`resolve`](Self::resolve) rendered as a string key.
    pub fn key<B>(&self, req: &Request<B>) -> String {
        self.resolve(req)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_canonical())
}
