use std::{env, time::Duration};

use log::*;
use mp_common::Secret;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8480;
const DEFAULT_FULFILLMENT_TIMEOUT: Duration = Duration::from_secs(30);
/// Header carrying the gateway's keyed hash over the raw event body.
pub const SIGNATURE_HEADER: &str = "X-Payment-Signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Shared secret for the webhook HMAC. The gateway signs the raw event body with this key.
    pub webhook_secret: Secret<String>,
    /// Absolute tolerance, in minor currency units, when comparing the declared paid amount against the
    /// recomputed cart total. Zero means exact comparison.
    pub amount_tolerance: i64,
    /// Upper bound on the fulfillment transaction's execution time. Exceeding it aborts the attempt with a
    /// retryable error; the webhook handler re-attempts once.
    pub fulfillment_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: String::default(),
            webhook_secret: Secret::default(),
            amount_tolerance: 0,
            fulfillment_timeout: DEFAULT_FULFILLMENT_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env::var("MKT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKT_PORT. {e} Using the default, {DEFAULT_MKT_PORT}, instead."
                    );
                    DEFAULT_MKT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MKT_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let webhook_secret = env::var("MKT_WEBHOOK_SECRET").map(Secret::new).unwrap_or_else(|_| {
            warn!(
                "🪛️ MKT_WEBHOOK_SECRET is not set. Signature checks will reject every webhook event until a shared \
                 secret is configured."
            );
            Secret::default()
        });
        let amount_tolerance = env::var("MKT_AMOUNT_TOLERANCE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid MKT_AMOUNT_TOLERANCE. {e} Using 0 (exact comparison) instead.");
                    })
                    .ok()
            })
            .unwrap_or(0);
        let fulfillment_timeout = env::var("MKT_FULFILLMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| {
                        error!(
                            "🪛️ {s} is not a valid MKT_FULFILLMENT_TIMEOUT_SECS. {e} Using the default, {}s, \
                             instead.",
                            DEFAULT_FULFILLMENT_TIMEOUT.as_secs()
                        );
                    })
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FULFILLMENT_TIMEOUT);
        Self { host, port, database_url, webhook_secret, amount_tolerance, fulfillment_timeout }
    }
}
