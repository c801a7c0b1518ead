//! # Marketplace server
//! This module hosts the HTTP surface of the fulfillment subsystem. It is responsible for:
//! Listening for incoming payment-confirmation webhooks from the payment gateway.
//! Verifying event authenticity, recomputing the expected charge, and dispatching fulfillment in the background.
//! Serving the confirmation-poller endpoint that the checkout UI polls until its order group appears.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/payment-confirmation`: The webhook route for payment-success events from the gateway.
//! * `/order-status/{payment_reference}`: The confirmation poller.
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
