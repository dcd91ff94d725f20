//! devproxy - validated development-server proxy configuration.
//!
//! Builds the dev server's configuration (bind port and host, allowed-host
//! policy, path-prefix proxy rules), rejects malformed values up front,
//! answers where a request path would be forwarded, and hands the result
//! to the external dev server.

pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod routing;
pub mod server;
