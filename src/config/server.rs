use super::allowed_hosts::AllowedHosts;
use super::ordered::OrderedMap;
use super::proxy::{ProxyRule, RawProxyRule};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use url::Host;
use validator::Validate;

/// Lowest port the dev server may bind without privileges
pub const MIN_PORT: u16 = 1024;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PROXY_PREFIX: &str = "/api";
pub const DEFAULT_PROXY_TARGET: &str = "http://localhost:8001";

/// Dev server configuration in the hosting tool's own schema.
///
/// Missing fields fall back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RawServerConfig {
    /// TCP port to bind (e.g., 8080); wider than `u16` so out-of-range
    /// values reach validation instead of failing in the parser
    pub port: i64,

    /// Address to bind (e.g., "0.0.0.0" for all interfaces)
    #[validate(length(min = 1, message = "host must not be empty"))]
    pub host: String,

    /// Which Host headers the dev server accepts
    pub allowed_hosts: AllowedHosts,

    /// Proxy rules keyed by path prefix, in match order
    pub proxy: OrderedMap<RawProxyRule>,
}

impl Default for RawServerConfig {
    fn default() -> Self {
        let mut proxy = OrderedMap::new();
        proxy.insert(
            DEFAULT_PROXY_PREFIX,
            RawProxyRule::new(DEFAULT_PROXY_TARGET, true),
        );

        Self {
            port: i64::from(DEFAULT_PORT),
            host: DEFAULT_HOST.to_string(),
            allowed_hosts: AllowedHosts::All,
            proxy,
        }
    }
}

impl RawServerConfig {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }
}

/// Validated, immutable dev server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    raw: RawServerConfig,
    port: u16,
    bind_host: Host,
    proxy_rules: Vec<ProxyRule>,
}

impl TryFrom<RawServerConfig> for ServerConfig {
    type Error = AppError;

    fn try_from(raw: RawServerConfig) -> AppResult<Self> {
        raw.validate()?;

        let port = u16::try_from(raw.port)
            .ok()
            .filter(|port| *port >= MIN_PORT)
            .ok_or(AppError::InvalidPort(raw.port))?;

        let bind_host = parse_bind_host(&raw.host)?;
        raw.allowed_hosts.validate()?;

        let proxy_rules = {
            let mut seen = HashSet::new();
            let mut rules = Vec::with_capacity(raw.proxy.len());
            for (prefix, rule) in raw.proxy.iter() {
                if !seen.insert(prefix) {
                    return Err(AppError::DuplicatePrefix(prefix.to_string()));
                }
                rules.push(ProxyRule::new(prefix, rule)?);
            }
            rules
        };

        Ok(Self {
            raw,
            port,
            bind_host,
            proxy_rules,
        })
    }
}

impl ServerConfig {
    /// The built-in configuration
    pub fn from_defaults() -> AppResult<Self> {
        Self::try_from(RawServerConfig::default())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> &str {
        &self.raw.host
    }

    pub fn bind_host(&self) -> &Host {
        &self.bind_host
    }

    /// `host:port` form, with IPv6 addresses bracketed
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn allowed_hosts(&self) -> &AllowedHosts {
        &self.raw.allowed_hosts
    }

    pub fn proxy_rules(&self) -> &[ProxyRule] {
        &self.proxy_rules
    }

    pub fn to_raw(&self) -> RawServerConfig {
        self.raw.clone()
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(&self.raw)?)
    }

    pub fn to_json_pretty(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.raw)?)
    }
}

fn parse_bind_host(host: &str) -> AppResult<Host> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(match ip {
            IpAddr::V4(v4) => Host::Ipv4(v4),
            IpAddr::V6(v6) => Host::Ipv6(v6),
        });
    }

    parse_host_name(host).ok_or_else(|| AppError::InvalidHost(host.to_string()))
}

/// Parse a DNS host name strictly.
///
/// Only letters, digits and `-` are allowed in labels, so inputs the URL
/// parser would read as shorthand IPv4 (`8080`, `1.2.3`, `0x7f.1`) or keep as
/// opaque names (`*`) are rejected, and the parsed name must equal the input
/// apart from case.
pub(super) fn parse_host_name(name: &str) -> Option<Host> {
    let is_label = |label: &str| {
        (1..=63).contains(&label.len())
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    };
    if name.is_empty() || name.len() > 253 || !name.split('.').all(is_label) {
        return None;
    }

    match Host::parse(name) {
        Ok(Host::Domain(domain)) if domain.eq_ignore_ascii_case(name) => Some(Host::Domain(domain)),
        _ => None,
    }
}
