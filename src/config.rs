//! Dev server configuration: the raw schema, its validated form, and loading
//! from defaults, a JSON file, the environment and `.env`.

mod allowed_hosts;
mod ordered;
mod proxy;
mod server;

pub use allowed_hosts::AllowedHosts;
pub use ordered::OrderedMap;
pub use proxy::{ProxyRule, RawProxyRule, RewriteRule};
pub use server::{
    RawServerConfig, ServerConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PROXY_PREFIX,
    DEFAULT_PROXY_TARGET, MIN_PORT,
};

use crate::error::{AppError, AppResult};
use std::env;
use std::path::Path;

impl ServerConfig {
    /// Load configuration from the environment over the built-in defaults
    pub fn from_env() -> AppResult<Self> {
        Self::load(None)
    }

    /// Load configuration from an optional JSON file, then the environment.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        Self::try_from(load_raw(path)?)
    }
}

/// Load the unvalidated configuration so callers can layer CLI overrides on
/// top before validating.
pub fn load_raw(path: Option<&Path>) -> AppResult<RawServerConfig> {
    dotenvy::dotenv().ok();

    let mut raw = match path {
        Some(path) => RawServerConfig::from_file(path)?,
        None => RawServerConfig::default(),
    };
    apply_env_overrides(&mut raw, |key| env::var(key).ok())?;

    Ok(raw)
}

/// Apply `DEV_SERVER_*` / `DEV_PROXY_*` overrides using `lookup` to read
/// variables.
pub fn apply_env_overrides<F>(raw: &mut RawServerConfig, lookup: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("DEV_SERVER_PORT") {
        raw.port = port
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration("Invalid DEV_SERVER_PORT".to_string()))?;
    }

    if let Some(host) = lookup("DEV_SERVER_HOST") {
        raw.host = host.trim().to_string();
    }

    if let Some(allowed) = lookup("DEV_SERVER_ALLOWED_HOSTS") {
        raw.allowed_hosts = AllowedHosts::from_env_value(&allowed);
    }

    if let Some(target) = lookup("DEV_PROXY_TARGET") {
        // the /api rule, or failing that the only rule there is
        let prefix = if raw.proxy.get(DEFAULT_PROXY_PREFIX).is_some() {
            Some(DEFAULT_PROXY_PREFIX.to_string())
        } else if raw.proxy.len() == 1 {
            raw.proxy.keys().next().map(str::to_string)
        } else {
            None
        };
        let rule = match prefix {
            Some(prefix) => raw.proxy.get_mut(&prefix),
            None => None,
        };
        let rule = rule.ok_or_else(|| {
            AppError::Configuration(format!(
                "DEV_PROXY_TARGET is set but there is no {} rule to apply it to",
                DEFAULT_PROXY_PREFIX
            ))
        })?;
        rule.target = target.trim().to_string();
    }

    if let Some(strip) = lookup("DEV_PROXY_STRIP_PREFIX") {
        let strip: bool = strip
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration("Invalid DEV_PROXY_STRIP_PREFIX".to_string()))?;
        if strip {
            for (prefix, rule) in raw.proxy.iter_mut() {
                if rule.path_rewrite.is_empty() {
                    rule.path_rewrite
                        .insert(format!("^{}", regex::escape(prefix)), String::new());
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let mut raw = RawServerConfig::default();
        apply_env_overrides(&mut raw, lookup_from(&[])).unwrap();
        assert_eq!(raw, RawServerConfig::default());
    }

    #[test]
    fn test_server_overrides() {
        let mut raw = RawServerConfig::default();
        apply_env_overrides(
            &mut raw,
            lookup_from(&[
                ("DEV_SERVER_PORT", "9090"),
                ("DEV_SERVER_HOST", "127.0.0.1"),
                ("DEV_SERVER_ALLOWED_HOSTS", "localhost,.example.com"),
            ]),
        )
        .unwrap();

        assert_eq!(raw.port, 9090);
        assert_eq!(raw.host, "127.0.0.1");
        assert_eq!(
            raw.allowed_hosts,
            AllowedHosts::List(vec!["localhost".to_string(), ".example.com".to_string()])
        );
    }

    #[test]
    fn test_invalid_port_names_the_variable() {
        let mut raw = RawServerConfig::default();
        let err = apply_env_overrides(&mut raw, lookup_from(&[("DEV_SERVER_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("DEV_SERVER_PORT"));
    }

    #[test]
    fn test_target_override_applies_to_api_rule() {
        let mut raw = RawServerConfig::default();
        raw.proxy
            .insert("/auth", RawProxyRule::new("http://localhost:9000", false));
        apply_env_overrides(
            &mut raw,
            lookup_from(&[("DEV_PROXY_TARGET", "http://10.0.0.2:8001")]),
        )
        .unwrap();

        assert_eq!(raw.proxy.get("/api").unwrap().target, "http://10.0.0.2:8001");
        assert_eq!(raw.proxy.get("/auth").unwrap().target, "http://localhost:9000");
    }

    #[test]
    fn test_target_override_applies_to_single_rule() {
        let mut raw = RawServerConfig::default();
        raw.proxy = OrderedMap::new();
        raw.proxy
            .insert("/graphql", RawProxyRule::new("http://localhost:4000", true));
        apply_env_overrides(
            &mut raw,
            lookup_from(&[("DEV_PROXY_TARGET", "http://localhost:4001")]),
        )
        .unwrap();

        assert_eq!(raw.proxy.get("/graphql").unwrap().target, "http://localhost:4001");
    }

    #[test]
    fn test_target_override_without_rule_fails() {
        let mut raw = RawServerConfig::default();
        raw.proxy = OrderedMap::new();
        let result = apply_env_overrides(
            &mut raw,
            lookup_from(&[("DEV_PROXY_TARGET", "http://localhost:4001")]),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_strip_prefix_switch() {
        let mut raw = RawServerConfig::default();
        apply_env_overrides(&mut raw, lookup_from(&[("DEV_PROXY_STRIP_PREFIX", "true")])).unwrap();

        let rewrite = &raw.proxy.get("/api").unwrap().path_rewrite;
        assert_eq!(rewrite.get("^/api"), Some(&String::new()));

        let mut raw = RawServerConfig::default();
        apply_env_overrides(&mut raw, lookup_from(&[("DEV_PROXY_STRIP_PREFIX", "false")])).unwrap();
        assert!(raw.proxy.get("/api").unwrap().path_rewrite.is_empty());
    }
}
