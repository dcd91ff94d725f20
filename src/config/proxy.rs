use super::ordered::OrderedMap;
use crate::error::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Proxy rule as written in the dev server's config; keyed by `matchPrefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProxyRule {
    /// Base URL matched requests are forwarded to
    pub target: String,

    /// Rewrite Host/Origin to the target's instead of the client's
    #[serde(default)]
    pub change_origin: bool,

    /// Regex pattern to replacement, applied to the path before forwarding
    #[serde(default)]
    pub path_rewrite: OrderedMap<String>,
}

impl RawProxyRule {
    pub fn new(target: impl Into<String>, change_origin: bool) -> Self {
        Self {
            target: target.into(),
            change_origin,
            path_rewrite: OrderedMap::new(),
        }
    }
}

/// Compiled `pathRewrite` entry
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

impl PartialEq for RewriteRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.replacement == other.replacement
    }
}

/// Validated proxy rule
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRule {
    match_prefix: String,
    target: Url,
    change_origin: bool,
    path_rewrite: Vec<RewriteRule>,
}

impl ProxyRule {
    /// Validate a raw rule registered under `match_prefix`.
    pub fn new(match_prefix: &str, raw: &RawProxyRule) -> AppResult<Self> {
        if match_prefix.is_empty() {
            return Err(AppError::InvalidPrefix(
                match_prefix.to_string(),
                "must not be empty".to_string(),
            ));
        }
        if !match_prefix.starts_with('/') {
            return Err(AppError::InvalidPrefix(
                match_prefix.to_string(),
                "must start with '/'".to_string(),
            ));
        }

        let target = parse_target(match_prefix, &raw.target)?;

        let path_rewrite = raw
            .path_rewrite
            .iter()
            .map(|(pattern, replacement)| {
                let compiled = Regex::new(pattern).map_err(|e| AppError::InvalidRewrite {
                    prefix: match_prefix.to_string(),
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(RewriteRule {
                    pattern: compiled,
                    replacement: replacement.clone(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            match_prefix: match_prefix.to_string(),
            target,
            change_origin: raw.change_origin,
            path_rewrite,
        })
    }

    pub fn match_prefix(&self) -> &str {
        &self.match_prefix
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn path_rewrite(&self) -> &[RewriteRule] {
        &self.path_rewrite
    }

    /// Whether a request path (without query) falls under this rule
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.match_prefix)
    }

    /// Apply `pathRewrite` to a path and query.
    ///
    /// Only the first pattern that matches is applied, and only its first
    /// occurrence is replaced.
    pub fn rewrite(&self, path_and_query: &str) -> String {
        self.path_rewrite
            .iter()
            .find(|rule| rule.pattern.is_match(path_and_query))
            .map(|rule| {
                rule.pattern
                    .replace(path_and_query, rule.replacement.as_str())
                    .into_owned()
            })
            .unwrap_or_else(|| path_and_query.to_string())
    }

    /// Value of the `Host` header the target expects
    pub fn target_authority(&self) -> String {
        let host = self.target.host_str().unwrap_or_default();
        match self.target.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

fn parse_target(prefix: &str, target: &str) -> AppResult<Url> {
    let invalid = |reason: String| AppError::InvalidTarget {
        prefix: prefix.to_string(),
        reason,
    };

    let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".to_string()));
    }

    Ok(url)
}
