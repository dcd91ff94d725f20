//! Request routing decisions for the dev server's proxy rules.
//!
//! Nothing here performs I/O: a request path goes in, and out comes either
//! the forwarded URL with the headers to rewrite, or a fall-through to the
//! tool's own asset pipeline.

use crate::config::{ProxyRule, ServerConfig};
use crate::error::{AppError, AppResult};
use http::header::{HeaderValue, HOST, ORIGIN};
use http::{Request, Uri};
use url::Url;

/// Outcome of matching a request against the proxy rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Forward to a backend
    Forward(ForwardPlan),

    /// No rule matched; served by the dev server itself
    Fallthrough,
}

/// Where and how a matched request is forwarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardPlan {
    /// Prefix of the rule that matched
    pub match_prefix: String,

    /// Full URL of the forwarded request
    pub url: Url,

    /// Replacement `Host` header, set when the rule changes origin
    pub host_header: Option<String>,

    /// Replacement `Origin` header, applied only if the request carried one
    pub origin_header: Option<String>,
}

impl ServerConfig {
    /// Route a request by its path and query, e.g. `/api/user?id=1`.
    pub fn route(&self, path_and_query: &str) -> Route {
        let path = path_and_query
            .split_once('?')
            .map_or(path_and_query, |(path, _)| path);

        match self.proxy_rules().iter().find(|rule| rule.matches(path)) {
            Some(rule) => Route::Forward(plan(rule, path_and_query)),
            None => {
                tracing::debug!(path, "no proxy rule matched");
                Route::Fallthrough
            }
        }
    }
}

fn plan(rule: &ProxyRule, path_and_query: &str) -> ForwardPlan {
    let rewritten = rule.rewrite(path_and_query);
    let url = join_target(rule.target(), &rewritten);

    tracing::debug!(
        prefix = rule.match_prefix(),
        from = path_and_query,
        to = %url,
        "proxy rule matched"
    );

    let (host_header, origin_header) = if rule.change_origin() {
        (
            Some(rule.target_authority()),
            Some(rule.target().origin().ascii_serialization()),
        )
    } else {
        (None, None)
    };

    ForwardPlan {
        match_prefix: rule.match_prefix().to_string(),
        url,
        host_header,
        origin_header,
    }
}

/// Append a rewritten path and query to the target's base path.
fn join_target(target: &Url, rewritten: &str) -> Url {
    let (path, query) = match rewritten.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rewritten, None),
    };

    let base = target.path().trim_end_matches('/');
    let joined = match path {
        "" => format!("{}/", base),
        p if p.starts_with('/') => format!("{}{}", base, p),
        p => format!("{}/{}", base, p),
    };

    let mut url = target.clone();
    url.set_path(&joined);
    url.set_query(query);
    url
}

impl ForwardPlan {
    /// Point a request at the backend: swap its URI and, when the rule
    /// changes origin, its `Host` and `Origin` headers.
    pub fn apply<B>(&self, request: &mut Request<B>) -> AppResult<()> {
        let uri: Uri = self
            .url
            .as_str()
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid forward URI {}: {}", self.url, e)))?;
        *request.uri_mut() = uri;

        if let Some(host) = &self.host_header {
            request.headers_mut().insert(HOST, header_value(host)?);
        }

        if let Some(origin) = &self.origin_header {
            if request.headers().contains_key(ORIGIN) {
                request.headers_mut().insert(ORIGIN, header_value(origin)?);
            }
        }

        Ok(())
    }
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid header value {:?}: {}", value, e)))
}
