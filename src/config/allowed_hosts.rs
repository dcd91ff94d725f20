use super::server::parse_host_name;
use crate::error::{AppError, AppResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

/// Policy for which `Host` headers the dev server accepts.
///
/// The hosting tool enforces it; this type only carries and checks the value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedHosts {
    /// Accept any host
    #[default]
    All,

    /// Let the tool allow localhost and its own bind host
    Auto,

    /// Explicit host patterns; a leading `.` also matches subdomains
    List(Vec<String>),
}

impl AllowedHosts {
    /// Parse the environment form: `all`, `auto`, or a comma-separated list.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim() {
            "all" => AllowedHosts::All,
            "auto" => AllowedHosts::Auto,
            list => AllowedHosts::List(
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
        }
    }

    /// Validate every pattern of an explicit list.
    ///
    /// An empty list would admit no host at all and is rejected.
    pub fn validate(&self) -> AppResult<()> {
        let AllowedHosts::List(patterns) = self else {
            return Ok(());
        };

        if patterns.is_empty() {
            return Err(AppError::InvalidAllowedHost(String::new()));
        }

        for pattern in patterns {
            let name = pattern.strip_prefix('.').unwrap_or(pattern);
            let valid = name.parse::<IpAddr>().is_ok() || parse_host_name(name).is_some();
            if !valid {
                return Err(AppError::InvalidAllowedHost(pattern.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for AllowedHosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedHosts::All => f.write_str("all"),
            AllowedHosts::Auto => f.write_str("auto"),
            AllowedHosts::List(patterns) => f.write_str(&patterns.join(",")),
        }
    }
}

impl Serialize for AllowedHosts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AllowedHosts::All => serializer.serialize_str("all"),
            AllowedHosts::Auto => serializer.serialize_str("auto"),
            AllowedHosts::List(patterns) => patterns.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AllowedHostsRepr {
    Keyword(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for AllowedHosts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match AllowedHostsRepr::deserialize(deserializer)? {
            AllowedHostsRepr::Keyword(k) if k == "all" => Ok(AllowedHosts::All),
            AllowedHostsRepr::Keyword(k) if k == "auto" => Ok(AllowedHosts::Auto),
            AllowedHostsRepr::Keyword(other) => Err(D::Error::custom(format!(
                "allowedHosts must be \"all\", \"auto\" or a list, got {:?}",
                other
            ))),
            AllowedHostsRepr::List(patterns) => Ok(AllowedHosts::List(patterns)),
        }
    }
}
