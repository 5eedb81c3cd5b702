//! Bearer preferences
//!
//! A session lists the bearers (connectivity technologies) it is willing to
//! use as plain tokens such as `wifi` or `*`. Parsing never rejects a token:
//! names without a known technology map to [`ServiceType::Unknown`] and only
//! match through a wildcard.

use std::fmt;

use crate::error::{Result, SessionError};

/// Wildcard token accepted in a bearer list
pub const MATCH_ALL: &str = "*";

/// Technology class of a network service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ServiceType {
    #[default]
    Unknown,
    Ethernet,
    Wifi,
    Wimax,
    Bluetooth,
    Cellular,
}

impl ServiceType {
    /// Fixed lookup from bearer token to technology
    pub fn from_bearer(name: &str) -> Self {
        match name {
            "ethernet" => ServiceType::Ethernet,
            "wifi" => ServiceType::Wifi,
            "wimax" => ServiceType::Wimax,
            "bluetooth" => ServiceType::Bluetooth,
            "3g" | "cellular" => ServiceType::Cellular,
            _ => ServiceType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Unknown => "unknown",
            ServiceType::Ethernet => "ethernet",
            ServiceType::Wifi => "wifi",
            ServiceType::Wimax => "wimax",
            ServiceType::Bluetooth => "bluetooth",
            ServiceType::Cellular => "cellular",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a session's allowed-bearer list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerSpec {
    name: String,
    match_all: bool,
    service_type: ServiceType,
}

impl BearerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_owned(name.into())
    }

    fn from_owned(name: String) -> Self {
        let service_type = ServiceType::from_bearer(&name);
        let match_all = name == MATCH_ALL;
        Self {
            name,
            match_all,
            service_type,
        }
    }

    /// The token as the client sent it
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn match_all(&self) -> bool {
        self.match_all
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// Whether a service of type `candidate` satisfies this entry
    pub fn matches(&self, candidate: ServiceType) -> bool {
        self.match_all
            || (self.service_type != ServiceType::Unknown && self.service_type == candidate)
    }
}

/// Parse an ordered list of bearer tokens
///
/// Fails only when memory for the list cannot be obtained; in that case
/// nothing is returned, not a partial list. Capacity overflow and allocator
/// failure both surface as [`SessionError::ResourceExhausted`] instead of
/// aborting the daemon.
pub fn parse_bearers<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<BearerSpec>> {
    let mut specs = Vec::new();
    specs
        .try_reserve_exact(tokens.len())
        .map_err(|e| SessionError::ResourceExhausted(format!("bearer list: {e}")))?;

    for token in tokens {
        let token = token.as_ref();
        let mut name = String::new();
        name.try_reserve_exact(token.len())
            .map_err(|e| SessionError::ResourceExhausted(format!("bearer '{token}': {e}")))?;
        name.push_str(token);
        specs.push(BearerSpec::from_owned(name));
    }

    Ok(specs)
}
