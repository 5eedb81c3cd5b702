//! Session policy attributes
//!
//! Create and change requests carry attributes as `(key, value)` pairs. Only
//! the keys in [`keys`] with their expected value shape are understood;
//! anything else is accepted and ignored, on create as well as on change.

use linkd_bus::{Dict, Value};
use tracing::debug;

use crate::bearer::{BearerSpec, parse_bearers};
use crate::error::Result;

/// Recognized attribute keys (case-sensitive)
pub mod keys {
    pub const ALLOWED_BEARERS: &str = "AllowedBearers";
    pub const REALTIME: &str = "Realtime";
    pub const AVOID_HANDOVER: &str = "AvoidHandover";
    pub const STAY_CONNECTED: &str = "StayConnected";
    pub const PERIODIC_CONNECT: &str = "PeriodicConnect";
    pub const IDLE_TIMEOUT: &str = "IdleTimeout";
    pub const EMERGENCY_CALL: &str = "EmergencyCall";
    pub const ROAMING_ALLOWED: &str = "RoamingAllowed";
}

/// One recognized attribute with its decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAttribute {
    AllowedBearers(Vec<BearerSpec>),
    Realtime(bool),
    AvoidHandover(bool),
    StayConnected(bool),
    PeriodicConnect(u32),
    IdleTimeout(u32),
    EmergencyCall(bool),
    RoamingAllowed(bool),
}

impl SessionAttribute {
    /// Decode a `(key, value)` pair
    ///
    /// Returns `Ok(None)` for unknown keys and for known keys carrying a value
    /// of the wrong shape. Fails only if a bearer list cannot be allocated.
    pub fn parse(key: &str, value: &Value) -> Result<Option<Self>> {
        let attribute = match value {
            Value::StringArray(tokens) => match key {
                keys::ALLOWED_BEARERS => Some(Self::AllowedBearers(parse_bearers(tokens)?)),
                _ => None,
            },
            Value::Bool(b) => match key {
                keys::REALTIME => Some(Self::Realtime(*b)),
                keys::AVOID_HANDOVER => Some(Self::AvoidHandover(*b)),
                keys::STAY_CONNECTED => Some(Self::StayConnected(*b)),
                keys::EMERGENCY_CALL => Some(Self::EmergencyCall(*b)),
                keys::ROAMING_ALLOWED => Some(Self::RoamingAllowed(*b)),
                _ => None,
            },
            Value::U32(n) => match key {
                keys::PERIODIC_CONNECT => Some(Self::PeriodicConnect(*n)),
                keys::IDLE_TIMEOUT => Some(Self::IdleTimeout(*n)),
                _ => None,
            },
            Value::String(_) | Value::ObjectPath(_) | Value::Dict(_) => None,
        };

        if attribute.is_none() {
            debug!(key, shape = value.type_name(), "ignoring attribute");
        }
        Ok(attribute)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::AllowedBearers(_) => keys::ALLOWED_BEARERS,
            Self::Realtime(_) => keys::REALTIME,
            Self::AvoidHandover(_) => keys::AVOID_HANDOVER,
            Self::StayConnected(_) => keys::STAY_CONNECTED,
            Self::PeriodicConnect(_) => keys::PERIODIC_CONNECT,
            Self::IdleTimeout(_) => keys::IDLE_TIMEOUT,
            Self::EmergencyCall(_) => keys::EMERGENCY_CALL,
            Self::RoamingAllowed(_) => keys::ROAMING_ALLOWED,
        }
    }
}

/// Policy state of one session
///
/// `allowed_bearers` is `None` when the client never sent a list and
/// `Some(vec![])` when it explicitly allowed no bearer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSettings {
    pub realtime: bool,
    pub allowed_bearers: Option<Vec<BearerSpec>>,
    pub avoid_handover: bool,
    pub stay_connected: bool,
    /// Seconds between periodic connects, 0 disables
    pub periodic_connect: u32,
    /// Seconds of inactivity before disconnecting, 0 disables
    pub idle_timeout: u32,
    pub emergency_call: bool,
    pub roaming_allowed: bool,
}

impl SessionSettings {
    /// Build settings from a create request's attribute dictionary
    pub fn from_dict(dict: &Dict) -> Result<Self> {
        let mut settings = Self::default();
        for (key, value) in dict.iter() {
            if let Some(attribute) = SessionAttribute::parse(key, value)? {
                settings.apply(attribute);
            }
        }
        Ok(settings)
    }

    /// Overwrite the field `attribute` names
    pub fn apply(&mut self, attribute: SessionAttribute) {
        match attribute {
            SessionAttribute::AllowedBearers(bearers) => self.allowed_bearers = Some(bearers),
            SessionAttribute::Realtime(b) => self.realtime = b,
            SessionAttribute::AvoidHandover(b) => self.avoid_handover = b,
            SessionAttribute::StayConnected(b) => self.stay_connected = b,
            SessionAttribute::PeriodicConnect(n) => self.periodic_connect = n,
            SessionAttribute::IdleTimeout(n) => self.idle_timeout = n,
            SessionAttribute::EmergencyCall(b) => self.emergency_call = b,
            SessionAttribute::RoamingAllowed(b) => self.roaming_allowed = b,
        }
    }

    /// Bearer tokens in client order; empty when none were given
    pub fn allowed_bearer_names(&self) -> Vec<String> {
        self.allowed_bearers
            .iter()
            .flatten()
            .map(|spec| spec.name().to_string())
            .collect()
    }

    /// Current value of a recognized key, as it is reported to the owner
    pub fn value_of(&self, key: &str) -> Option<Value> {
        let value = match key {
            keys::ALLOWED_BEARERS => Value::StringArray(self.allowed_bearer_names()),
            keys::REALTIME => Value::Bool(self.realtime),
            keys::AVOID_HANDOVER => Value::Bool(self.avoid_handover),
            keys::STAY_CONNECTED => Value::Bool(self.stay_connected),
            keys::PERIODIC_CONNECT => Value::U32(self.periodic_connect),
            keys::IDLE_TIMEOUT => Value::U32(self.idle_timeout),
            keys::EMERGENCY_CALL => Value::Bool(self.emergency_call),
            keys::ROAMING_ALLOWED => Value::Bool(self.roaming_allowed),
            _ => return None,
        };
        Some(value)
    }
}
