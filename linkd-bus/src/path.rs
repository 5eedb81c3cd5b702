//! Object paths and peer names

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// Unique name the bus assigns to a connected peer (e.g. `:1.42`)
pub type BusName = String;

/// Address of an object on the bus
///
/// A valid path is `/` or a sequence of `/segment` elements where each
/// segment is non-empty and made of ASCII alphanumerics and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Parse and validate an object path
    pub fn new(path: impl Into<String>) -> Result<Self, BusError> {
        let path = path.into();
        if is_valid(&path) {
            Ok(Self(path))
        } else {
            Err(BusError::InvalidObjectPath(path))
        }
    }

    /// The root path `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Append `suffix` below this path
    ///
    /// Joining the root onto a path yields the path itself, so the result is
    /// always valid.
    pub fn join(&self, suffix: &ObjectPath) -> ObjectPath {
        match (self.is_root(), suffix.is_root()) {
            (_, true) => self.clone(),
            (true, false) => suffix.clone(),
            (false, false) => ObjectPath(format!("{}{}", self.0, suffix.0)),
        }
    }
}

fn is_valid(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    rest.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = BusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = BusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectPath> for String {
    fn from(path: ObjectPath) -> Self {
        path.0
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
