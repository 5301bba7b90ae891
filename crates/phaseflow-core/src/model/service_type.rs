use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of the built-in extension
pub const DEFAULT_PREFIX: &str = "builtin";

/// Separator between extension prefix and type name (`prefix::name`)
pub const PREFIX_SEPARATOR: &str = "::";

/// Identifies which deployer handles a service
///
/// Written as `name` (resolved against [`DEFAULT_PREFIX`]) or `prefix::name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceType {
    pub prefix: String,
    pub name: String,
}

impl ServiceType {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }

    /// Type living under the built-in prefix
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(DEFAULT_PREFIX, name)
    }

    pub fn is_builtin(&self) -> bool {
        self.prefix == DEFAULT_PREFIX
    }
}

fn is_valid_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, name) = match s.split_once(PREFIX_SEPARATOR) {
            Some((prefix, name)) => (prefix, name),
            None => (DEFAULT_PREFIX, s),
        };

        if !is_valid_part(prefix) || !is_valid_part(name) {
            return Err(CoreError::InvalidServiceType(s.to_string()));
        }

        Ok(Self::new(prefix, name))
    }
}

impl TryFrom<String> for ServiceType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_builtin() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}{}", self.prefix, PREFIX_SEPARATOR, self.name)
        }
    }
}
