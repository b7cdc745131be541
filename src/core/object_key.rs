use crate::common::{GateError, Result};
use std::fmt;
use uuid::Uuid;

pub const OBJECT_EXTENSION: &str = "jpeg";

/// Storage object name, also the correlation key between upload and match query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Fresh visitor key: `<uuid-v4>.jpeg`.
    pub fn generate() -> Self {
        Self(format!("{}.{}", Uuid::new_v4(), OBJECT_EXTENSION))
    }

    /// Registration key `<First>_<Last>.jpeg`. The registration hook splits the
    /// key on '.' and '_' to recover the name, so neither may appear in a name.
    pub fn employee(first_name: &str, last_name: &str) -> Result<Self> {
        for name in [first_name, last_name] {
            if name.trim().is_empty() {
                return Err(GateError::InvalidName("name must not be empty".into()));
            }
            if name.chars().any(|c| c == '_' || c == '.' || c == '/' || c.is_control()) {
                return Err(GateError::InvalidName(format!(
                    "'{}' contains '_', '.', '/' or control characters", name
                )));
            }
        }

        Ok(Self(format!("{}_{}.{}", first_name.trim(), last_name.trim(), OBJECT_EXTENSION)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
