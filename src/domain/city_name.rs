use std::fmt;
use std::str::FromStr;

use crate::domain::sanitize;
use crate::error::Error;

/// A trimmed and sanitized city name, as stored alongside a subscription
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CityName(String);

impl CityName {
    /// Whether the name also passes the strict, letters-only shape check
    pub fn is_well_formed(&self) -> bool {
        sanitize::is_valid_city_name(&self.0)
    }
}

impl FromStr for CityName {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = sanitize::normalize_city(value);
        if value.is_empty() {
            return Err(Error::Validation("City cannot be empty".into()));
        }
        if value.chars().count() > sanitize::MAX_LEN {
            return Err(Error::Validation("City name too long".into()));
        }

        Ok(Self(value))
    }
}

impl AsRef<str> for CityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
