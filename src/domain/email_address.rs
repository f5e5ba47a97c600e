use std::fmt;
use std::str::FromStr;

use crate::domain::sanitize;
use crate::error::Error;

/// A normalized, user supplied email address
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EmailAddress(String);

impl FromStr for EmailAddress {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err(Error::Validation("Email address cannot be empty".into()));
        }

        let value = sanitize::normalize_email(value);
        if !sanitize::is_valid_email(&value) {
            return Err(Error::Validation("Email address of incorrect format".into()));
        }

        Ok(Self(value))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
