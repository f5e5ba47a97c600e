use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::Error;

/// Number of random bytes behind every issued token
pub const TOKEN_BYTES: usize = 32;

/// An opaque bearer token used in confirm and unsubscribe links.
///
/// Issued tokens are `TOKEN_BYTES` of OS randomness, hex-encoded. Tokens are
/// only ever compared for equality, so parsing accepts any non-blank string
/// and lets the lookup decide whether it exists.
#[derive(Clone, PartialEq, Eq)]
pub struct SubscriptionToken(String);

impl SubscriptionToken {
    /// Issue a fresh, cryptographically random token
    pub fn issue() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }
}

impl FromStr for SubscriptionToken {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::Validation("Invalid token".into()));
        }
        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for SubscriptionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// Tokens are credentials, keep them out of the logs
impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubscriptionToken(..)")
    }
}
