//! Acting identities and their roles.

use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a user is acting in for a given operation.
///
/// A single account may own an agenda and also book appointments with
/// other artists, so the role is attached to the request rather than to
/// the user record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Service provider owning an agenda.
    Artist,
    /// Customer booking appointments.
    Customer,
}

impl ActorRole {
    /// String form used in logs and persisted metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Customer => "customer",
        }
    }

    /// Parses a role from its string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input when it names no known role.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "artist" => Ok(Self::Artist),
            "customer" => Ok(Self::Customer),
            other => Err(format!("unknown actor role: {other}")),
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity performing a state change.
///
/// Authorization rules in the engine are predicates over an `Actor` and
/// the entity being acted on; the actor is also recorded verbatim in the
/// appointment status log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user.
    pub id: UserId,
    /// The role the user is acting in.
    pub role: ActorRole,
}

impl Actor {
    /// Creates an actor acting as an artist.
    #[must_use]
    pub const fn artist(id: UserId) -> Self {
        Self {
            id,
            role: ActorRole::Artist,
        }
    }

    /// Creates an actor acting as a customer.
    #[must_use]
    pub const fn customer(id: UserId) -> Self {
        Self {
            id,
            role: ActorRole::Customer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_round_trip() {
        for role in [ActorRole::Artist, ActorRole::Customer] {
            assert_eq!(ActorRole::parse(role.as_str()), Ok(role));
        }
        assert!(ActorRole::parse("admin").is_err());
    }
}
