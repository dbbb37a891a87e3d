//! Newtype wrappers for domain identifiers.
//!
//! Discord addresses every object with a 64-bit snowflake that travels as a
//! decimal string in JSON. The wrappers below keep a role id from being passed
//! where a thread id is expected, and keep the string encoding in one place.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// A Statuspage incident identifier (opaque, provider-assigned).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub String);

impl IncidentId {
    pub fn new(s: impl Into<String>) -> Self {
        IncidentId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IncidentId {
    fn from(s: String) -> Self {
        IncidentId(s)
    }
}

impl From<&str> for IncidentId {
    fn from(s: &str) -> Self {
        IncidentId(s.to_string())
    }
}

/// A raw Discord snowflake.
///
/// Serializes as a decimal string. Deserializes from either a string or a
/// bare integer, since config files commonly hold the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Snowflake)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Snowflake(n)),
            Raw::Text(s) => s
                .parse()
                .map_err(|e| de::Error::custom(format!("invalid snowflake {s:?}: {e}"))),
        }
    }
}

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Snowflake);

        impl $name {
            pub const fn new(id: u64) -> Self {
                $name(Snowflake(id))
            }

            pub const fn get(self) -> u64 {
                self.0.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name::new(id)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map($name)
            }
        }
    };
}

snowflake_id!(
    /// A Discord guild (server).
    GuildId
);
snowflake_id!(
    /// A Discord channel. Threads are channels too; see [`ThreadId`].
    ChannelId
);
snowflake_id!(
    /// A message within a channel.
    MessageId
);
snowflake_id!(
    /// A guild role.
    RoleId
);
snowflake_id!(
    /// A thread spawned from a message.
    ThreadId
);
snowflake_id!(
    /// A Discord user.
    UserId
);

impl RoleId {
    /// The inline mention syntax that pings every member of the role.
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

impl From<ThreadId> for ChannelId {
    fn from(thread: ThreadId) -> Self {
        ChannelId(thread.0)
    }
}
