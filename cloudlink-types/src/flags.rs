//! Publish flags and their composition.
//!
//! A single [`PublishFlag`] converts into a [`PublishFlags`] set, and any
//! mix of the two composes with `|`. The numeric bits are handed to the
//! connection engine exactly as composed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Visibility and acknowledgement modifiers for a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PublishFlag {
    /// Visible to anyone subscribed to the event name. This is the absence
    /// of every other bit.
    Public = 0x00,
    /// Visible only to devices owned by the same account.
    Private = 0x01,
    /// Fire-and-forget; the engine does not wait for a cloud acknowledgement.
    NoAck = 0x02,
    /// The engine waits for a cloud acknowledgement before resolving.
    WithAck = 0x08,
}

pub const PUBLIC: PublishFlag = PublishFlag::Public;
pub const PRIVATE: PublishFlag = PublishFlag::Private;
pub const NO_ACK: PublishFlag = PublishFlag::NoAck;
pub const WITH_ACK: PublishFlag = PublishFlag::WithAck;

const NAMED: [PublishFlag; 3] = [PublishFlag::Private, PublishFlag::NoAck, PublishFlag::WithAck];

impl PublishFlag {
    /// Returns the raw bit value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Returns the snake_case name of the flag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::NoAck => "no_ack",
            Self::WithAck => "with_ack",
        }
    }
}

impl fmt::Display for PublishFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishFlag {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "no_ack" => Ok(Self::NoAck),
            "with_ack" => Ok(Self::WithAck),
            other => Err(crate::Error::UnknownFlag(other.to_string())),
        }
    }
}

/// A composed set of [`PublishFlag`]s. Defaults to public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishFlags(u8);

impl PublishFlags {
    /// The empty set, equivalent to [`PublishFlag::Public`].
    pub const PUBLIC: Self = Self(0);

    /// Creates a set from raw bits. Unknown bits are kept as-is.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bits passed to the engine.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `flag` is set.
    ///
    /// `Public` has no bits and is therefore contained in every set; use
    /// [`PublishFlags::is_public`] to test visibility.
    #[must_use]
    pub const fn contains(self, flag: PublishFlag) -> bool {
        self.0 & flag.bits() == flag.bits()
    }

    /// Returns true unless the private bit is set.
    #[must_use]
    pub const fn is_public(self) -> bool {
        !self.contains(PublishFlag::Private)
    }

    /// Returns the set with `flag` added.
    #[must_use]
    pub const fn with(self, flag: PublishFlag) -> Self {
        Self(self.0 | flag.bits())
    }

    /// Iterates the named (non-public) flags present in the set.
    pub fn iter(self) -> impl Iterator<Item = PublishFlag> {
        NAMED.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<PublishFlag> for PublishFlags {
    fn from(flag: PublishFlag) -> Self {
        Self(flag.bits())
    }
}

impl BitOr for PublishFlags {
    type Output = PublishFlags;

    fn bitor(self, rhs: PublishFlags) -> PublishFlags {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<PublishFlag> for PublishFlags {
    type Output = PublishFlags;

    fn bitor(self, rhs: PublishFlag) -> PublishFlags {
        self.with(rhs)
    }
}

impl BitOr for PublishFlag {
    type Output = PublishFlags;

    fn bitor(self, rhs: PublishFlag) -> PublishFlags {
        PublishFlags::from(self).with(rhs)
    }
}

impl BitOr<PublishFlags> for PublishFlag {
    type Output = PublishFlags;

    fn bitor(self, rhs: PublishFlags) -> PublishFlags {
        rhs.with(self)
    }
}

impl BitOrAssign for PublishFlags {
    fn bitor_assign(&mut self, rhs: PublishFlags) {
        self.0 |= rhs.0;
    }
}

impl BitOrAssign<PublishFlag> for PublishFlags {
    fn bitor_assign(&mut self, rhs: PublishFlag) {
        self.0 |= rhs.bits();
    }
}

impl fmt::Display for PublishFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut named = self.iter().peekable();
        if named.peek().is_none() {
            return f.write_str(PublishFlag::Public.as_str());
        }
        let mut first = true;
        for flag in named {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(flag.as_str())?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for PublishFlags {
    type Err = crate::Error;

    /// Parses a `|`-separated list such as `private|with_ack`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('|')
            .map(str::parse::<PublishFlag>)
            .try_fold(Self::PUBLIC, |acc, flag| Ok(acc | flag?))
    }
}
