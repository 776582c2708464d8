use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Identifier shared by books, users and loan requests.
///
/// Identifiers are positive integers. Textual input (CLI arguments, legacy
/// files that stored foreign keys as strings) is converted here, once, and
/// every comparison afterwards is a plain integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(NonZeroU32);

impl Id {
    /// The first identifier handed out in an empty collection
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Build an identifier from a raw integer, rejecting zero
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// The raw integer value
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The identifier that follows this one
    ///
    /// # Errors
    ///
    /// Returns `IdError::Exhausted` when the identifier space is used up.
    pub fn next(self) -> Result<Self, IdError> {
        self.0.checked_add(1).map(Self).ok_or(IdError::Exhausted)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Failure to turn external input into an [`Id`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Input was not a base-10 integer
    #[error("invalid identifier {0:?}: expected a positive integer")]
    Invalid(String),
    /// Input was zero
    #[error("identifier must be positive, got 0")]
    Zero,
    /// No identifier left to assign
    #[error("identifier space exhausted")]
    Exhausted,
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let raw: u32 = trimmed.parse().map_err(|_| IdError::Invalid(trimmed.to_string()))?;
        Self::new(raw).ok_or(IdError::Zero)
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.get())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = deserializer.deserialize_any(LenientU32Visitor)?;
        Self::new(raw).ok_or_else(|| de::Error::custom(IdError::Zero))
    }
}

/// Accepts `7` and `"7"` alike; older data files wrote numbers as strings.
#[derive(Debug)]
struct LenientU32Visitor;

impl de::Visitor<'_> for LenientU32Visitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer or a string holding one")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
        v.trim().parse().map_err(|_| E::custom(format!("{v:?} is not an unsigned integer")))
    }
}
