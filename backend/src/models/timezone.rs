//! Store timezone resolution with a configured fallback zone.

use chrono_tz::Tz;

/// Default zone for stores with no timezone assignment.
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// A zone name that is not a known IANA identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown timezone: {0}")]
pub struct InvalidTimezone(pub String);

/// Parse an IANA zone name.
pub fn parse_timezone(name: &str) -> Result<Tz, InvalidTimezone> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| InvalidTimezone(name.to_string()))
}

/// Resolves a store's zone, falling back to the configured default when the
/// store has no assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneResolver {
    fallback: Tz,
}

impl TimezoneResolver {
    pub fn new(fallback: Tz) -> Self {
        Self { fallback }
    }

    /// Build from a zone name, e.g. the configured default.
    pub fn from_name(fallback: &str) -> Result<Self, InvalidTimezone> {
        parse_timezone(fallback).map(Self::new)
    }

    pub fn fallback(&self) -> Tz {
        self.fallback
    }

    /// Resolve an assignment. An assigned but unknown name is an error, not a
    /// silent fallback.
    pub fn resolve(&self, assigned: Option<&str>) -> Result<Tz, InvalidTimezone> {
        match assigned {
            Some(name) => parse_timezone(name),
            None => Ok(self.fallback),
        }
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new(chrono_tz::America::Chicago)
    }
}
