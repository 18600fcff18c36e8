//! Calendar version parsing for Home Assistant release strings.
//!
//! Home Assistant versions are `YEAR.MONTH[.PATCH]` (e.g. `2024.10.1`), with
//! an optional `v` prefix on user-supplied input. Ordering is lexicographic
//! over (year, month, patch).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("version `{0}` has fewer than two dot-separated segments")]
    TooFewSegments(String),
    #[error("version `{0}` contains a non-numeric segment")]
    NonNumericSegment(String),
}

/// A parsed platform version. The derived ordering compares year first,
/// then month, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub year: u32,
    pub month: u32,
    pub patch: u32,
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('v').unwrap_or(s);
        let segments: Vec<&str> = trimmed.split('.').collect();
        if segments.len() < 2 {
            return Err(VersionParseError::TooFewSegments(s.to_string()));
        }
        let numeric = |segment: &str| {
            segment
                .parse::<u32>()
                .map_err(|_| VersionParseError::NonNumericSegment(s.to_string()))
        };
        Ok(Version {
            year: numeric(segments[0])?,
            month: numeric(segments[1])?,
            patch: match segments.get(2) {
                Some(segment) => numeric(segment)?,
                None => 0,
            },
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.year, self.month, self.patch)
    }
}
