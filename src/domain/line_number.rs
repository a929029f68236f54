use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

/// The position of a line within its script, as shown in the margin.
///
/// Line numbers are positive and unique within a script. They need not be
/// contiguous: removing a line leaves a gap until the caller renumbers.
///
/// Like the wire enums in [`kinds`](crate::domain::kinds), this is a plain
/// value that storage records embed directly, so it serializes as a bare
/// integer and refuses zero while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineNumber(NonZeroUsize);

impl LineNumber {
    /// The first line of a script.
    pub const FIRST: Self = Self(NonZeroUsize::MIN);

    /// Wrap an already validated number.
    #[must_use]
    pub const fn new(number: NonZeroUsize) -> Self {
        Self(number)
    }

    /// The number as a plain integer.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

/// Error returned for a line number of zero.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid line number '{0}': expected a positive integer")]
pub struct InvalidLineNumber(String);

impl TryFrom<usize> for LineNumber {
    type Error = InvalidLineNumber;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| InvalidLineNumber(value.to_string()))
    }
}

impl FromStr for LineNumber {
    type Err = InvalidLineNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<NonZeroUsize>()
            .map(Self)
            .map_err(|_| InvalidLineNumber(s.to_string()))
    }
}

impl From<LineNumber> for usize {
    fn from(number: LineNumber) -> Self {
        number.get()
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
