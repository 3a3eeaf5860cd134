//! Globally unique identifiers and the per-replica logical clock they are stamped with.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `(site, clock)` pair that identifies a node or stamps a write.
///
/// The clock is local to `site`, not a vector clock — the document model does not
/// track causal history, which is a deliberate consequence of state-based merge
/// (see [`crate::document::Document::merge`]). Ordering compares `clock` ascending,
/// then `site` ascending as a tie-break; it exists purely to resolve concurrent
/// writes, never to reason about causality.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Id {
    pub site: String,
    pub clock: u64,
}

impl Id {
    pub fn new(site: impl Into<String>, clock: u64) -> Self {
        Self {
            site: site.into(),
            clock,
        }
    }

    /// The default, never-set id: empty site, clock zero. A property or child entry
    /// stamped with this id is considered absent.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.site.is_empty() && self.clock == 0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.site, self.clock)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((site, clock)) = s.split_once(':') else {
            return Err(Error::MalformedId {
                input: s.to_string(),
                reason: "missing ':' separator".to_string(),
            });
        };
        if site.is_empty() {
            return Err(Error::MalformedId {
                input: s.to_string(),
                reason: "empty site".to_string(),
            });
        }
        let clock = clock.parse::<u64>().map_err(|_| Error::MalformedId {
            input: s.to_string(),
            reason: "clock is not a valid u64".to_string(),
        })?;
        Ok(Id {
            site: site.to_string(),
            clock,
        })
    }
}

/// Total order used for conflict resolution: clock first, site as tie-break.
impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        self.clock
            .cmp(&other.clock)
            .then_with(|| self.site.cmp(&other.site))
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
