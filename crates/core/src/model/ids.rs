use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a goal.
///
/// The value is the creation timestamp in unix milliseconds; the repository
/// bumps it when two goals are created within the same millisecond, so ids
/// stay unique and strictly increasing in creation order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoalId(u64);

impl GoalId {
    /// Creates a `GoalId` from a raw value.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GoalId({})", self.0)
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing a `GoalId` from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse GoalId from string")
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for GoalId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(GoalId::new).map_err(|_| ParseIdError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_id_display() {
        assert_eq!(GoalId::new(1_714_521_600_000).to_string(), "1714521600000");
    }

    #[test]
    fn goal_id_from_str() {
        let id: GoalId = "42".parse().unwrap();
        assert_eq!(id, GoalId::new(42));
    }

    #[test]
    fn goal_id_from_str_invalid() {
        assert!("not-a-number".parse::<GoalId>().is_err());
    }

    #[test]
    fn goal_id_orders_by_value() {
        assert!(GoalId::new(1) < GoalId::new(2));
    }
}
