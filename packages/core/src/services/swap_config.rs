//! Identity swap configuration
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved sentinel used when no strategy is configured
pub const DEFAULT_SENTINEL_ID: i64 = -9999;

/// How the swap engine picks its temporary holding id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum SentinelStrategy {
    /// A fixed out-of-domain id; valid ids are always positive
    Reserved(i64),

    /// `max(id) + 1`, computed under the write lock of each swap
    ScratchAboveMax,
}

impl Default for SentinelStrategy {
    fn default() -> Self {
        SentinelStrategy::Reserved(DEFAULT_SENTINEL_ID)
    }
}

impl fmt::Display for SentinelStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentinelStrategy::Reserved(id) => write!(f, "{}", id),
            SentinelStrategy::ScratchAboveMax => write!(f, "scratch"),
        }
    }
}

/// Parses `"scratch"` or a reserved integer id such as `"-9999"`
impl FromStr for SentinelStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("scratch") {
            return Ok(SentinelStrategy::ScratchAboveMax);
        }

        s.parse::<i64>()
            .map(SentinelStrategy::Reserved)
            .map_err(|_| format!("expected 'scratch' or an integer sentinel id, got '{}'", s))
    }
}

/// Configuration for the identity swap engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Temporary id strategy for the three-step rotation
    #[serde(default)]
    pub sentinel: SentinelStrategy,
}

impl SwapConfig {
    pub fn with_sentinel(sentinel: SentinelStrategy) -> Self {
        Self { sentinel }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let SentinelStrategy::Reserved(id) = self.sentinel {
            if id > 0 {
                return Err(format!(
                    "reserved sentinel id must not be positive (got {}); \
                     positive ids belong to nodes",
                    id
                ));
            }
        }

        Ok(())
    }
}
