//! Handler priorities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order in which handlers observe an event, first to last.
///
/// [`Priority::Monitor`] runs after everything else and is meant for
/// observing the final outcome, not for changing it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
    Monitor,
}

impl Priority {
    /// Every priority in dispatch order.
    pub const ALL: [Priority; 6] = [
        Self::Highest,
        Self::High,
        Self::Normal,
        Self::Low,
        Self::Lowest,
        Self::Monitor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Lowest => "lowest",
            Self::Monitor => "monitor",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
