//! Alarm severity and reset policy.

use serde::{Deserialize, Serialize};

/// Alarm severity. The derive order is the severity order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AlarmLevel {
    #[default]
    None,
    Warning,
    Alarm,
    Technical,
}

impl AlarmLevel {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Warning => 1,
            Self::Alarm => 2,
            Self::Technical => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Warning),
            2 => Some(Self::Alarm),
            3 => Some(Self::Technical),
            _ => None,
        }
    }
}

/// How an alarm returns to a lower level once its cause is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResetMode {
    /// De-escalate as soon as the condition clears.
    #[default]
    AutoReset,
    /// Hold the level until the operator acknowledges a cleared condition.
    ManualAck,
}

impl ResetMode {
    pub fn code(self) -> u8 {
        match self {
            Self::AutoReset => 0,
            Self::ManualAck => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::AutoReset),
            1 => Some(Self::ManualAck),
            _ => None,
        }
    }
}
