//! Fault-code taxonomy.
//!
//! The numeric codes are the ones carried in the `errorCode` fields of the
//! command protocol.

use core::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u8", try_from = "u8"))]
pub enum FaultCode {
    #[default]
    None,
    /// Bad request on the command interface.
    Communication,
    /// Subsystem unavailable, or a channel enabled without a valid sensor.
    Configuration,
    SensorDisconnected,
    SensorTimeout,
}

impl FaultCode {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Communication => 1,
            Self::Configuration => 2,
            Self::SensorDisconnected => 3,
            Self::SensorTimeout => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Communication),
            2 => Some(Self::Configuration),
            3 => Some(Self::SensorDisconnected),
            4 => Some(Self::SensorTimeout),
            _ => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

impl From<FaultCode> for u8 {
    fn from(code: FaultCode) -> Self {
        code.code()
    }
}

impl TryFrom<u8> for FaultCode {
    type Error = crate::TrError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(crate::TrError::InvalidArg {
            what: "unknown fault code",
        })
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Communication => "communication",
            Self::Configuration => "configuration",
            Self::SensorDisconnected => "sensor disconnected",
            Self::SensorTimeout => "sensor timeout",
        };
        f.write_str(name)
    }
}
