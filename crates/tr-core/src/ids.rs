use core::fmt;

use crate::error::{TrError, TrResult};

/// Number of regulation channels. Fixed at compile time.
pub const NUM_CHANNELS: usize = 3;

/// Number of logical temperature sensors (3 RTD slots followed by 3 one-wire slots).
pub const NUM_SENSORS: usize = 6;

/// Index of a regulation channel, always `< NUM_CHANNELS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i64", into = "i64"))]
pub struct ChannelId(u8);

impl ChannelId {
    /// Validate a raw index coming from configuration or the wire.
    pub fn new(index: i64) -> TrResult<Self> {
        if (0..NUM_CHANNELS as i64).contains(&index) {
            Ok(Self(index as u8))
        } else {
            Err(TrError::IndexOob {
                what: "channel",
                index,
                len: NUM_CHANNELS,
            })
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All channels in ascending order.
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..NUM_CHANNELS as u8).map(ChannelId)
    }
}

impl TryFrom<i64> for ChannelId {
    type Error = TrError;

    fn try_from(index: i64) -> TrResult<Self> {
        Self::new(index)
    }
}

impl From<ChannelId> for i64 {
    fn from(id: ChannelId) -> Self {
        id.0 as i64
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a logical sensor, always `< NUM_SENSORS`.
///
/// "No sensor assigned" is `Option<SensorId>::None`; on the wire it is `-1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i64", into = "i64"))]
pub struct SensorId(u8);

impl SensorId {
    pub fn new(index: i64) -> TrResult<Self> {
        if (0..NUM_SENSORS as i64).contains(&index) {
            Ok(Self(index as u8))
        } else {
            Err(TrError::IndexOob {
                what: "sensor",
                index,
                len: NUM_SENSORS,
            })
        }
    }

    /// Decode the wire form, where any negative value means "unassigned".
    pub fn from_wire(index: i64) -> TrResult<Option<Self>> {
        if index < 0 {
            Ok(None)
        } else {
            Self::new(index).map(Some)
        }
    }

    /// Encode an optional assignment in wire form.
    pub fn to_wire(id: Option<Self>) -> i64 {
        id.map_or(-1, |s| s.0 as i64)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = SensorId> {
        (0..NUM_SENSORS as u8).map(SensorId)
    }
}

impl TryFrom<i64> for SensorId {
    type Error = TrError;

    fn try_from(index: i64) -> TrResult<Self> {
        Self::new(index)
    }
}

impl From<SensorId> for i64 {
    fn from(id: SensorId) -> Self {
        id.0 as i64
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorId({})", self.0)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
