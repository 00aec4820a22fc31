//! External enable signals.

use tr_core::{ChannelId, NUM_CHANNELS};

/// Per-channel enable signal, independent of alarm gating.
pub trait EnableInput {
    fn is_enabled(&self, channel: ChannelId) -> bool;

    fn set_enabled(&mut self, channel: ChannelId, enabled: bool);

    /// Set `channel` to `explicit`, or invert it when `None`. Returns the new value.
    fn toggle(&mut self, channel: ChannelId, explicit: Option<bool>) -> bool {
        let enabled = explicit.unwrap_or(!self.is_enabled(channel));
        self.set_enabled(channel, enabled);
        enabled
    }
}

/// Enable flags held in memory. All channels start disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnableLatch {
    enabled: [bool; NUM_CHANNELS],
}

impl EnableLatch {
    pub fn new(enabled: [bool; NUM_CHANNELS]) -> Self {
        Self { enabled }
    }
}

impl EnableInput for EnableLatch {
    fn is_enabled(&self, channel: ChannelId) -> bool {
        self.enabled[channel.index()]
    }

    fn set_enabled(&mut self, channel: ChannelId, enabled: bool) {
        self.enabled[channel.index()] = enabled;
    }
}
