//! Actuator and indicator outputs.

use tr_alarms::Indicators;
use tr_controls::ActuatorCommand;
use tr_core::{ChannelId, NUM_CHANNELS};

/// Receives what the engine emits for each channel every tick.
pub trait OutputSink {
    fn actuate(&mut self, channel: ChannelId, command: ActuatorCommand);

    fn indicate(&mut self, channel: ChannelId, indicators: Indicators);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn actuate(&mut self, _channel: ChannelId, _command: ActuatorCommand) {}

    fn indicate(&mut self, _channel: ChannelId, _indicators: Indicators) {}
}

/// Keeps the last command and indicator state per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    pub commands: [ActuatorCommand; NUM_CHANNELS],
    pub indicators: [Indicators; NUM_CHANNELS],
}

impl RecordingSink {
    pub fn command(&self, channel: ChannelId) -> ActuatorCommand {
        self.commands[channel.index()]
    }

    pub fn indicators(&self, channel: ChannelId) -> Indicators {
        self.indicators[channel.index()]
    }
}

impl OutputSink for RecordingSink {
    fn actuate(&mut self, channel: ChannelId, command: ActuatorCommand) {
        self.commands[channel.index()] = command;
    }

    fn indicate(&mut self, channel: ChannelId, indicators: Indicators) {
        self.indicators[channel.index()] = indicators;
    }
}
