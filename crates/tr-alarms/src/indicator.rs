//! Indicator signals derived from alarm state.

use serde::{Deserialize, Serialize};

use crate::evaluator::AlarmState;
use crate::level::AlarmLevel;

/// The two indicator outputs of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Indicators {
    pub warning: bool,
    pub alarm: bool,
}

impl Indicators {
    /// Unacknowledged active alarms light their indicator; acknowledging
    /// silences it without clearing the condition.
    pub fn from_state(state: &AlarmState) -> Self {
        let sounding = state.active && !state.acknowledged;
        Self {
            warning: sounding && state.level == AlarmLevel::Warning,
            alarm: sounding && state.level >= AlarmLevel::Alarm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(level: AlarmLevel, active: bool, acknowledged: bool) -> AlarmState {
        AlarmState {
            level,
            active,
            acknowledged,
            ..AlarmState::default()
        }
    }

    #[test]
    fn warning_and_alarm_are_exclusive() {
        let w = Indicators::from_state(&state(AlarmLevel::Warning, true, false));
        assert!(w.warning && !w.alarm);

        let a = Indicators::from_state(&state(AlarmLevel::Alarm, true, false));
        assert!(!a.warning && a.alarm);

        let t = Indicators::from_state(&state(AlarmLevel::Technical, true, false));
        assert!(!t.warning && t.alarm);
    }

    #[test]
    fn acknowledged_or_inactive_is_silent() {
        assert_eq!(
            Indicators::from_state(&state(AlarmLevel::Alarm, true, true)),
            Indicators::default()
        );
        assert_eq!(
            Indicators::from_state(&state(AlarmLevel::Technical, false, false)),
            Indicators::default()
        );
    }
}
