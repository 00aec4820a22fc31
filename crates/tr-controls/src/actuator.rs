//! Actuator output scaling.
//!
//! A channel output lives in `[output_min, output_max]` engineering units.
//! The actuator driver takes a normalized value in `[0, 1]`, or the 8-bit PWM
//! duty derived from it, with `0` mapping to `0` and `output_max` to full scale.

use serde::{Deserialize, Serialize};

/// Full-scale PWM duty.
pub const DUTY_MAX: u8 = u8::MAX;

/// Command emitted to one actuator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// Clamped controller output.
    pub output: f64,
    /// Output scaled to [0, 1].
    pub normalized: f64,
    /// Output scaled to the PWM range, truncated.
    pub duty: u8,
}

impl ActuatorCommand {
    /// Scale `output` against `output_max`.
    ///
    /// A non-positive `output_max` has no usable scale and yields zero duty.
    ///
    /// # Example
    ///
    /// ```
    /// use tr_controls::ActuatorCommand;
    ///
    /// let cmd = ActuatorCommand::scale(127.5, 255.0);
    /// assert_eq!(cmd.duty, 127);
    /// assert!((cmd.normalized - 0.5).abs() < 1e-12);
    /// ```
    pub fn scale(output: f64, output_max: f64) -> Self {
        let normalized = if output_max > 0.0 && output.is_finite() {
            (output / output_max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            output,
            normalized,
            duty: (normalized * DUTY_MAX as f64) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale() {
        let cmd = ActuatorCommand::scale(100.0, 100.0);
        assert_eq!(cmd.duty, 255);
        assert_eq!(cmd.normalized, 1.0);
    }

    #[test]
    fn zero_and_negative_scale() {
        assert_eq!(ActuatorCommand::scale(0.0, 255.0).duty, 0);
        assert_eq!(ActuatorCommand::scale(10.0, 0.0).duty, 0);
        assert_eq!(ActuatorCommand::scale(-5.0, 255.0).normalized, 0.0);
    }
}
