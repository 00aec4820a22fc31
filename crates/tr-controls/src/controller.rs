//! Control law implementations.
//!
//! Provides the three control laws a channel can run:
//! - **Pid**: parallel-form PID with fixed sample period
//! - **Hysteresis**: on/off control with a symmetric dead-band
//! - **Manual**: fixed operator-set output
//!
//! Laws are pure: they take their persistent memory by reference and return
//! the updated memory alongside the output, so the channel decides when a new
//! memory is committed.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Control law selector, as stored in the channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlLaw {
    #[default]
    Pid,
    Hysteresis,
    Manual,
}

impl ControlLaw {
    /// Wire code used by the command protocol.
    pub fn code(self) -> u8 {
        match self {
            Self::Pid => 0,
            Self::Hysteresis => 1,
            Self::Manual => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Pid),
            1 => Some(Self::Hysteresis),
            2 => Some(Self::Manual),
            _ => None,
        }
    }
}

/// PID gains in parallel form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (1/s).
    pub ki: f64,
    /// Derivative gain (s).
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 5.0,
            kd: 1.0,
        }
    }
}

impl PidGains {
    /// Check that every gain is finite and non-negative.
    pub fn validate(&self) -> ControlResult<()> {
        for (g, what) in [
            (self.kp, "kp must be finite and non-negative"),
            (self.ki, "ki must be finite and non-negative"),
            (self.kd, "kd must be finite and non-negative"),
        ] {
            if !g.is_finite() || g < 0.0 {
                return Err(ControlError::InvalidArg { what });
            }
        }
        Ok(())
    }
}

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidController {
    /// Controller gains.
    pub gains: PidGains,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
}

impl PidController {
    /// Create a new PID controller.
    ///
    /// # Errors
    ///
    /// Returns error if a gain is negative or non-finite, or if
    /// `out_min >= out_max`.
    pub fn new(gains: PidGains, out_min: f64, out_max: f64) -> ControlResult<Self> {
        gains.validate()?;
        if !(out_min < out_max) {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            gains,
            out_min,
            out_max,
        })
    }

    /// Compute controller output.
    ///
    /// The integral term is accumulated as output contribution and clamped to
    /// the output range, so a saturated controller cannot wind up. The
    /// derivative acts on the measurement, not the error, so setpoint steps
    /// do not kick the output.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller memory
    /// * `pv` - Process variable (measured value)
    /// * `sp` - Setpoint
    /// * `dt` - Sample period (seconds)
    pub fn update(&self, state: &PidState, pv: f64, sp: f64, dt: f64) -> (PidState, f64) {
        let error = sp - pv;

        let integral =
            (state.integral + self.gains.ki * dt * error).clamp(self.out_min, self.out_max);

        let d_input = match state.last_input {
            Some(last) if dt > 0.0 => (pv - last) / dt,
            _ => 0.0,
        };

        let output_raw = self.gains.kp * error + integral - self.gains.kd * d_input;
        let output = output_raw.clamp(self.out_min, self.out_max);

        let new_state = PidState {
            integral,
            last_input: Some(pv),
        };

        (new_state, output)
    }
}

/// PID controller memory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PidState {
    /// Accumulated integral contribution (output units).
    pub integral: f64,
    /// Previous measurement, for the derivative term.
    pub last_input: Option<f64>,
}

/// On/off controller with dead-band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HysteresisController {
    /// Half-width of the dead-band around the setpoint.
    pub hysteresis: f64,
    /// Output while switched on.
    pub on_output: f64,
}

impl HysteresisController {
    pub fn new(hysteresis: f64, on_output: f64) -> ControlResult<Self> {
        if !hysteresis.is_finite() || hysteresis < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "hysteresis must be finite and non-negative",
            });
        }
        Ok(Self {
            hysteresis,
            on_output,
        })
    }

    /// Switch on when `sp - pv > hysteresis`, off when `sp - pv < -hysteresis`,
    /// otherwise hold the latch. Returns the new latch and the output.
    pub fn update(&self, on: bool, pv: f64, sp: f64) -> (bool, f64) {
        let error = sp - pv;
        let on = if !on && error > self.hysteresis {
            true
        } else if on && error < -self.hysteresis {
            false
        } else {
            on
        };
        (on, if on { self.on_output } else { 0.0 })
    }
}

/// Persistent memory of the active control law, colocated with its variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LawMemory {
    Pid(PidState),
    Hysteresis { on: bool },
    Manual,
}

impl LawMemory {
    /// Fresh memory for `law`.
    pub fn for_law(law: ControlLaw) -> Self {
        match law {
            ControlLaw::Pid => Self::Pid(PidState::default()),
            ControlLaw::Hysteresis => Self::Hysteresis { on: false },
            ControlLaw::Manual => Self::Manual,
        }
    }

    pub fn law(&self) -> ControlLaw {
        match self {
            Self::Pid(_) => ControlLaw::Pid,
            Self::Hysteresis { .. } => ControlLaw::Hysteresis,
            Self::Manual => ControlLaw::Manual,
        }
    }
}
