//! # Wheel module controllers
//!
//! This module provides the PID controller used on both the drive and steer
//! axes, and the feedforward model of the drive axis.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a PID controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
}

/// Gains of a permanent magnet DC motor feedforward model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedforwardGains {
    /// Static friction voltage.
    ///
    /// Units: volts
    pub k_s: f64,

    /// Units: volts/(meters/second)
    pub k_v: f64,

    /// Units: volts/(meters/second^2)
    pub k_a: f64,
}

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Previous instant that the error was passed in
    #[serde(skip)]
    prev_time: Option<Instant>,

    gains: PidGains,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

/// Feedforward voltage for a motor following a velocity profile.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SimpleMotorFeedforward {
    gains: FeedforwardGains,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0f64,
            prev_time: None,
            prev_error: None,
        }
    }

    /// Get the value of the controller for the given error at time `now`.
    ///
    /// The first call has no time difference so only the proportional term
    /// contributes. A call at the same (or an earlier) instant as the previous
    /// one does not accumulate the integral or produce a derivative.
    pub fn get(&mut self, error: f64, now: Instant) -> f64 {
        let dt = self.prev_time
            .and_then(|t0| now.checked_duration_since(t0))
            .map(|d| d.as_secs_f64())
            .filter(|&t| t > 0.0);

        if let Some(t) = dt {
            self.integral += error * t;
        }

        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64,
        };

        let out =
            self.gains.k_p * error
            + self.gains.k_i * self.integral
            + self.gains.k_d * deriv;

        // Remember the previous error and time
        self.prev_error = Some(error);
        if dt.is_some() || self.prev_time.is_none() {
            self.prev_time = Some(now);
        }

        out
    }

    /// Clear the integral and the error history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
        self.prev_time = None;
    }
}

impl SimpleMotorFeedforward {
    pub fn new(gains: FeedforwardGains) -> Self {
        Self { gains }
    }

    /// Voltage required to hold `velocity` while accelerating at `accel`.
    pub fn calculate(&self, velocity: f64, accel: f64) -> f64 {
        let sign = if velocity > 0.0 {
            1.0
        }
        else if velocity < 0.0 {
            -1.0
        }
        else {
            0.0
        };

        self.gains.k_s * sign + self.gains.k_v * velocity + self.gains.k_a * accel
    }
}
