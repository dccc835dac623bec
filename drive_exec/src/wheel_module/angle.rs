//! Continuous steer angle tracking

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::{get_ang_dist_pi, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Unwraps a bounded angle reading into a continuous angle.
///
/// Every new reading is assumed to be less than half a turn away from the
/// previous one, which holds as long as the steer axis turns less than pi
/// radians per control cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuousAngle {
    last_raw_rad: Option<f64>,
    continuous_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ContinuousAngle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a new bounded reading and return the continuous angle.
    ///
    /// The first reading initialises the accumulator.
    pub fn update(&mut self, raw_rad: f64) -> f64 {
        match self.last_raw_rad {
            Some(last) => self.continuous_rad += get_ang_dist_pi(last, raw_rad),
            None => self.continuous_rad = raw_rad,
        }
        self.last_raw_rad = Some(raw_rad);

        self.continuous_rad
    }

    /// The continuous angle at the last reading.
    pub fn continuous_rad(&self) -> f64 {
        self.continuous_rad
    }

    /// The last reading normalised into (-pi, pi].
    pub fn wrapped_rad(&self) -> f64 {
        wrap_pi(self.continuous_rad)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_unwrap_across_boundary() {
        let mut a = ContinuousAngle::new();
        assert_eq!(a.update(3.0), 3.0);

        // Crossing +pi into the negative half keeps increasing
        let c = a.update(-3.0);
        assert!((c - (2.0 * PI - 3.0)).abs() < 1e-12);

        // Keep turning for multiple revolutions
        let mut raw = -3.0;
        for _ in 0..40 {
            raw = wrap_pi(raw + 0.5);
            a.update(raw);
        }
        assert!((a.continuous_rad() - (2.0 * PI - 3.0 + 20.0)).abs() < 1e-9);
        assert!((a.wrapped_rad() - raw).abs() < 1e-9);

        // And back the other way
        let c = a.update(wrap_pi(raw - 1.0));
        assert!((c - (2.0 * PI - 3.0 + 19.0)).abs() < 1e-9);
    }
}
