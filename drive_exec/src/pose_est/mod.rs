//! # Pose estimation
//!
//! Dead reckoning of the robot pose on the field from the gyro heading and
//! the measured wheel module states.
//!
//! Translation comes from the module states through forward kinematics, the
//! change in heading comes from the gyro. The body frame displacement over
//! one update is integrated along a constant curvature arc (the SE(2)
//! exponential map) before being rotated into the field frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use log::warn;
use serde::{Deserialize, Serialize};

// Internal
use crate::kinematics::ChassisKinematics;
use crate::wheel_module::{ModuleState, NUM_MODULES};
use util::maths::{wrap_180_deg, wrap_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this heading change the arc integration uses its series expansion.
const SMALL_ANGLE_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose of the robot in the field frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Units: meters
    pub x_m: f64,

    /// Units: meters
    pub y_m: f64,

    /// Continuous heading, counter-clockwise positive from the field +x axis.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// Odometry of the chassis.
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    kinematics: ChassisKinematics,

    pose: Pose,

    /// Offset added to the gyro heading to get the field heading.
    heading_offset_rad: f64,

    prev_time: Option<Instant>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self { x_m, y_m, heading_rad }
    }

    /// Heading normalised into (-pi, pi].
    pub fn heading_wrapped_rad(&self) -> f64 {
        wrap_pi(self.heading_rad)
    }

    /// Heading normalised into (-180, 180].
    pub fn heading_wrapped_deg(&self) -> f64 {
        wrap_180_deg(self.heading_rad.to_degrees())
    }
}

impl PoseEstimator {
    /// Create a new estimator starting at `initial_pose`, with the gyro
    /// currently reading `gyro_heading_rad`.
    pub fn new(kinematics: ChassisKinematics, initial_pose: Pose, gyro_heading_rad: f64) -> Self {
        Self {
            kinematics,
            heading_offset_rad: initial_pose.heading_rad - gyro_heading_rad,
            pose: initial_pose,
            prev_time: None,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Field heading corresponding to a gyro heading.
    pub fn field_heading_rad(&self, gyro_heading_rad: f64) -> f64 {
        gyro_heading_rad + self.heading_offset_rad
    }

    /// Replace the pose estimate. Subsequent gyro headings are offset so that
    /// the current gyro reading corresponds to the new heading.
    pub fn reset(&mut self, pose: Pose, gyro_heading_rad: f64) {
        self.heading_offset_rad = pose.heading_rad - gyro_heading_rad;
        self.pose = pose;
    }

    /// Integrate the motion since the previous update.
    ///
    /// The first update only records the time. An update at the same instant
    /// as the previous one, or at an earlier one, leaves the pose unchanged.
    pub fn update(
        &mut self,
        now: Instant,
        gyro_heading_rad: f64,
        states: &[ModuleState; NUM_MODULES],
    ) -> Pose {
        let prev_time = match self.prev_time {
            Some(t) => t,
            None => {
                self.prev_time = Some(now);
                self.pose.heading_rad = self.field_heading_rad(gyro_heading_rad);
                return self.pose;
            }
        };

        let dt_s = match now.checked_duration_since(prev_time) {
            Some(d) => d.as_secs_f64(),
            None => {
                warn!("Pose update is earlier than the previous update, ignoring it");
                return self.pose;
            }
        };

        if dt_s <= 0.0 {
            return self.pose;
        }

        let speeds = self.kinematics.to_chassis_speeds(states);
        let new_heading_rad = self.field_heading_rad(gyro_heading_rad);
        let d_theta = new_heading_rad - self.pose.heading_rad;

        let (dx, dy) = arc_displacement(speeds.vx_ms * dt_s, speeds.vy_ms * dt_s, d_theta);

        // Rotate from the body frame at the start of the step into the field
        let (sin, cos) = self.pose.heading_rad.sin_cos();
        self.pose.x_m += dx * cos - dy * sin;
        self.pose.y_m += dx * sin + dy * cos;
        self.pose.heading_rad = new_heading_rad;

        self.prev_time = Some(now);

        self.pose
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Displacement in the body frame at the start of a step of an arc with
/// chord components `(dx, dy)` and heading change `d_theta`.
fn arc_displacement(dx: f64, dy: f64, d_theta: f64) -> (f64, f64) {
    let (s, c) = if d_theta.abs() < SMALL_ANGLE_RAD {
        (1.0 - d_theta * d_theta / 6.0, 0.5 * d_theta)
    }
    else {
        (d_theta.sin() / d_theta, (1.0 - d_theta.cos()) / d_theta)
    };

    (dx * s - dy * c, dx * c + dy * s)
}
