//! Parameters structure for the chassis

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ConfigurationError;
use crate::wheel_module::{
    FeedforwardGains, ModuleId, ModuleParams, PidGains, NUM_MODULES,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the chassis. Per-module arrays are in module order (FL, FR,
/// BL, BR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChassisParams {

    // ---- GEOMETRY ----

    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Drive motor rotations per wheel rotation.
    pub drive_gear_ratio: f64,

    /// The position of each module in the robot body frame.
    ///
    /// Units: meters,
    /// Frame: Robot body
    pub module_pos_m_rb: [[f64; 2]; NUM_MODULES],

    /// Absolute encoder reading of each module when it points forward.
    ///
    /// Units: radians
    pub steer_offset_rad: [f64; NUM_MODULES],

    // ---- CAPABILITIES ----

    /// Maximum linear speed of any wheel.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Maximum rotation rate of the chassis, used to scale percentage
    /// commands.
    ///
    /// Units: radians/second
    pub max_angular_speed_rads: f64,

    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Units: volts
    pub max_drive_volts: f64,

    /// Units: volts
    pub max_steer_volts: f64,

    // ---- CONTROL ----

    pub drive_gains: PidGains,

    pub drive_ff: FeedforwardGains,

    pub steer_gains: PidGains,

    /// Reverse a wheel instead of steering it more than a quarter turn.
    #[serde(default)]
    pub allow_speed_reversal: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisParams {
    /// Check the physical constants of the chassis.
    ///
    /// Geometry is checked separately when the kinematics are built.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let positive = [
            ("wheel_diameter_m", self.wheel_diameter_m),
            ("drive_gear_ratio", self.drive_gear_ratio),
            ("max_speed_ms", self.max_speed_ms),
            ("max_angular_speed_rads", self.max_angular_speed_rads),
            ("max_accel_mss", self.max_accel_mss),
            ("max_drive_volts", self.max_drive_volts),
            ("max_steer_volts", self.max_steer_volts),
        ];

        for &(name, value) in positive.iter() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::NonPositive(name, value));
            }
        }

        for &offset in self.steer_offset_rad.iter() {
            if !offset.is_finite() {
                return Err(ConfigurationError::NonFinite("steer_offset_rad", offset));
            }
        }

        let gains = [
            self.drive_gains.k_p, self.drive_gains.k_i, self.drive_gains.k_d,
            self.steer_gains.k_p, self.steer_gains.k_i, self.steer_gains.k_d,
            self.drive_ff.k_s, self.drive_ff.k_v, self.drive_ff.k_a,
        ];
        for &g in gains.iter() {
            if !g.is_finite() {
                return Err(ConfigurationError::NonFinite("gains", g));
            }
        }

        Ok(())
    }

    /// The parameters of a single module.
    pub fn module_params(&self, id: ModuleId) -> ModuleParams {
        ModuleParams {
            pos_m_rb: self.module_pos_m_rb[id.index()],
            steer_offset_rad: self.steer_offset_rad[id.index()],
            wheel_diameter_m: self.wheel_diameter_m,
            drive_gear_ratio: self.drive_gear_ratio,
            drive_gains: self.drive_gains,
            drive_ff: self.drive_ff,
            steer_gains: self.steer_gains,
            max_drive_volts: self.max_drive_volts,
            max_steer_volts: self.max_steer_volts,
            max_accel_mss: self.max_accel_mss,
            allow_speed_reversal: self.allow_speed_reversal,
        }
    }
}
