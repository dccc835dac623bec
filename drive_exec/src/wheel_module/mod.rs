//! # Wheel module
//!
//! A wheel module is one independently driven and steered wheel of the
//! swerve chassis. It owns its drive motor, steer motor and absolute steer
//! encoder, and closes both the steer angle and drive speed loops.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod angle;
mod controllers;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use angle::*;
pub use controllers::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of wheel modules on the chassis.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Speed and angle of a single module, either measured or desired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    /// Linear speed of the wheel, signed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Steer angle of the module, counter-clockwise positive from robot
    /// forward. Measured angles are continuous, desired angles may be given
    /// in any range.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// The constant configuration of a single module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleParams {
    /// Position of the module in the robot body frame.
    ///
    /// Units: meters
    pub pos_m_rb: [f64; 2],

    /// Absolute encoder reading when the module points straight forward.
    ///
    /// Units: radians
    pub steer_offset_rad: f64,

    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Motor rotations per wheel rotation.
    pub drive_gear_ratio: f64,

    pub drive_gains: PidGains,

    pub drive_ff: FeedforwardGains,

    pub steer_gains: PidGains,

    /// Units: volts
    pub max_drive_volts: f64,

    /// Units: volts
    pub max_steer_volts: f64,

    /// Limit on the desired acceleration fed into the feedforward.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Steer to the opposite angle and reverse the wheel when that is
    /// closer than the desired angle.
    pub allow_speed_reversal: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The logical slot a module occupies on the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleId {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleId {
    /// All module slots in chassis order.
    pub const ALL: [ModuleId; NUM_MODULES] = [
        ModuleId::FrontLeft,
        ModuleId::FrontRight,
        ModuleId::BackLeft,
        ModuleId::BackRight,
    ];

    /// Index of the slot into per-module arrays.
    pub fn index(self) -> usize {
        match self {
            ModuleId::FrontLeft => 0,
            ModuleId::FrontRight => 1,
            ModuleId::BackLeft => 2,
            ModuleId::BackRight => 3,
        }
    }

    /// Short name of the slot used in log messages.
    pub fn name(self) -> &'static str {
        match self {
            ModuleId::FrontLeft => "FL",
            ModuleId::FrontRight => "FR",
            ModuleId::BackLeft => "BL",
            ModuleId::BackRight => "BR",
        }
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ModuleState {
    pub fn new(speed_ms: f64, angle_rad: f64) -> Self {
        Self { speed_ms, angle_rad }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_module_id_order() {
        for (i, id) in ModuleId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(format!("{}", ModuleId::BackLeft), "BL");
    }
}
