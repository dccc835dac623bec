//! # Simulated hardware
//!
//! Simple plant models implementing the hardware capability traits, used by
//! the executable when no real drivetrain is attached and by the unit tests.
//!
//! Each swerve module is modelled by one [`SimModuleHardware`] which hands
//! out a drive motor, a steer motor and an absolute encoder that all share
//! the same plant state. The plant must be stepped explicitly with
//! [`SimModuleHardware::step`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

// Internal
use super::{AngleSensor, Gyro, MotorController, VisionTable};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated module plant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimPlantParams {
    /// Steady state drive motor speed per volt.
    ///
    /// Units: (rotations/second)/volt
    pub drive_rps_per_volt: f64,

    /// Time constant of the drive motor's first order response.
    ///
    /// Units: seconds
    pub drive_time_const_s: f64,

    /// Rate of the steer axis per volt.
    ///
    /// Units: (radians/second)/volt
    pub steer_rads_per_volt: f64,
}

/// State of a simulated module plant.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SimPlantState {
    /// Voltage last demanded from the drive motor.
    pub drive_volts: f64,

    /// Voltage last demanded from the steer motor.
    pub steer_volts: f64,

    /// Drive motor shaft speed.
    ///
    /// Units: rotations/second
    pub drive_rps: f64,

    /// Continuous steer angle of the module.
    ///
    /// Units: radians
    pub steer_pos_rad: f64,

    /// Steer axis rate.
    ///
    /// Units: radians/second
    pub steer_rate_rads: f64,
}

struct SimPlant {
    params: SimPlantParams,
    state: SimPlantState,

    /// Angle read by the encoder when the module is at zero.
    encoder_offset_rad: f64,
}

/// The simulated hardware of one swerve module.
#[derive(Clone)]
pub struct SimModuleHardware {
    drive_id: u32,
    steer_id: u32,
    plant: Arc<Mutex<SimPlant>>,
}

/// A motor handed out by [`SimModuleHardware`].
pub struct SimMotor {
    id: u32,
    role: MotorRole,
    plant: Arc<Mutex<SimPlant>>,
}

/// The absolute steer encoder handed out by [`SimModuleHardware`].
pub struct SimEncoder {
    plant: Arc<Mutex<SimPlant>>,
}

/// A simulated gyro. Clones share the same heading.
#[derive(Clone, Default)]
pub struct SimGyro {
    heading_rad: Arc<Mutex<f64>>,
}

/// A vision table backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapVisionTable {
    entries: HashMap<String, f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum MotorRole {
    Drive,
    Steer,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimPlantParams {
    fn default() -> Self {
        Self {
            drive_rps_per_volt: 8.0,
            drive_time_const_s: 0.05,
            steer_rads_per_volt: 3.0,
        }
    }
}

impl SimModuleHardware {
    /// Create a new simulated module with the module at zero angle.
    pub fn new(
        drive_id: u32,
        steer_id: u32,
        encoder_offset_rad: f64,
        params: SimPlantParams,
    ) -> Self {
        Self {
            drive_id,
            steer_id,
            plant: Arc::new(Mutex::new(SimPlant {
                params,
                state: SimPlantState::default(),
                encoder_offset_rad,
            })),
        }
    }

    pub fn drive_motor(&self) -> SimMotor {
        SimMotor {
            id: self.drive_id,
            role: MotorRole::Drive,
            plant: self.plant.clone(),
        }
    }

    pub fn steer_motor(&self) -> SimMotor {
        SimMotor {
            id: self.steer_id,
            role: MotorRole::Steer,
            plant: self.plant.clone(),
        }
    }

    pub fn encoder(&self) -> SimEncoder {
        SimEncoder {
            plant: self.plant.clone(),
        }
    }

    /// Advance the plant by `dt_s` seconds using the last demanded voltages.
    pub fn step(&self, dt_s: f64) {
        if !(dt_s > 0.0) {
            return;
        }

        let mut plant = lock(&self.plant);
        let p = plant.params;
        let s = &mut plant.state;

        // Exact discretisation of the first order drive response
        let target_rps = p.drive_rps_per_volt * s.drive_volts;
        let alpha = if p.drive_time_const_s > 0.0 {
            1.0 - (-dt_s / p.drive_time_const_s).exp()
        }
        else {
            1.0
        };
        s.drive_rps += (target_rps - s.drive_rps) * alpha;

        s.steer_rate_rads = p.steer_rads_per_volt * s.steer_volts;
        s.steer_pos_rad += s.steer_rate_rads * dt_s;
    }

    /// Get a copy of the plant state.
    pub fn state(&self) -> SimPlantState {
        lock(&self.plant).state
    }

    /// Force the drive motor speed.
    pub fn set_drive_rps(&self, drive_rps: f64) {
        lock(&self.plant).state.drive_rps = drive_rps;
    }

    /// Force the continuous steer angle of the module.
    pub fn set_steer_pos_rad(&self, steer_pos_rad: f64) {
        lock(&self.plant).state.steer_pos_rad = steer_pos_rad;
    }
}

impl MotorController for SimMotor {
    fn id(&self) -> u32 {
        self.id
    }

    fn set_voltage(&mut self, volts: f64) {
        let mut plant = lock(&self.plant);
        match self.role {
            MotorRole::Drive => plant.state.drive_volts = volts,
            MotorRole::Steer => plant.state.steer_volts = volts,
        }
    }

    fn velocity_rps(&self) -> f64 {
        let plant = lock(&self.plant);
        match self.role {
            MotorRole::Drive => plant.state.drive_rps,
            MotorRole::Steer => plant.state.steer_rate_rads / std::f64::consts::TAU,
        }
    }
}

impl AngleSensor for SimEncoder {
    fn absolute_position_rad(&self) -> f64 {
        let plant = lock(&self.plant);
        wrap_pi(plant.state.steer_pos_rad + plant.encoder_offset_rad)
    }
}

impl SimGyro {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate the simulated robot by `delta_rad`.
    pub fn advance(&self, delta_rad: f64) {
        *lock(&self.heading_rad) += delta_rad;
    }
}

impl Gyro for SimGyro {
    fn continuous_heading_rad(&self) -> f64 {
        *lock(&self.heading_rad)
    }

    fn rezero(&mut self, heading_rad: f64) {
        *lock(&self.heading_rad) = heading_rad;
    }
}

impl MapVisionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

impl VisionTable for MapVisionTable {
    fn get_number(&self, key: &str, default: f64) -> f64 {
        self.entries.get(key).copied().unwrap_or(default)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Lock a plant mutex. A poisoned lock still holds a usable plant state.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_module_plant() {
        let hw = SimModuleHardware::new(1, 2, 0.5, SimPlantParams::default());
        let mut drive = hw.drive_motor();
        let mut steer = hw.steer_motor();
        let enc = hw.encoder();

        assert_eq!(drive.id(), 1);
        assert_eq!(steer.id(), 2);
        assert!((enc.absolute_position_rad() - 0.5).abs() < 1e-12);

        drive.set_voltage(6.0);
        steer.set_voltage(1.0);
        for _ in 0..100 {
            hw.step(0.02);
        }

        // Drive settles on the steady state speed
        assert!((drive.velocity_rps() - 48.0).abs() < 1e-6);

        // Steer integrates, encoder wraps
        let state = hw.state();
        assert!((state.steer_pos_rad - 6.0).abs() < 1e-9);
        assert!((enc.absolute_position_rad() - wrap_pi(6.5)).abs() < 1e-9);
        assert!(enc.absolute_position_rad() <= PI);
        assert!((steer.velocity_rps() - 3.0 / std::f64::consts::TAU).abs() < 1e-12);
    }

    #[test]
    fn test_gyro_and_table() {
        let mut gyro = SimGyro::new();
        let shared = gyro.clone();
        shared.advance(3.0 * PI / 2.0);
        assert!((gyro.continuous_heading_rad() - 3.0 * PI / 2.0).abs() < 1e-12);
        assert!((gyro.yaw_deg() + 90.0).abs() < 1e-9);

        gyro.rezero(0.0);
        assert_eq!(shared.continuous_heading_rad(), 0.0);

        let mut table = MapVisionTable::new();
        assert_eq!(table.get_number("GS Distance", 999.9), 999.9);
        table.set_number("GS Distance", 1.5);
        assert_eq!(table.get_number("GS Distance", 999.9), 1.5);
        table.remove("GS Distance");
        assert_eq!(table.get_number("GS Distance", 999.9), 999.9);
    }
}
