//! # Hardware capability module
//!
//! The control core never talks to a concrete vendor driver. Instead each
//! piece of hardware is reached through one of the capability traits below,
//! and every vendor (or the simulation in [`sim`]) provides an
//! implementation of it.
//!
//! All reads are non-blocking snapshots of values the driver has already
//! cached. Commands issued to a faulted actuator are silently absorbed by the
//! driver, so none of the methods here are fallible.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::wrap_180_deg;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A motor controller able to accept a voltage demand and report the speed
/// of its motor.
pub trait MotorController: Send {
    /// The bus identifier of the controller, used in log messages.
    fn id(&self) -> u32;

    /// Demand a voltage from the controller.
    ///
    /// Units: volts
    fn set_voltage(&mut self, volts: f64);

    /// The measured velocity of the motor shaft.
    ///
    /// Units: rotations/second
    fn velocity_rps(&self) -> f64;
}

/// An absolute angle sensor, such as the magnetic encoder on a steer axis.
pub trait AngleSensor: Send {
    /// Absolute position of the sensor.
    ///
    /// Units: radians, in the range (-pi, pi]
    fn absolute_position_rad(&self) -> f64;
}

/// A gyro providing the heading of the robot.
pub trait Gyro: Send {
    /// Continuous heading of the robot, counter-clockwise positive. This
    /// value is not wrapped and keeps accumulating over multiple turns.
    ///
    /// Units: radians
    fn continuous_heading_rad(&self) -> f64;

    /// Heading of the robot normalised into (-180, 180].
    ///
    /// Units: degrees
    fn yaw_deg(&self) -> f64 {
        wrap_180_deg(self.continuous_heading_rad().to_degrees())
    }

    /// Redefine the current heading of the robot.
    fn rezero(&mut self, heading_rad: f64);
}

/// A shared key-value table which vision results are published into.
pub trait VisionTable {
    /// Get the number stored against `key`, or `default` if there is no such
    /// entry.
    fn get_number(&self, key: &str, default: f64) -> f64;
}
