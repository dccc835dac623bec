//! # Drive library.
//!
//! Control core of a four module swerve drivetrain: wheel module control,
//! chassis kinematics, odometry and the galactic search path finder. The
//! `drive_exec` binary runs this core in a fixed period loop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Chassis controller - turns velocity commands into module setpoints and keeps the pose estimate
pub mod chassis;

/// Data store - state shared between the parts of the executable's main loop
pub mod data_store;

/// Executable commands - commands accepted from command scripts
pub mod exec_cmd;

/// Hardware capabilities - traits implemented by motor, sensor and vision drivers, and simulations
pub mod hw;

/// Kinematics - conversion between chassis velocity and module states
pub mod kinematics;

/// Pose estimation - odometry from the gyro and the module states
pub mod pose_est;

/// Target finder - selects the galactic search path from a vision detection
pub mod target_finder;

/// Wheel module - control of a single driven and steered wheel
pub mod wheel_module;
