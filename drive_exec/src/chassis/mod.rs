//! # Chassis control module
//!
//! The chassis controller owns the four wheel modules, the gyro, the
//! kinematics and the pose estimator of the drivetrain. Each control cycle it
//! turns one velocity command into module setpoints, drives the modules
//! towards them and updates the pose estimate, all from a single heading and
//! module state snapshot.
//!
//! There is exactly one chassis controller per drivetrain. It is built once
//! at startup with [`ChassisBuilder`] and then passed by reference to
//! whatever needs it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod builder;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
pub use builder::*;
pub use params::*;
pub use state::*;

use crate::kinematics::KinematicsError;
use crate::wheel_module::ModuleId;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors in the static configuration of the chassis. These are only raised
/// while building the chassis.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("No hardware was provided for the {0} module")]
    MissingModule(ModuleId),

    #[error("No gyro was provided")]
    MissingGyro,

    #[error("Parameter {0} must be positive and finite, found {1}")]
    NonPositive(&'static str, f64),

    #[error("Parameter {0} must be finite, found {1}")]
    NonFinite(&'static str, f64),

    #[error("Invalid module geometry: {0}")]
    Geometry(#[from] KinematicsError),
}

/// Errors which can occur while creating the chassis.
#[derive(Debug, Error)]
pub enum ChassisError {
    #[error("Could not load the chassis parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Chassis configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),
}
