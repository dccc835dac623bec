//! Builder binding the chassis to its hardware

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;

// Internal
use super::{ChassisController, ChassisError, ChassisParams, ConfigurationError};
use crate::hw::{AngleSensor, Gyro, MotorController};
use crate::kinematics::ChassisKinematics;
use crate::pose_est::{Pose, PoseEstimator};
use crate::wheel_module::{ModuleId, WheelModule, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Hardware handles of one module.
struct ModuleHardware {
    drive_motor: Box<dyn MotorController>,
    steer_motor: Box<dyn MotorController>,
    steer_sensor: Box<dyn AngleSensor>,
}

/// Collects the hardware of the chassis. Building fails if any module slot or
/// the gyro has not been provided.
pub struct ChassisBuilder {
    params: ChassisParams,
    modules: [Option<ModuleHardware>; NUM_MODULES],
    gyro: Option<Box<dyn Gyro>>,
    initial_pose: Pose,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisBuilder {
    pub fn new(params: ChassisParams) -> Self {
        Self {
            params,
            modules: [None, None, None, None],
            gyro: None,
            initial_pose: Pose::default(),
        }
    }

    /// Start a builder from a parameter file relative to the params
    /// directory.
    pub fn from_param_file(param_file_path: &str) -> Result<Self, ChassisError> {
        let params: ChassisParams = util::params::load(param_file_path)?;
        Ok(Self::new(params))
    }

    pub fn params(&self) -> &ChassisParams {
        &self.params
    }

    /// Bind the hardware of the module in slot `id`.
    pub fn module(
        mut self,
        id: ModuleId,
        drive_motor: Box<dyn MotorController>,
        steer_motor: Box<dyn MotorController>,
        steer_sensor: Box<dyn AngleSensor>,
    ) -> Self {
        self.modules[id.index()] = Some(ModuleHardware {
            drive_motor,
            steer_motor,
            steer_sensor,
        });
        self
    }

    pub fn gyro(mut self, gyro: Box<dyn Gyro>) -> Self {
        self.gyro = Some(gyro);
        self
    }

    /// Pose of the robot when the chassis starts. Defaults to the field
    /// origin facing along +x.
    pub fn initial_pose(mut self, pose: Pose) -> Self {
        self.initial_pose = pose;
        self
    }

    pub fn build(self) -> Result<ChassisController, ChassisError> {
        self.params.validate()?;

        let kinematics = ChassisKinematics::new(self.params.module_pos_m_rb)
            .map_err(ConfigurationError::from)?;

        let gyro = self.gyro.ok_or(ConfigurationError::MissingGyro)?;

        let params = self.params;
        let bind = |id: ModuleId, hw: Option<ModuleHardware>| {
            let hw = hw.ok_or(ConfigurationError::MissingModule(id))?;
            info!(
                "Module {} bound to drive motor {} and steer motor {}",
                id, hw.drive_motor.id(), hw.steer_motor.id()
            );
            Ok::<_, ConfigurationError>(WheelModule::new(
                id,
                params.module_params(id),
                hw.drive_motor,
                hw.steer_motor,
                hw.steer_sensor,
            ))
        };

        let [fl, fr, bl, br] = self.modules;
        let modules = [
            bind(ModuleId::FrontLeft, fl)?,
            bind(ModuleId::FrontRight, fr)?,
            bind(ModuleId::BackLeft, bl)?,
            bind(ModuleId::BackRight, br)?,
        ];

        let pose_est = PoseEstimator::new(
            kinematics.clone(),
            self.initial_pose,
            gyro.continuous_heading_rad(),
        );

        Ok(ChassisController::new(params, modules, gyro, kinematics, pose_est))
    }
}
