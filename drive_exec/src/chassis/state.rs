//! Implementations for the ChassisController state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::convert::Infallible;
use std::time::Instant;
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::ChassisParams;
use crate::hw::Gyro;
use crate::kinematics::{ChassisKinematics, ChassisVelocityCommand};
use crate::pose_est::{Pose, PoseEstimator};
use crate::wheel_module::{ModuleState, WheelModule, NUM_MODULES};
use util::{maths::clamp, module::CyclicModule};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The drivetrain of the robot.
pub struct ChassisController {
    params: ChassisParams,

    modules: [WheelModule; NUM_MODULES],
    gyro: Box<dyn Gyro>,

    kinematics: ChassisKinematics,
    pose_est: PoseEstimator,

    /// The last accepted command, held while no new command arrives.
    last_cmd: ChassisVelocityCommand,
}

/// Input data to the chassis controller.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// The new velocity command, or `None` to keep executing the last one.
    pub cmd: Option<ChassisVelocityCommand>,

    /// Time of the cycle.
    pub now: Instant,
}

/// Output of one chassis control cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutputData {
    /// Module setpoints after normalisation.
    pub setpoints: [ModuleState; NUM_MODULES],

    /// Module states measured during the cycle.
    pub measured: [ModuleState; NUM_MODULES],

    /// Pose estimate at the end of the cycle.
    pub pose: Pose,
}

/// Status report for one chassis control cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Factor applied to all module speeds by normalisation, if any.
    pub speed_scale: Option<f64>,

    /// True if the new command was rejected and the last one held instead.
    pub cmd_rejected: bool,

    /// Which modules drove reversed to shorten their steering.
    pub reversed: [bool; NUM_MODULES],
}

/// Everything produced by one chassis control cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CycleReport {
    pub output: OutputData,
    pub status: StatusReport,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisController {
    pub(crate) fn new(
        params: ChassisParams,
        modules: [WheelModule; NUM_MODULES],
        gyro: Box<dyn Gyro>,
        kinematics: ChassisKinematics,
        pose_est: PoseEstimator,
    ) -> Self {
        Self {
            params,
            modules,
            gyro,
            kinematics,
            pose_est,
            last_cmd: ChassisVelocityCommand::stop(),
        }
    }

    /// Execute one control cycle with a new command.
    pub fn drive(&mut self, cmd: ChassisVelocityCommand) -> CycleReport {
        self.drive_at(Some(cmd), Instant::now())
    }

    /// Execute one control cycle at time `now`.
    ///
    /// With no new command the last accepted command is held. A command with
    /// non-finite components is rejected and the last command held instead.
    pub fn drive_at(&mut self, cmd: Option<ChassisVelocityCommand>, now: Instant) -> CycleReport {
        let mut status = StatusReport::default();

        if let Some(cmd) = cmd {
            if cmd.is_finite() {
                self.last_cmd = cmd;
            }
            else {
                warn!("Rejected non-finite drive command {:?}, holding {:?}", cmd, self.last_cmd);
                status.cmd_rejected = true;
            }
        }

        // One heading snapshot for the whole cycle
        let gyro_heading_rad = self.gyro.continuous_heading_rad();
        let field_heading_rad = self.pose_est.field_heading_rad(gyro_heading_rad);

        let speeds = self.last_cmd.to_chassis_speeds(field_heading_rad);
        let mut setpoints = self.kinematics.to_module_states(&speeds);

        status.speed_scale = ChassisKinematics::desaturate(&mut setpoints, self.params.max_speed_ms);
        if let Some(s) = status.speed_scale {
            trace!("Module speeds scaled by {:.3} to respect the speed limit", s);
        }

        let mut measured = [ModuleState::default(); NUM_MODULES];
        for (i, module) in self.modules.iter_mut().enumerate() {
            let out = module.set_desired_state(setpoints[i], now);
            measured[i] = out.measured;
            status.reversed[i] = out.reversed;
        }

        let pose = self.pose_est.update(now, gyro_heading_rad, &measured);

        trace!(
            "Chassis cycle: cmd {:?}, pose ({:.3}, {:.3}, {:.1} deg)",
            self.last_cmd, pose.x_m, pose.y_m, pose.heading_wrapped_deg()
        );

        CycleReport {
            output: OutputData {
                setpoints,
                measured,
                pose,
            },
            status,
        }
    }

    /// Execute one control cycle with inputs given as fractions of the
    /// maximum speeds. Inputs are limited to [-1, 1].
    pub fn drive_percent(
        &mut self,
        drive: f64,
        strafe: f64,
        rotate: f64,
        field_relative: bool,
        now: Instant,
    ) -> CycleReport {
        let cmd = self.percent_cmd(drive, strafe, rotate, field_relative);
        self.drive_at(Some(cmd), now)
    }

    /// Velocity command for inputs given as fractions of the maximum speeds.
    pub fn percent_cmd(
        &self,
        drive: f64,
        strafe: f64,
        rotate: f64,
        field_relative: bool,
    ) -> ChassisVelocityCommand {
        ChassisVelocityCommand {
            vx_ms: clamp(&drive, &-1.0, &1.0) * self.params.max_speed_ms,
            vy_ms: clamp(&strafe, &-1.0, &1.0) * self.params.max_speed_ms,
            omega_rads: clamp(&rotate, &-1.0, &1.0) * self.params.max_angular_speed_rads,
            field_relative,
        }
    }

    /// Stop the chassis and steer every module to point forward.
    pub fn zero_align_modules(&mut self, now: Instant) -> CycleReport {
        debug!("Aligning all modules to zero");
        self.kinematics.reset_held_angles([0.0; NUM_MODULES]);
        self.drive_at(Some(ChassisVelocityCommand::stop()), now)
    }

    /// Replace the pose estimate.
    pub fn reset_pose(&mut self, pose: Pose) {
        debug!("Pose reset to {:?}", pose);
        self.pose_est.reset(pose, self.gyro.continuous_heading_rad());
    }

    /// Redefine the current heading of the robot, keeping its position.
    pub fn rezero_heading(&mut self, heading_rad: f64) {
        self.gyro.rezero(heading_rad);

        let mut pose = self.pose_est.pose();
        pose.heading_rad = heading_rad;
        self.pose_est.reset(pose, self.gyro.continuous_heading_rad());
    }

    /// Remove all power from the modules.
    pub fn neutral(&mut self) {
        self.last_cmd = ChassisVelocityCommand::stop();
        for m in self.modules.iter_mut() {
            m.neutral();
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose_est.pose()
    }

    pub fn params(&self) -> &ChassisParams {
        &self.params
    }

    pub fn kinematics(&self) -> &ChassisKinematics {
        &self.kinematics
    }

    pub fn last_cmd(&self) -> ChassisVelocityCommand {
        self.last_cmd
    }
}

impl CyclicModule for ChassisController {
    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = Infallible;

    /// Perform one control cycle. Per-cycle problems are reported in the
    /// status report, the cycle itself never fails.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let report = self.drive_at(input_data.cmd, input_data.now);
        Ok((report.output, report.status))
    }
}
