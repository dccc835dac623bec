//! Implementations for the WheelModule state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::f64::consts::{FRAC_PI_2, PI};
use std::time::Instant;
use log::trace;
use serde::Serialize;

// Internal
use super::{
    ContinuousAngle, ModuleId, ModuleParams, ModuleState, PidController,
    SimpleMotorFeedforward,
};
use crate::hw::{AngleSensor, MotorController};
use util::maths::{clamp, get_ang_dist_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single swerve module bound to its hardware.
pub struct WheelModule {
    id: ModuleId,
    params: ModuleParams,

    drive_motor: Box<dyn MotorController>,
    steer_motor: Box<dyn MotorController>,
    steer_sensor: Box<dyn AngleSensor>,

    /// Continuous steer angle, already corrected for the calibration offset.
    angle: ContinuousAngle,

    drive_ctrl: PidController,
    steer_ctrl: PidController,
    drive_ff: SimpleMotorFeedforward,

    /// Previous desired speed and when it was demanded, used to estimate the
    /// desired acceleration.
    prev_demand: Option<(f64, Instant)>,
}

/// The outcome of a single call to [`WheelModule::set_desired_state`].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ModuleOutput {
    /// State measured at the start of the call.
    pub measured: ModuleState,

    /// Setpoint actually tracked. The angle is continuous, next to the
    /// measured angle, and the speed is negated if the module reversed.
    pub target: ModuleState,

    /// Signed shortest steer error.
    ///
    /// Units: radians
    pub steer_error_rad: f64,

    /// Units: volts
    pub drive_volts: f64,

    /// Units: volts
    pub steer_volts: f64,

    /// True if the module steered to the opposite angle and reversed.
    pub reversed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelModule {
    /// Bind a new module to its hardware.
    pub fn new(
        id: ModuleId,
        params: ModuleParams,
        drive_motor: Box<dyn MotorController>,
        steer_motor: Box<dyn MotorController>,
        steer_sensor: Box<dyn AngleSensor>,
    ) -> Self {
        Self {
            id,
            drive_ctrl: PidController::new(params.drive_gains),
            steer_ctrl: PidController::new(params.steer_gains),
            drive_ff: SimpleMotorFeedforward::new(params.drive_ff),
            params,
            drive_motor,
            steer_motor,
            steer_sensor,
            angle: ContinuousAngle::new(),
            prev_demand: None,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Position of the module in the robot body frame.
    pub fn pos_m_rb(&self) -> [f64; 2] {
        self.params.pos_m_rb
    }

    /// Read the module's sensors.
    ///
    /// The returned angle is continuous: it is unwrapped from the bounded
    /// sensor reading on every call.
    pub fn get_state(&mut self) -> ModuleState {
        let raw_rad = get_ang_dist_pi(
            self.params.steer_offset_rad,
            self.steer_sensor.absolute_position_rad(),
        );

        ModuleState {
            speed_ms: self.drive_speed_ms(),
            angle_rad: self.angle.update(raw_rad),
        }
    }

    /// Drive the module towards the desired state.
    ///
    /// The steer loop acts on the signed shortest distance to the desired
    /// angle, so the module never turns more than half a revolution. With
    /// speed reversal enabled it never turns more than a quarter revolution,
    /// driving backwards instead.
    pub fn set_desired_state(&mut self, desired: ModuleState, now: Instant) -> ModuleOutput {
        let measured = self.get_state();

        let mut steer_error_rad = get_ang_dist_pi(measured.angle_rad, desired.angle_rad);
        let mut speed_ms = desired.speed_ms;
        let mut reversed = false;

        if self.params.allow_speed_reversal && steer_error_rad.abs() > FRAC_PI_2 {
            steer_error_rad -= PI.copysign(steer_error_rad);
            speed_ms = -speed_ms;
            reversed = true;
        }

        // Steer loop
        let steer_volts = clamp(
            &self.steer_ctrl.get(steer_error_rad, now),
            &-self.params.max_steer_volts,
            &self.params.max_steer_volts,
        );

        // Drive loop, feedback plus feedforward
        let accel_mss = match self.prev_demand {
            Some((prev_speed_ms, t0)) => match now.checked_duration_since(t0) {
                Some(d) if d.as_secs_f64() > 0.0 => (speed_ms - prev_speed_ms) / d.as_secs_f64(),
                _ => 0.0,
            },
            None => 0.0,
        };
        let accel_mss = clamp(
            &accel_mss,
            &-self.params.max_accel_mss,
            &self.params.max_accel_mss,
        );
        self.prev_demand = Some((speed_ms, now));

        let drive_volts = clamp(
            &(self.drive_ctrl.get(speed_ms - measured.speed_ms, now)
                + self.drive_ff.calculate(speed_ms, accel_mss)),
            &-self.params.max_drive_volts,
            &self.params.max_drive_volts,
        );

        self.steer_motor.set_voltage(steer_volts);
        self.drive_motor.set_voltage(drive_volts);

        trace!(
            "Module {}: target ({:.3} m/s, {:.3} rad), error {:.3} rad, volts (drv {:.2}, str {:.2})",
            self.id, speed_ms, measured.angle_rad + steer_error_rad,
            steer_error_rad, drive_volts, steer_volts
        );

        ModuleOutput {
            measured,
            target: ModuleState {
                speed_ms,
                angle_rad: measured.angle_rad + steer_error_rad,
            },
            steer_error_rad,
            drive_volts,
            steer_volts,
            reversed,
        }
    }

    /// Remove all voltage from the motors and clear the controllers.
    pub fn neutral(&mut self) {
        self.drive_motor.set_voltage(0.0);
        self.steer_motor.set_voltage(0.0);
        self.drive_ctrl.reset();
        self.steer_ctrl.reset();
        self.prev_demand = None;
    }

    /// Linear speed of the wheel from the drive motor speed.
    fn drive_speed_ms(&self) -> f64 {
        self.drive_motor.velocity_rps() / self.params.drive_gear_ratio
            * PI
            * self.params.wheel_diameter_m
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hw::sim::{SimModuleHardware, SimPlantParams};
    use crate::wheel_module::{FeedforwardGains, PidGains};
    use std::time::Duration;
    use util::maths::wrap_pi;

    fn test_params() -> ModuleParams {
        ModuleParams {
            pos_m_rb: [0.3, 0.3],
            steer_offset_rad: 0.0,
            wheel_diameter_m: 0.1,
            drive_gear_ratio: 5.0,
            drive_gains: PidGains { k_p: 0.5, k_i: 0.0, k_d: 0.0 },
            drive_ff: FeedforwardGains { k_s: 0.0, k_v: 2.0, k_a: 0.0 },
            steer_gains: PidGains { k_p: 4.0, k_i: 0.0, k_d: 0.0 },
            max_drive_volts: 12.0,
            max_steer_volts: 12.0,
            max_accel_mss: 10.0,
            allow_speed_reversal: false,
        }
    }

    fn make_module(params: ModuleParams, encoder_offset_rad: f64) -> (WheelModule, SimModuleHardware) {
        let hw = SimModuleHardware::new(1, 2, encoder_offset_rad, SimPlantParams::default());
        let module = WheelModule::new(
            ModuleId::FrontLeft,
            params,
            Box::new(hw.drive_motor()),
            Box::new(hw.steer_motor()),
            Box::new(hw.encoder()),
        );
        (module, hw)
    }

    #[test]
    fn test_get_state() {
        let mut params = test_params();
        params.steer_offset_rad = 0.4;
        let (mut module, hw) = make_module(params, 0.4);

        // 10 rps through a 5:1 gearbox on a 0.1 m wheel
        hw.set_drive_rps(10.0);
        hw.set_steer_pos_rad(0.25);
        let state = module.get_state();
        assert!((state.speed_ms - 2.0 * PI * 0.1).abs() < 1e-12);
        assert!((state.angle_rad - 0.25).abs() < 1e-12);

        // Unwrap through the sensor boundary in steps
        for i in 1..=20 {
            hw.set_steer_pos_rad(0.25 + 0.5 * i as f64);
            module.get_state();
        }
        assert!((module.get_state().angle_rad - 10.25).abs() < 1e-9);
    }

    #[test]
    fn test_shortest_path_steering() {
        let (mut module, hw) = make_module(test_params(), 0.0);
        let t0 = Instant::now();

        // Measured just below +pi, desired just above -pi, so the short way
        // is a small positive rotation.
        hw.set_steer_pos_rad(PI - 0.1);
        let out = module.set_desired_state(ModuleState::new(0.0, -PI + 0.1), t0);
        assert!((out.steer_error_rad - 0.2).abs() < 1e-9);
        assert!(out.steer_volts > 0.0);
        assert!(!out.reversed);
        assert!((out.target.angle_rad - (PI + 0.1)).abs() < 1e-9);

        // A large error stays under half a turn without reversal
        hw.set_steer_pos_rad(0.0);
        let out = module.set_desired_state(ModuleState::new(1.0, 2.5), t0);
        assert!((out.steer_error_rad - 2.5).abs() < 1e-9);
        assert_eq!(out.target.speed_ms, 1.0);
        assert!(!out.reversed);
    }

    #[test]
    fn test_shortest_path_after_many_turns() {
        let (mut module, hw) = make_module(test_params(), 0.0);
        let t0 = Instant::now();

        // Accumulate 40 rad of rotation through the bounded sensor
        for i in 1..=100 {
            hw.set_steer_pos_rad(0.4 * i as f64);
            module.get_state();
        }
        let measured_rad = module.get_state().angle_rad;
        assert!((measured_rad - 40.0).abs() < 1e-9);

        for i in 0..360 {
            let desired_rad = (i as f64 - 180.0).to_radians();
            let out = module.set_desired_state(ModuleState::new(0.5, desired_rad), t0);

            assert!(out.steer_error_rad.abs() <= PI);
            assert!((out.steer_error_rad - wrap_pi(desired_rad - measured_rad)).abs() < 1e-9);
            assert!(wrap_pi(out.target.angle_rad - desired_rad).abs() < 1e-9);
        }
    }

    #[test]
    fn test_speed_reversal() {
        let mut params = test_params();
        params.allow_speed_reversal = true;
        let (mut module, hw) = make_module(params, 0.0);

        hw.set_steer_pos_rad(0.0);
        let out = module.set_desired_state(ModuleState::new(1.0, 2.5), Instant::now());
        assert!(out.reversed);
        assert!((out.steer_error_rad - (2.5 - PI)).abs() < 1e-9);
        assert_eq!(out.target.speed_ms, -1.0);
        assert!(out.drive_volts < 0.0);
    }

    #[test]
    fn test_closed_loop_tracking() {
        let (mut module, hw) = make_module(test_params(), 0.0);
        let t0 = Instant::now();
        let desired = ModuleState::new(1.5, -2.0);

        for i in 0..200 {
            module.set_desired_state(desired, t0 + Duration::from_millis(20 * i));
            hw.step(0.02);
        }

        let state = module.get_state();
        assert!(get_ang_dist_pi(state.angle_rad, desired.angle_rad).abs() < 1e-3);
        assert!((state.speed_ms - desired.speed_ms).abs() < 0.05);

        module.neutral();
        assert_eq!(hw.state().drive_volts, 0.0);
        assert_eq!(hw.state().steer_volts, 0.0);
    }
}
