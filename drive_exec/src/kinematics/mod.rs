//! # Swerve chassis kinematics
//!
//! Converts chassis velocities into the speed and angle of each wheel module
//! and back again.
//!
//! The robot body frame has +x forward, +y to the left and positive rotation
//! counter-clockwise about +z. The velocity of module `i` at position
//! `(x_i, y_i)` is the chassis translation plus `omega x r_i`:
//!
//! ```text
//! v_ix = vx - omega * y_i
//! v_iy = vy + omega * x_i
//! ```
//!
//! Stacking these two rows for every module gives an 8x3 matrix `A` mapping
//! the chassis velocity onto the module velocity vectors. Forward kinematics
//! takes the least squares solution using the pseudo-inverse of `A`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use crate::wheel_module::{ModuleState, NUM_MODULES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Singular values below this are treated as zero when checking the module
/// geometry.
const RANK_EPSILON: f64 = 1e-9;

/// Wheel speeds below this are treated as stationary, keeping the previous
/// angle of the module.
const STATIONARY_SPEED_MS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity of the chassis in the robot body frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: radians/second
    pub omega_rads: f64,
}

/// A velocity command for the chassis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisVelocityCommand {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: radians/second
    pub omega_rads: f64,

    /// If true the translation is given in the field frame, otherwise in the
    /// robot body frame.
    #[serde(default)]
    pub field_relative: bool,
}

/// Kinematics of a four module swerve chassis.
#[derive(Debug, Clone)]
pub struct ChassisKinematics {
    /// Module positions in the robot body frame.
    ///
    /// Units: meters
    module_pos_m_rb: [[f64; 2]; NUM_MODULES],

    /// Pseudo-inverse of the inverse kinematics matrix (3x8).
    fwd_matrix: DMatrix<f64>,

    /// Last angle commanded to each module, held while a module is stationary.
    last_angles_rad: [f64; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum KinematicsError {
    #[error("Module {0} has a non-finite position: {1:?}")]
    NonFinitePosition(usize, [f64; 2]),

    #[error(
        "The module positions are degenerate (rank {0} < 3), chassis velocity \
        cannot be recovered from the module states")]
    DegenerateGeometry(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisSpeeds {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self { vx_ms, vy_ms, omega_rads }
    }

    /// Convert a field frame velocity into the robot body frame, given the
    /// heading of the robot in the field.
    pub fn from_field_relative(
        vx_ms: f64,
        vy_ms: f64,
        omega_rads: f64,
        heading_rad: f64,
    ) -> Self {
        let (sin, cos) = heading_rad.sin_cos();

        // Rotate by minus the heading
        Self {
            vx_ms: vx_ms * cos + vy_ms * sin,
            vy_ms: -vx_ms * sin + vy_ms * cos,
            omega_rads,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.vx_ms == 0.0 && self.vy_ms == 0.0 && self.omega_rads == 0.0
    }
}

impl ChassisVelocityCommand {
    pub fn robot_relative(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self { vx_ms, vy_ms, omega_rads, field_relative: false }
    }

    pub fn field_relative(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self { vx_ms, vy_ms, omega_rads, field_relative: true }
    }

    /// A command which stops the chassis.
    pub fn stop() -> Self {
        Self::default()
    }

    /// True if every component of the command is finite.
    pub fn is_finite(&self) -> bool {
        self.vx_ms.is_finite() && self.vy_ms.is_finite() && self.omega_rads.is_finite()
    }

    /// Express the command in the robot body frame.
    pub fn to_chassis_speeds(&self, heading_rad: f64) -> ChassisSpeeds {
        if self.field_relative {
            ChassisSpeeds::from_field_relative(
                self.vx_ms, self.vy_ms, self.omega_rads, heading_rad
            )
        }
        else {
            ChassisSpeeds::new(self.vx_ms, self.vy_ms, self.omega_rads)
        }
    }
}

impl ChassisKinematics {
    /// Create the kinematics for the given module positions, in module order
    /// (FL, FR, BL, BR).
    pub fn new(module_pos_m_rb: [[f64; 2]; NUM_MODULES]) -> Result<Self, KinematicsError> {
        for (i, pos) in module_pos_m_rb.iter().enumerate() {
            if !pos[0].is_finite() || !pos[1].is_finite() {
                return Err(KinematicsError::NonFinitePosition(i, *pos));
            }
        }

        let inv_matrix = Self::inv_matrix(&module_pos_m_rb);

        let rank = inv_matrix.clone().svd(false, false).rank(RANK_EPSILON);
        if rank < 3 {
            return Err(KinematicsError::DegenerateGeometry(rank));
        }

        let fwd_matrix = inv_matrix
            .pseudo_inverse(RANK_EPSILON)
            .map_err(|_| KinematicsError::DegenerateGeometry(rank))?;

        Ok(Self {
            module_pos_m_rb,
            fwd_matrix,
            last_angles_rad: [0.0; NUM_MODULES],
        })
    }

    pub fn module_positions(&self) -> &[[f64; 2]; NUM_MODULES] {
        &self.module_pos_m_rb
    }

    /// Calculate the state of each module required to achieve the chassis
    /// speeds. Speeds are not normalised.
    ///
    /// Each angle is in (-pi, pi]. A module which would be stationary keeps
    /// the angle it was last given, so a zero command never rotates the
    /// modules.
    pub fn to_module_states(&mut self, speeds: &ChassisSpeeds) -> [ModuleState; NUM_MODULES] {
        let mut states = [ModuleState::default(); NUM_MODULES];

        for (i, pos) in self.module_pos_m_rb.iter().enumerate() {
            let v_x = speeds.vx_ms - speeds.omega_rads * pos[1];
            let v_y = speeds.vy_ms + speeds.omega_rads * pos[0];

            let speed_ms = v_x.hypot(v_y);

            if speeds.is_zero() || speed_ms < STATIONARY_SPEED_MS {
                states[i] = ModuleState::new(0.0, self.last_angles_rad[i]);
            }
            else {
                states[i] = ModuleState::new(speed_ms, v_y.atan2(v_x));
                self.last_angles_rad[i] = states[i].angle_rad;
            }
        }

        trace!("Module states: {:?}", states);

        states
    }

    /// Reset the angles held for stationary modules.
    pub fn reset_held_angles(&mut self, angles_rad: [f64; NUM_MODULES]) {
        self.last_angles_rad = angles_rad;
    }

    /// Scale all module speeds down by the same factor if any of them exceeds
    /// `max_speed_ms`. Angles are never changed.
    ///
    /// Returns the scale factor applied, or `None` if no scaling was needed.
    pub fn desaturate(
        states: &mut [ModuleState; NUM_MODULES],
        max_speed_ms: f64,
    ) -> Option<f64> {
        let max_ms = states
            .iter()
            .map(|s| s.speed_ms.abs())
            .fold(0f64, f64::max);

        if max_ms > max_speed_ms {
            let scale = max_speed_ms / max_ms;
            for s in states.iter_mut() {
                s.speed_ms *= scale;
            }
            Some(scale)
        }
        else {
            None
        }
    }

    /// Estimate the chassis speeds from the measured module states.
    ///
    /// This is the least squares solution, so it is exact when the module
    /// states are consistent with a rigid chassis motion.
    pub fn to_chassis_speeds(&self, states: &[ModuleState; NUM_MODULES]) -> ChassisSpeeds {
        let mut module_vels = DVector::<f64>::zeros(2 * NUM_MODULES);

        for (i, s) in states.iter().enumerate() {
            let (sin, cos) = s.angle_rad.sin_cos();
            module_vels[2 * i] = s.speed_ms * cos;
            module_vels[2 * i + 1] = s.speed_ms * sin;
        }

        let chassis = &self.fwd_matrix * module_vels;

        ChassisSpeeds {
            vx_ms: chassis[0],
            vy_ms: chassis[1],
            omega_rads: chassis[2],
        }
    }

    /// Build the 8x3 matrix mapping chassis velocity onto module velocity
    /// vectors.
    fn inv_matrix(module_pos_m_rb: &[[f64; 2]; NUM_MODULES]) -> DMatrix<f64> {
        let mut data = Vec::with_capacity(2 * NUM_MODULES * 3);

        for pos in module_pos_m_rb.iter() {
            data.extend_from_slice(&[1.0, 0.0, -pos[1]]);
            data.extend_from_slice(&[0.0, 1.0, pos[0]]);
        }

        DMatrix::from_row_slice(2 * NUM_MODULES, 3, &data)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const TOL: f64 = 1e-9;

    fn square(half: f64) -> [[f64; 2]; NUM_MODULES] {
        [[half, half], [half, -half], [-half, half], [-half, -half]]
    }

    fn rect() -> [[f64; 2]; NUM_MODULES] {
        [[0.35, 0.25], [0.35, -0.25], [-0.35, 0.25], [-0.35, -0.25]]
    }

    #[test]
    fn test_rigid_body_relation() {
        let pos = rect();
        let mut kin = ChassisKinematics::new(pos).unwrap();

        let cmds = [
            (1.0, 0.0, 0.0),
            (0.0, -2.0, 0.0),
            (0.0, 0.0, 3.0),
            (1.2, -0.7, 1.5),
            (-3.0, 2.5, -4.0),
        ];

        for &(vx, vy, w) in cmds.iter() {
            let states = kin.to_module_states(&ChassisSpeeds::new(vx, vy, w));

            for (s, p) in states.iter().zip(pos.iter()) {
                let tx = vx - w * p[1];
                let ty = vy + w * p[0];
                assert!((s.speed_ms - tx.hypot(ty)).abs() < TOL);
                if s.speed_ms > TOL {
                    assert!((s.angle_rad - ty.atan2(tx)).abs() < TOL);
                }
            }
        }
    }

    #[test]
    fn test_known_states() {
        let mut kin = ChassisKinematics::new(square(0.5)).unwrap();

        // Pure strafe left
        let states = kin.to_module_states(&ChassisSpeeds::new(0.0, 1.0, 0.0));
        for s in states.iter() {
            assert!((s.speed_ms - 1.0).abs() < TOL);
            assert!((s.angle_rad - FRAC_PI_2).abs() < TOL);
        }

        // Rotation in place, every wheel tangential
        let states = kin.to_module_states(&ChassisSpeeds::new(0.0, 0.0, 1.0));
        let expected = [3.0 * FRAC_PI_4, FRAC_PI_4, -3.0 * FRAC_PI_4, -FRAC_PI_4];
        for (s, e) in states.iter().zip(expected.iter()) {
            assert!((s.speed_ms - 0.5f64.hypot(0.5)).abs() < TOL);
            assert!((s.angle_rad - e).abs() < TOL);
        }
    }

    #[test]
    fn test_zero_command_holds_angles() {
        let mut kin = ChassisKinematics::new(rect()).unwrap();

        let moving = kin.to_module_states(&ChassisSpeeds::new(0.3, 0.4, 0.5));
        let stopped = kin.to_module_states(&ChassisSpeeds::default());

        for (m, s) in moving.iter().zip(stopped.iter()) {
            assert_eq!(s.speed_ms, 0.0);
            assert_eq!(s.angle_rad, m.angle_rad);
        }

        kin.reset_held_angles([0.0; NUM_MODULES]);
        let stopped = kin.to_module_states(&ChassisSpeeds::default());
        assert!(stopped.iter().all(|s| s.angle_rad == 0.0));
    }

    #[test]
    fn test_field_relative() {
        // Facing +y in the field, a field +x command is a robot -y command
        let speeds = ChassisVelocityCommand::field_relative(1.0, 0.0, 0.2)
            .to_chassis_speeds(FRAC_PI_2);
        assert!(speeds.vx_ms.abs() < TOL);
        assert!((speeds.vy_ms + 1.0).abs() < TOL);
        assert_eq!(speeds.omega_rads, 0.2);

        // Continuous headings give the same answer as wrapped ones
        let wrapped = ChassisSpeeds::from_field_relative(0.5, -1.5, 0.0, 0.3);
        let turned = ChassisSpeeds::from_field_relative(0.5, -1.5, 0.0, 0.3 + 4.0 * PI);
        assert!((wrapped.vx_ms - turned.vx_ms).abs() < TOL);
        assert!((wrapped.vy_ms - turned.vy_ms).abs() < TOL);

        // Robot relative ignores the heading
        let speeds = ChassisVelocityCommand::robot_relative(1.0, 0.0, 0.0)
            .to_chassis_speeds(FRAC_PI_2);
        assert_eq!(speeds, ChassisSpeeds::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_desaturate() {
        let mut kin = ChassisKinematics::new(rect()).unwrap();
        let mut states = kin.to_module_states(&ChassisSpeeds::new(3.0, 1.0, 4.0));
        let pre = states;

        let max_pre = pre.iter().map(|s| s.speed_ms).fold(0f64, f64::max);
        assert!(max_pre > 2.0);

        let scale = ChassisKinematics::desaturate(&mut states, 2.0).unwrap();
        assert!((scale - 2.0 / max_pre).abs() < TOL);

        for (a, b) in pre.iter().zip(states.iter()) {
            assert!((b.speed_ms - a.speed_ms * scale).abs() < TOL);
            assert_eq!(a.angle_rad, b.angle_rad);
        }
        let max_post = states.iter().map(|s| s.speed_ms).fold(0f64, f64::max);
        assert!((max_post - 2.0).abs() < TOL);

        // Ratios are preserved
        assert!((states[0].speed_ms / states[3].speed_ms
            - pre[0].speed_ms / pre[3].speed_ms).abs() < TOL);

        // Below the limit nothing changes
        let mut slow = kin.to_module_states(&ChassisSpeeds::new(0.5, 0.0, 0.0));
        let before = slow;
        assert_eq!(ChassisKinematics::desaturate(&mut slow, 2.0), None);
        assert_eq!(slow, before);
    }

    #[test]
    fn test_forward_kinematics() {
        let mut kin = ChassisKinematics::new(rect()).unwrap();

        for &(vx, vy, w) in [(1.0, 0.0, 0.0), (0.4, -0.9, 1.1), (0.0, 0.0, -2.0)].iter() {
            let states = kin.to_module_states(&ChassisSpeeds::new(vx, vy, w));
            let speeds = kin.to_chassis_speeds(&states);
            assert!((speeds.vx_ms - vx).abs() < 1e-6);
            assert!((speeds.vy_ms - vy).abs() < 1e-6);
            assert!((speeds.omega_rads - w).abs() < 1e-6);
        }

        // A reversed wheel at the opposite angle is the same velocity vector
        let mut states = kin.to_module_states(&ChassisSpeeds::new(1.0, 0.0, 0.0));
        states[2] = ModuleState::new(-1.0, PI);
        let speeds = kin.to_chassis_speeds(&states);
        assert!((speeds.vx_ms - 1.0).abs() < 1e-6);
        assert!(speeds.omega_rads.abs() < 1e-6);
    }

    #[test]
    fn test_bad_geometry() {
        assert_eq!(
            ChassisKinematics::new([[0.2, 0.2]; NUM_MODULES]).unwrap_err(),
            KinematicsError::DegenerateGeometry(2)
        );

        let mut pos = rect();
        pos[1][0] = f64::NAN;
        assert!(matches!(
            ChassisKinematics::new(pos),
            Err(KinematicsError::NonFinitePosition(1, _))
        ));
    }
}
