//! # Executable commands
//!
//! Commands that can be given to `drive_exec`, for example from a command
//! script. In a script each command is a JSON object tagged with its type:
//!
//! ```text
//! 0.0: {"type": "ZeroAlign"};
//! 1.0: {"type": "Drive", "vx_ms": 1.0, "vy_ms": 0.0, "omega_rads": 0.0};
//! 3.0: {"type": "Stop"};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command to the drive executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecCmd {
    /// Drive at the given velocity until the next drive command.
    Drive {
        vx_ms: f64,
        vy_ms: f64,
        omega_rads: f64,
        #[serde(default)]
        field_relative: bool,
    },

    /// Drive at fractions of the maximum speeds, each in [-1, 1].
    DrivePercent {
        drive: f64,
        strafe: f64,
        rotate: f64,
        #[serde(default)]
        field_relative: bool,
    },

    /// Stop the chassis, holding the module angles.
    Stop,

    /// Stop the chassis and point every module forward.
    ZeroAlign,

    /// Replace the pose estimate.
    ResetPose {
        x_m: f64,
        y_m: f64,
        heading_rad: f64,
    },

    /// Redefine the current heading, keeping the position.
    RezeroHeading {
        heading_rad: f64,
    },

    /// Publish a vision detection into the vision table.
    VisionSample {
        distance_m: f64,
        bearing_deg: f64,
    },

    /// Remove any detection from the vision table.
    ClearVision,

    /// Select the galactic search path from the vision table.
    SelectPath,
}

#[cfg(test)]
mod test {
    use super::*;
    use util::script_interpreter::{PendingCmds, ScriptInterpreter};

    #[test]
    fn test_script_cmds() {
        let script = r#"
0.0: {"type": "ZeroAlign"};
0.5: {"type": "Drive", "vx_ms": 1.0, "vy_ms": 0.0, "omega_rads": 0.5};
1.0: {"type": "DrivePercent", "drive": 0.5, "strafe": 0.0, "rotate": 0.0, "field_relative": true};
2.0: {"type": "VisionSample", "distance_m": 1.676, "bearing_deg": 0.0};
2.0: {"type": "SelectPath"};
"#;
        let mut si = ScriptInterpreter::<ExecCmd>::parse_script(script).unwrap();
        assert_eq!(si.get_num_cmds(), 5);

        assert_eq!(
            si.get_pending(0.5),
            PendingCmds::Some(vec![
                ExecCmd::ZeroAlign,
                ExecCmd::Drive { vx_ms: 1.0, vy_ms: 0.0, omega_rads: 0.5, field_relative: false },
            ])
        );
        assert_eq!(
            si.get_pending(1.0),
            PendingCmds::Some(vec![ExecCmd::DrivePercent {
                drive: 0.5, strafe: 0.0, rotate: 0.0, field_relative: true
            }])
        );
        assert_eq!(
            si.get_pending(2.0),
            PendingCmds::Some(vec![
                ExecCmd::VisionSample { distance_m: 1.676, bearing_deg: 0.0 },
                ExecCmd::SelectPath,
            ])
        );
    }

    #[test]
    fn test_demo_script_parses() {
        let si = ScriptInterpreter::<ExecCmd>::parse_script(
            include_str!("../../scripts/demo.txt")
        ).unwrap();
        assert!(si.get_duration() > 0.0);
    }
}
