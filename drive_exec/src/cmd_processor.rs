//! # Command processor module
//!
//! The command processor handles executable commands coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use drive_lib::{
    data_store::DataStore,
    exec_cmd::ExecCmd,
    kinematics::ChassisVelocityCommand,
    pose_est::Pose,
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a command.
///
/// Drive commands are stored in the datastore and executed by the chassis on
/// this cycle, other commands act immediately.
pub(crate) fn exec(ds: &mut DataStore, cmd: &ExecCmd) {
    debug!("Executing {:?}", cmd);

    match *cmd {
        ExecCmd::Drive { vx_ms, vy_ms, omega_rads, field_relative } => {
            ds.chassis_cmd = Some(ChassisVelocityCommand {
                vx_ms,
                vy_ms,
                omega_rads,
                field_relative,
            });
        },
        ExecCmd::DrivePercent { drive, strafe, rotate, field_relative } => {
            ds.chassis_cmd = Some(
                ds.chassis.percent_cmd(drive, strafe, rotate, field_relative)
            );
        },
        ExecCmd::Stop => {
            ds.chassis_cmd = Some(ChassisVelocityCommand::stop());
        },
        ExecCmd::ZeroAlign => {
            ds.zero_align = true;
        },
        ExecCmd::ResetPose { x_m, y_m, heading_rad } => {
            ds.chassis.reset_pose(Pose::new(x_m, y_m, heading_rad));
        },
        ExecCmd::RezeroHeading { heading_rad } => {
            ds.chassis.rezero_heading(heading_rad);
        },
        ExecCmd::VisionSample { distance_m, bearing_deg } => {
            let params = ds.target_finder.params();
            ds.vision_table.set_number(&params.distance_key, distance_m);
            ds.vision_table.set_number(&params.bearing_key, bearing_deg);
        },
        ExecCmd::ClearVision => {
            let params = ds.target_finder.params();
            ds.vision_table.remove(&params.distance_key);
            ds.vision_table.remove(&params.bearing_key);
        },
        ExecCmd::SelectPath => {
            let path = ds.target_finder.get_galactic_search_path(&ds.vision_table);
            ds.set_selected_path(path);
        },
    }
}
