//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the chassis and the target finder
//!     - Main loop:
//!         - Command script processing
//!         - Chassis control processing
//!         - Simulated hardware step
//!     - Stop the chassis and save the final pose
//!
//! The chassis runs on simulated hardware, commanded by the script given as
//! the only argument.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use drive_lib::{
    chassis::{ChassisBuilder, ChassisController, InputData},
    data_store::DataStore,
    exec_cmd::ExecCmd,
    hw::sim::{SimGyro, SimModuleHardware, SimPlantParams},
    kinematics::ChassisVelocityCommand,
    pose_est::Pose,
    target_finder::{TargetFinder, TargetFinderParams},
    wheel_module::{ModuleId, ModuleState, NUM_MODULES},
};
use util::{
    logger::{logger_init, LevelFilter, LoggerConfig},
    module::CyclicModule,
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingCmds},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Modules tracing every cycle, limited to `Info` in the log.
const CYCLE_TRACE_TARGETS: [&str; 2] = [
    "drive_lib::wheel_module",
    "drive_lib::kinematics",
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of the run saved into the session at the end of execution.
#[derive(Serialize)]
struct RunSummary {
    num_cycles: u128,
    pose: Pose,
    heading_deg: f64,
    selected_path: Option<String>,
}

/// The simulated drivetrain hardware.
struct SimDrivetrain {
    modules: Vec<SimModuleHardware>,
    gyro: SimGyro,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_config = CYCLE_TRACE_TARGETS
        .iter()
        .fold(LoggerConfig::new(LevelFilter::Debug), |c, t| c.level_for(t, LevelFilter::Info));
    logger_init(&log_config, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Swerve Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD SCRIPT ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected one argument (the command script), found {}", args.len() - 1
        ));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::<ExecCmd>::new(&args[1])
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} commands\n",
        script.get_duration(),
        script.get_num_cmds()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let builder = ChassisBuilder::from_param_file("chassis.toml")
        .wrap_err("Failed to load the chassis parameters")?;
    let (chassis, sim) = build_sim_chassis(builder)
        .wrap_err("Failed to build the chassis")?;
    info!("Chassis init complete");

    let tf_params: TargetFinderParams = util::params::load("target_finder.toml")
        .wrap_err("Failed to load the target finder parameters")?;
    let target_finder = TargetFinder::new(tf_params)
        .wrap_err("Failed to initialise the target finder")?;
    info!("TargetFinder init complete");

    info!("Module initialisation complete\n");

    let mut ds = DataStore::new(chassis, target_finder);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let script_start = Instant::now();

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- COMMAND PROCESSING ----

        match script.get_pending(script_start.elapsed().as_secs_f64()) {
            PendingCmds::None => (),
            PendingCmds::Some(cmds) => {
                for cmd in cmds.iter() {
                    cmd_processor::exec(&mut ds, cmd);
                }
            },
            // Exit if end of script reached
            PendingCmds::EndOfScript => {
                info!("End of command script reached, stopping");
                break
            }
        }

        // ---- CHASSIS PROCESSING ----

        if ds.zero_align {
            ds.chassis_report = ds.chassis.zero_align_modules(cycle_start_instant);
        }
        else {
            let input = InputData {
                cmd: ds.chassis_cmd,
                now: cycle_start_instant,
            };
            match ds.chassis.proc(&input) {
                Ok((output, status)) => {
                    ds.chassis_report.output = output;
                    ds.chassis_report.status = status;
                },
                Err(e) => match e {},
            }
        }

        if ds.is_1_hz_cycle {
            let pose = ds.chassis_report.output.pose;
            info!(
                "Pose: x = {:.3} m, y = {:.3} m, heading = {:.1} deg",
                pose.x_m, pose.y_m, pose.heading_wrapped_deg()
            );
        }

        // ---- SIMULATION ----

        sim.step(&ds.chassis, CYCLE_PERIOD_S);

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    ds.chassis.drive(ChassisVelocityCommand::stop());
    ds.chassis.neutral();

    let pose = ds.chassis.pose();
    info!(
        "Final pose: x = {:.3} m, y = {:.3} m, heading = {:.1} deg",
        pose.x_m, pose.y_m, pose.heading_wrapped_deg()
    );

    let summary_path = session.save_json("final_pose.json", &RunSummary {
        num_cycles: ds.num_cycles,
        pose,
        heading_deg: pose.heading_wrapped_deg(),
        selected_path: ds.selected_path.clone(),
    }).wrap_err("Failed to save the final pose")?;
    info!("Run summary saved to {:?}", summary_path);

    info!("End of execution");

    Ok(())
}

/// Bind the chassis to simulated hardware.
fn build_sim_chassis(
    builder: ChassisBuilder,
) -> Result<(ChassisController, SimDrivetrain), Report> {
    let steer_offset_rad = builder.params().steer_offset_rad;
    let gyro = SimGyro::new();
    let mut builder = builder.gyro(Box::new(gyro.clone()));
    let mut modules = Vec::with_capacity(NUM_MODULES);

    for id in ModuleId::ALL.iter() {
        let i = id.index();
        let hw = SimModuleHardware::new(
            1 + i as u32,
            1 + (NUM_MODULES + i) as u32,
            steer_offset_rad[i],
            SimPlantParams::default(),
        );
        builder = builder.module(
            *id,
            Box::new(hw.drive_motor()),
            Box::new(hw.steer_motor()),
            Box::new(hw.encoder()),
        );
        modules.push(hw);
    }

    let chassis = builder.build()?;

    Ok((chassis, SimDrivetrain { modules, gyro }))
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimDrivetrain {
    /// Advance the simulated hardware, turning the gyro with the motion of
    /// the modules.
    fn step(&self, chassis: &ChassisController, dt_s: f64) {
        let params = chassis.params();
        let mut states = [ModuleState::default(); NUM_MODULES];

        for (s, m) in states.iter_mut().zip(self.modules.iter()) {
            m.step(dt_s);

            let plant = m.state();
            *s = ModuleState {
                speed_ms: plant.drive_rps / params.drive_gear_ratio
                    * std::f64::consts::PI
                    * params.wheel_diameter_m,
                angle_rad: plant.steer_pos_rad,
            };
        }

        let speeds = chassis.kinematics().to_chassis_speeds(&states);
        self.gyro.advance(speeds.omega_rads * dt_s);
    }
}
