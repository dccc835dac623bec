//! # Data Store

use log::info;

use crate::{
    chassis::{ChassisController, CycleReport},
    hw::sim::MapVisionTable,
    kinematics::ChassisVelocityCommand,
    target_finder::TargetFinder,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Chassis
    pub chassis: ChassisController,

    /// New velocity command for this cycle, if any.
    pub chassis_cmd: Option<ChassisVelocityCommand>,

    /// Zero align the modules this cycle instead of driving.
    pub zero_align: bool,

    pub chassis_report: CycleReport,

    // Galactic search
    pub target_finder: TargetFinder,

    pub vision_table: MapVisionTable,

    /// File of the selected galactic search path.
    pub selected_path: Option<String>,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    pub fn new(chassis: ChassisController, target_finder: TargetFinder) -> Self {
        Self {
            num_cycles: 0,
            is_1_hz_cycle: false,
            chassis,
            chassis_cmd: None,
            zero_align: false,
            chassis_report: CycleReport::default(),
            target_finder,
            vision_table: MapVisionTable::new(),
            selected_path: None,
            num_consec_cycle_overruns: 0,
        }
    }

    /// Clear items that need wiping at the start of the cycle.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.chassis_cmd = None;
        self.zero_align = false;

        let cycles_per_s = cycle_frequency_hz.round().max(1.0) as u128;
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;
    }

    /// Record the galactic search path to load.
    pub fn set_selected_path(&mut self, path: Option<String>) {
        match path {
            Some(ref p) => info!("Galactic search path set to {}", p),
            None => info!("No galactic search path set"),
        }
        self.selected_path = path;
    }
}
