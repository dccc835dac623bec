//! Parameters structure for the TargetFinder

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of candidate paths for the galactic search.
pub const NUM_CANDIDATES: usize = 4;

/// Value published in the vision table when nothing was detected.
pub const NOT_FOUND_SENTINEL: f64 = 999.9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A candidate path and where its first target should appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCandidate {
    /// Identifier of the path, e.g. `GS_A_Red`.
    pub name: String,

    /// Path file loaded by the path follower when this candidate is selected.
    pub path_file: String,

    /// Theoretical field position of the target.
    ///
    /// Units: meters,
    /// Frame: Field
    pub pos_m_fd: [f64; 2],

    /// Tolerance on x as a fraction of the theoretical x.
    pub tol_x: f64,

    /// Tolerance on y as a fraction of the theoretical y.
    pub tol_y: f64,
}

/// Parameters for the TargetFinder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetFinderParams {
    /// Vision table key holding the distance to the target.
    pub distance_key: String,

    /// Vision table key holding the bearing to the target.
    pub bearing_key: String,

    /// Value meaning no detection.
    pub not_found_sentinel: f64,

    /// Offset of the camera from the reference origin of its measurements.
    ///
    /// Units: meters
    pub sensor_mount_offset_m: [f64; 2],

    /// Field position of the reference origin at the start of the run.
    ///
    /// Units: meters,
    /// Frame: Field
    pub sensor_field_offset_m: [f64; 2],

    pub candidates: [TargetCandidate; NUM_CANDIDATES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TargetCandidate {
    pub fn new(name: &str, path_file: &str, pos_m_fd: [f64; 2], tol_x: f64, tol_y: f64) -> Self {
        Self {
            name: name.to_string(),
            path_file: path_file.to_string(),
            pos_m_fd,
            tol_x,
            tol_y,
        }
    }

    /// Check whether a field position falls within the candidate's windows.
    ///
    /// The windows are open and scale with the signed theoretical value. The
    /// x window is `(x - x*tol_x, x + x*tol_x)` and the y window is
    /// `(y + y*tol_y, y - y*tol_y)`. A negative theoretical x or a positive
    /// theoretical y therefore gives an empty window that never matches.
    pub fn contains(&self, pos_m_fd: [f64; 2]) -> bool {
        let [tx, ty] = self.pos_m_fd;

        let x_lower = tx - tx * self.tol_x;
        let x_upper = tx + tx * self.tol_x;
        let y_lower = ty + ty * self.tol_y;
        let y_upper = ty - ty * self.tol_y;

        pos_m_fd[0] > x_lower && pos_m_fd[0] < x_upper
            && pos_m_fd[1] > y_lower && pos_m_fd[1] < y_upper
    }
}

impl Default for TargetFinderParams {
    fn default() -> Self {
        Self {
            distance_key: "GS Distance".to_string(),
            bearing_key: "GS Angle".to_string(),
            not_found_sentinel: NOT_FOUND_SENTINEL,
            sensor_mount_offset_m: [0.0, 0.0],
            sensor_field_offset_m: [0.6096, -2.285],
            candidates: [
                TargetCandidate::new("GS_A_Red", "galactic_red_a.xml", [2.286, -2.286], 0.15, 0.075),
                TargetCandidate::new("GS_A_Blue", "galactic_blue_a.xml", [4.572, -3.81], 0.15, 0.075),
                TargetCandidate::new("GS_B_Red", "galactic_red_b.xml", [2.286, -1.524], 0.15, 0.075),
                TargetCandidate::new("GS_B_Blue", "galactic_blue_b.xml", [4.572, -3.048], 0.15, 0.075),
            ],
        }
    }
}
