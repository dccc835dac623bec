//! # Galactic search target finder
//!
//! Selects which galactic search path to run from a single vision detection
//! of the first target. The detection is published in the vision table as a
//! polar measurement (distance and bearing) from the camera. It is converted
//! into a field position and compared against the tolerance windows of the
//! four candidate paths.
//!
//! The finder holds no state between calls.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use serde::Serialize;
use thiserror::Error;

// Internal
pub use params::*;
use crate::hw::VisionTable;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A raw vision detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisionSample {
    /// Units: meters
    pub distance_m: f64,

    /// Bearing to the target, counter-clockwise positive.
    ///
    /// Units: degrees
    pub bearing_deg: f64,
}

/// Chooses the galactic search path.
#[derive(Debug, Clone)]
pub struct TargetFinder {
    params: TargetFinderParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum TargetFinderError {
    #[error("No vision detection available ({0:?})")]
    SensorReadError(VisionSample),

    #[error("Detection at {0:?} matches more than one path: {1:?}")]
    AmbiguousTargetError([f64; 2], Vec<String>),

    #[error("Candidate {0} has an invalid tolerance of {1}")]
    InvalidTolerance(String, f64),

    #[error("Candidate {0} has a non-finite position {1:?}")]
    InvalidPosition(String, [f64; 2]),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TargetFinder {
    /// Create a new finder, checking the candidates.
    pub fn new(params: TargetFinderParams) -> Result<Self, TargetFinderError> {
        for c in params.candidates.iter() {
            for &tol in [c.tol_x, c.tol_y].iter() {
                if !(tol.is_finite() && tol >= 0.0) {
                    return Err(TargetFinderError::InvalidTolerance(c.name.clone(), tol));
                }
            }
            if !c.pos_m_fd.iter().all(|v| v.is_finite()) {
                return Err(TargetFinderError::InvalidPosition(c.name.clone(), c.pos_m_fd));
            }
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &TargetFinderParams {
        &self.params
    }

    /// Read the latest detection from the vision table.
    ///
    /// Missing entries read as the not found sentinel.
    pub fn read_sample(&self, table: &dyn VisionTable) -> VisionSample {
        let sentinel = self.params.not_found_sentinel;

        VisionSample {
            distance_m: table.get_number(&self.params.distance_key, sentinel),
            bearing_deg: table.get_number(&self.params.bearing_key, sentinel),
        }
    }

    /// Convert a detection into a field position.
    pub fn sample_to_field(&self, sample: &VisionSample) -> [f64; 2] {
        let (sin, cos) = sample.bearing_deg.to_radians().sin_cos();
        let mount = self.params.sensor_mount_offset_m;
        let field = self.params.sensor_field_offset_m;

        [
            sample.distance_m * cos + mount[0] + field[0],
            sample.distance_m * sin + mount[1] + field[1],
        ]
    }

    /// Find the path matching a detection.
    ///
    /// Returns `Ok(None)` if no candidate matches and the matching candidate
    /// if exactly one does.
    pub fn find_path_from_sample(
        &self,
        sample: &VisionSample,
    ) -> Result<Option<&TargetCandidate>, TargetFinderError> {
        let sentinel = self.params.not_found_sentinel;
        if sample.distance_m == sentinel || sample.bearing_deg == sentinel {
            return Err(TargetFinderError::SensorReadError(*sample));
        }

        let pos_m_fd = self.sample_to_field(sample);
        debug!("Vision detection {:?} is at field position {:?}", sample, pos_m_fd);

        let matches: Vec<&TargetCandidate> = self.params.candidates
            .iter()
            .filter(|c| c.contains(pos_m_fd))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            _ => Err(TargetFinderError::AmbiguousTargetError(
                pos_m_fd,
                matches.iter().map(|c| c.name.clone()).collect(),
            )),
        }
    }

    /// Find the path matching the detection currently in the vision table.
    pub fn find_path(
        &self,
        table: &dyn VisionTable,
    ) -> Result<Option<&TargetCandidate>, TargetFinderError> {
        self.find_path_from_sample(&self.read_sample(table))
    }

    /// Get the file of the galactic search path to load, or `None` if no
    /// path could be selected. Errors are logged and never propagated.
    pub fn get_galactic_search_path(&self, table: &dyn VisionTable) -> Option<String> {
        match self.find_path(table) {
            Ok(Some(c)) => {
                info!("Galactic search path selected: {} ({})", c.name, c.path_file);
                Some(c.path_file.clone())
            },
            Ok(None) => {
                warn!("Vision detection matches no galactic search path");
                None
            },
            Err(e) => {
                error!("No galactic search path selected: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hw::sim::MapVisionTable;

    fn finder() -> TargetFinder {
        TargetFinder::new(TargetFinderParams::default()).unwrap()
    }

    fn sample(distance_m: f64, bearing_deg: f64) -> VisionSample {
        VisionSample { distance_m, bearing_deg }
    }

    fn name(res: Result<Option<&TargetCandidate>, TargetFinderError>) -> Option<String> {
        res.unwrap().map(|c| c.name.clone())
    }

    #[test]
    fn test_theoretical_detections() {
        let f = finder();

        let pos = f.sample_to_field(&sample(1.676, 0.0));
        assert!((pos[0] - 2.2856).abs() < 1e-9);
        assert!((pos[1] + 2.285).abs() < 1e-9);

        assert_eq!(name(f.find_path_from_sample(&sample(1.676, 0.0))), Some("GS_A_Red".into()));
        assert_eq!(name(f.find_path_from_sample(&sample(4.2096, -21.255))), Some("GS_A_Blue".into()));
        assert_eq!(name(f.find_path_from_sample(&sample(1.8415, 24.444))), Some("GS_B_Red".into()));
        assert_eq!(name(f.find_path_from_sample(&sample(4.035, -10.886))), Some("GS_B_Blue".into()));
    }

    #[test]
    fn test_no_match() {
        let f = finder();
        assert_eq!(f.find_path_from_sample(&sample(10.0, 0.0)), Ok(None));
        assert_eq!(f.find_path_from_sample(&sample(1.676, 90.0)), Ok(None));
    }

    #[test]
    fn test_sentinel() {
        let f = finder();
        assert_eq!(
            f.find_path_from_sample(&sample(999.9, 0.0)),
            Err(TargetFinderError::SensorReadError(sample(999.9, 0.0)))
        );
        assert!(matches!(
            f.find_path_from_sample(&sample(1.676, 999.9)),
            Err(TargetFinderError::SensorReadError(_))
        ));

        // Missing table entries read as the sentinel
        let mut table = MapVisionTable::new();
        table.set_number("GS Distance", 1.676);
        assert!(matches!(f.find_path(&table), Err(TargetFinderError::SensorReadError(_))));
        assert_eq!(f.get_galactic_search_path(&table), None);
    }

    #[test]
    fn test_ambiguous() {
        let mut params = TargetFinderParams::default();
        params.candidates[3] = TargetCandidate::new("Overlap", "overlap.xml", [2.3, -2.3], 0.15, 0.075);
        let f = TargetFinder::new(params).unwrap();

        match f.find_path_from_sample(&sample(1.676, 0.0)) {
            Err(TargetFinderError::AmbiguousTargetError(_, names)) => {
                assert_eq!(names, vec!["GS_A_Red".to_string(), "Overlap".to_string()]);
            },
            other => panic!("Expected an ambiguous target, got {:?}", other),
        }

        let mut table = MapVisionTable::new();
        table.set_number("GS Distance", 1.676);
        table.set_number("GS Angle", 0.0);
        assert_eq!(f.get_galactic_search_path(&table), None);
    }

    #[test]
    fn test_table_selection() {
        let f = finder();
        let mut table = MapVisionTable::new();
        table.set_number("GS Distance", 4.035);
        table.set_number("GS Angle", -10.886);

        assert_eq!(f.get_galactic_search_path(&table), Some("galactic_blue_b.xml".into()));
    }

    #[test]
    fn test_invalid_candidates() {
        let mut params = TargetFinderParams::default();
        params.candidates[1].tol_y = -0.1;
        assert_eq!(
            TargetFinder::new(params).unwrap_err(),
            TargetFinderError::InvalidTolerance("GS_A_Blue".into(), -0.1)
        );

        let mut params = TargetFinderParams::default();
        params.candidates[0].pos_m_fd[0] = f64::NAN;
        assert!(matches!(
            TargetFinder::new(params),
            Err(TargetFinderError::InvalidPosition(_, _))
        ));
    }
}
