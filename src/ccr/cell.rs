use crate::common::{Millivolts, Pressure};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const CELL_MV_WINDOW: usize = 10;
/// mV per bar; a healthy cell reads roughly 10 mV in air at the surface.
pub const DEFAULT_CELL_CALIBRATION: f32 = 47.6;

const PP_O2_PLAUSIBLE_MIN: Pressure = 0.05;
const PP_O2_PLAUSIBLE_MAX: Pressure = 2.00;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CellStatus {
    Ok,
    CurrentLimited,
    Drift,
    Fail,
    NotCalibrated,
}

/// One galvanic O2 cell: raw reading, smoothing ring, calibration and
/// voting state.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct O2Cell {
    raw_mv: Millivolts,
    history: [Millivolts; CELL_MV_WINDOW],
    history_idx: u8,
    history_len: u8,
    mv: Millivolts,
    pp_o2: Pressure,
    calibration_factor: f32,
    calibration_pp_o2: Pressure,
    calibration_timestamp: u32,
    temperature_comp: f32,
    pub(crate) status: CellStatus,
    pub(crate) voting: bool,
    pub(crate) deviation: Pressure,
}

impl Default for O2Cell {
    fn default() -> Self {
        Self {
            raw_mv: 0.,
            history: [0.; CELL_MV_WINDOW],
            history_idx: 0,
            history_len: 0,
            mv: 0.,
            pp_o2: 0.,
            calibration_factor: DEFAULT_CELL_CALIBRATION,
            calibration_pp_o2: 0.,
            calibration_timestamp: 0,
            temperature_comp: 1.,
            status: CellStatus::NotCalibrated,
            voting: false,
            deviation: 0.,
        }
    }
}

impl O2Cell {
    /// Push a raw reading into the smoothing ring and refresh the derived
    /// ppO2 and health status. A failed cell stays failed until it is
    /// recalibrated.
    pub fn push_sample(&mut self, mv: Millivolts) {
        self.raw_mv = mv;
        self.history[self.history_idx as usize] = mv;
        self.history_idx = (self.history_idx + 1) % CELL_MV_WINDOW as u8;
        if (self.history_len as usize) < CELL_MV_WINDOW {
            self.history_len += 1;
        }

        let mut sum = 0.;
        for sample in self.history.iter().take(self.history_len as usize) {
            sum += sample;
        }
        self.mv = sum / self.history_len as f32;
        self.pp_o2 = self.mv * self.temperature_comp / self.calibration_factor;

        if !(PP_O2_PLAUSIBLE_MIN..=PP_O2_PLAUSIBLE_MAX).contains(&self.pp_o2) {
            self.status = CellStatus::Fail;
            self.voting = false;
        } else if self.status != CellStatus::Fail {
            self.status = CellStatus::Ok;
            self.voting = true;
        }
    }

    /// Store a new calibration against a known reference ppO2 and bring the
    /// cell back into the vote.
    pub fn calibrate(&mut self, reference_pp_o2: Pressure, timestamp: u32) -> bool {
        if self.mv <= 0. || reference_pp_o2 <= 0. {
            return false;
        }
        self.calibration_factor = self.mv / reference_pp_o2;
        self.calibration_pp_o2 = reference_pp_o2;
        self.calibration_timestamp = timestamp;
        self.pp_o2 = self.mv * self.temperature_comp / self.calibration_factor;
        self.status = CellStatus::Ok;
        self.voting = true;
        true
    }

    pub fn restore_calibration_factor(&mut self, factor: f32) {
        if factor > 0. {
            self.calibration_factor = factor;
        }
    }

    pub fn pp_o2(&self) -> Pressure {
        self.pp_o2
    }

    pub fn millivolts(&self) -> Millivolts {
        self.mv
    }

    pub fn raw_millivolts(&self) -> Millivolts {
        self.raw_mv
    }

    pub fn calibration_factor(&self) -> f32 {
        self.calibration_factor
    }

    pub fn calibration_timestamp(&self) -> u32 {
        self.calibration_timestamp
    }

    pub fn status(&self) -> CellStatus {
        self.status
    }

    pub fn is_voting(&self) -> bool {
        self.voting
    }

    pub fn deviation(&self) -> Pressure {
        self.deviation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_over_ring() {
        let mut cell = O2Cell::default();
        cell.push_sample(40.);
        cell.push_sample(50.);
        assert_eq!(cell.millivolts(), 45.);
        // ring keeps only the last 10 samples
        for _ in 0..10 {
            cell.push_sample(60.);
        }
        assert_eq!(cell.millivolts(), 60.);
    }

    #[test]
    fn test_ppo2_from_calibration() {
        let mut cell = O2Cell::default();
        for _ in 0..10 {
            cell.push_sample(47.6);
        }
        assert!((cell.pp_o2() - 1.0).abs() < 1e-5);
        assert_eq!(cell.status(), CellStatus::Ok);
        assert!(cell.is_voting());
    }

    #[test]
    fn test_out_of_range_fails_sticky() {
        let mut cell = O2Cell::default();
        cell.push_sample(47.6 * 2.5);
        assert_eq!(cell.status(), CellStatus::Fail);
        assert!(!cell.is_voting());

        // back in range, still failed until recalibrated
        for _ in 0..10 {
            cell.push_sample(47.6);
        }
        assert_eq!(cell.status(), CellStatus::Fail);
        assert!(!cell.is_voting());

        assert!(cell.calibrate(1.0, 1234));
        assert_eq!(cell.status(), CellStatus::Ok);
        assert!(cell.is_voting());
        assert_eq!(cell.calibration_timestamp(), 1234);
    }

    #[test]
    fn test_calibration_stores_factor() {
        let mut cell = O2Cell::default();
        for _ in 0..10 {
            cell.push_sample(10.);
        }
        assert!(cell.calibrate(0.21, 42));
        assert!((cell.calibration_factor() - 10. / 0.21).abs() < 1e-4);
        assert!((cell.pp_o2() - 0.21).abs() < 1e-5);
    }

    #[test]
    fn test_calibration_rejects_dead_cell() {
        let mut cell = O2Cell::default();
        assert!(!cell.calibrate(0.21, 42));
    }
}
