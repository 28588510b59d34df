use crate::ccr::cell::{CellStatus, O2Cell};
use crate::common::{math, Depth, GasIndex, Millivolts, Pressure};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const NUM_O2_CELLS: usize = 3;

const PP_O2_HIGH_ALARM: Pressure = 1.60;
const PP_O2_LOW_ALARM: Pressure = 0.40;
// a cell is dropped when it strays more than 0.1 bar or 10% off the mean
const CELL_DEVIATION_ABS: Pressure = 0.10;
const CELL_DEVIATION_FRACTION: f32 = 0.10;
// auto setpoint schedule floor and slew
const AUTO_SP_FLOOR_DEPTH_M: f32 = 3.0;
const SETPOINT_SLEW_FRACTION: f32 = 0.1;
const SETPOINT_DEADBAND: Pressure = 0.01;
const SCR_MIN_PP_O2: Pressure = 0.16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopMode {
    FixedSetpoint,
    AutoSetpoint,
    ScrPassive,
    ScrActive,
    Pscr,
}

/// Cell fusion, setpoint scheduling and loop alarms for rebreather modes.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CcrManager {
    cells: [O2Cell; NUM_O2_CELLS],
    voted_pp_o2: Pressure,
    voting_cells: u8,

    setpoint_low: Pressure,
    setpoint_high: Pressure,
    setpoint_deco: Pressure,
    current_setpoint: Pressure,
    auto_sp_switch_depth: Depth,

    mode: LoopMode,
    bailout: bool,
    diluent_index: GasIndex,
    bailout_gas_index: GasIndex,

    scr_ratio: f32,
    scr_drop: Pressure,

    alarm_pp_o2_high: bool,
    alarm_pp_o2_low: bool,
    alarm_cells_divergent: bool,
    alarm_cells_failed: bool,

    pp_o2_min: Pressure,
    pp_o2_max: Pressure,
    pp_o2_average_1min: Pressure,
    avg_sum: f32,
    avg_samples: u16,
    time_on_loop: u32,
}

impl Default for CcrManager {
    fn default() -> Self {
        Self {
            cells: [O2Cell::default(); NUM_O2_CELLS],
            voted_pp_o2: 0.,
            voting_cells: 0,
            setpoint_low: 0.7,
            setpoint_high: 1.3,
            setpoint_deco: 1.4,
            current_setpoint: 0.7,
            auto_sp_switch_depth: Depth::from_meters(6.),
            mode: LoopMode::FixedSetpoint,
            bailout: false,
            diluent_index: 0,
            bailout_gas_index: 0,
            scr_ratio: 10.,
            scr_drop: 0.05,
            alarm_pp_o2_high: false,
            alarm_pp_o2_low: false,
            alarm_cells_divergent: false,
            alarm_cells_failed: false,
            pp_o2_min: 0.,
            pp_o2_max: 0.,
            pp_o2_average_1min: 0.,
            avg_sum: 0.,
            avg_samples: 0,
            time_on_loop: 0,
        }
    }
}

impl CcrManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one ADC sweep of raw cell readings, then re-run the vote.
    pub fn update_cell_readings(&mut self, mv: [Millivolts; NUM_O2_CELLS]) {
        for (cell, sample) in self.cells.iter_mut().zip(mv) {
            cell.push_sample(sample);
        }
        self.validate_cells();
    }

    /// Two-round divergence vote. Holds the previous voted ppO2 and raises
    /// `cells_failed` when fewer than two cells survive.
    pub fn validate_cells(&mut self) -> bool {
        let Some(mean) = self.voting_mean() else {
            self.alarm_cells_failed = true;
            return false;
        };

        for cell in self.cells.iter_mut().filter(|c| c.voting) {
            cell.deviation = math::abs(cell.pp_o2() - mean);
            if cell.deviation > CELL_DEVIATION_ABS.max(mean * CELL_DEVIATION_FRACTION) {
                cell.voting = false;
                cell.status = CellStatus::Drift;
            }
        }

        match self.voting_mean() {
            Some(mean) => {
                let survivors = self.cells.iter().filter(|c| c.voting).count() as u8;
                self.voted_pp_o2 = mean;
                self.voting_cells = survivors;
                self.alarm_cells_divergent = survivors < NUM_O2_CELLS as u8;
                self.alarm_cells_failed = false;
                true
            }
            None => {
                self.alarm_cells_failed = true;
                false
            }
        }
    }

    fn voting_mean(&self) -> Option<Pressure> {
        let mut sum = 0.;
        let mut count = 0;
        for cell in self.cells.iter().filter(|c| c.voting) {
            sum += cell.pp_o2();
            count += 1;
        }
        if count < 2 {
            return None;
        }
        Some(sum / count as f32)
    }

    pub fn calibrate_cell(
        &mut self,
        cell_idx: usize,
        reference_pp_o2: Pressure,
        timestamp: u32,
    ) -> bool {
        if cell_idx >= NUM_O2_CELLS {
            return false;
        }
        self.cells[cell_idx].calibrate(reference_pp_o2, timestamp)
    }

    pub fn calibrate_all_cells(&mut self, reference_pp_o2: Pressure, timestamp: u32) {
        for cell in self.cells.iter_mut() {
            cell.calibrate(reference_pp_o2, timestamp);
        }
    }

    pub fn restore_calibration(&mut self, factors: &[f32; NUM_O2_CELLS]) {
        for (cell, factor) in self.cells.iter_mut().zip(factors) {
            cell.restore_calibration_factor(*factor);
        }
    }

    pub fn set_mode(&mut self, mode: LoopMode) {
        self.mode = mode;
    }

    pub fn set_fixed_setpoint(&mut self, setpoint: Pressure) {
        self.mode = LoopMode::FixedSetpoint;
        self.current_setpoint = setpoint;
    }

    pub fn set_auto_setpoints(
        &mut self,
        low: Pressure,
        high: Pressure,
        deco: Pressure,
        switch_depth: Depth,
    ) {
        self.setpoint_low = low;
        self.setpoint_high = high;
        self.setpoint_deco = deco;
        self.auto_sp_switch_depth = switch_depth;
        self.mode = LoopMode::AutoSetpoint;
    }

    /// Depth-scheduled setpoint target with a first-order lag so the
    /// solenoid never sees a step change.
    pub fn update_auto_setpoint(&mut self, depth: Depth) {
        if self.mode != LoopMode::AutoSetpoint {
            return;
        }

        let depth_m = depth.as_meters();
        let switch_m = self.auto_sp_switch_depth.as_meters();
        let target = if depth_m < AUTO_SP_FLOOR_DEPTH_M {
            self.setpoint_low
        } else if depth_m < switch_m {
            let ratio = (depth_m - AUTO_SP_FLOOR_DEPTH_M) / (switch_m - AUTO_SP_FLOOR_DEPTH_M);
            self.setpoint_low + (self.setpoint_high - self.setpoint_low) * ratio
        } else {
            self.setpoint_high
        };

        let delta = target - self.current_setpoint;
        if math::abs(delta) > SETPOINT_DEADBAND {
            self.current_setpoint += delta * SETPOINT_SLEW_FRACTION;
        }
    }

    pub fn switch_to_bailout(&mut self, bailout_gas: GasIndex) {
        self.bailout = true;
        self.bailout_gas_index = bailout_gas;
    }

    pub fn return_to_loop(&mut self) {
        self.bailout = false;
    }

    /// SCR inspired ppO2: loop fraction dropped by the dump ratio and the
    /// metabolic consumption, floored at a breathable minimum.
    pub fn scr_pp_o2(&self, inspired_pp_o2: Pressure) -> Pressure {
        let scr_pp_o2 = inspired_pp_o2 * (1. - 1. / self.scr_ratio) - self.scr_drop;
        scr_pp_o2.max(SCR_MIN_PP_O2)
    }

    pub fn set_scr(&mut self, ratio: f32, metabolic_drop: Pressure) {
        self.scr_ratio = ratio;
        self.scr_drop = metabolic_drop;
    }

    /// ppO2 window alarms and session extremes; min tracks zero-as-unset.
    pub fn check_alarms(&mut self) {
        self.alarm_pp_o2_high = self.voted_pp_o2 > PP_O2_HIGH_ALARM;
        self.alarm_pp_o2_low = self.voted_pp_o2 < PP_O2_LOW_ALARM;

        if self.voted_pp_o2 > self.pp_o2_max {
            self.pp_o2_max = self.voted_pp_o2;
        }
        if self.voted_pp_o2 < self.pp_o2_min || self.pp_o2_min == 0. {
            self.pp_o2_min = self.voted_pp_o2;
        }
    }

    /// 1 Hz statistics roll-up.
    pub fn tick_statistics(&mut self) {
        self.avg_sum += self.voted_pp_o2;
        self.avg_samples += 1;
        if self.avg_samples >= 60 {
            self.pp_o2_average_1min = self.avg_sum / self.avg_samples as f32;
            self.avg_sum = 0.;
            self.avg_samples = 0;
        }
        if !self.bailout {
            self.time_on_loop += 1;
        }
    }

    pub fn voted_pp_o2(&self) -> Pressure {
        self.voted_pp_o2
    }

    pub fn voting_cells(&self) -> u8 {
        self.voting_cells
    }

    pub fn cells(&self) -> &[O2Cell; NUM_O2_CELLS] {
        &self.cells
    }

    pub fn cell_statuses(&self) -> [CellStatus; NUM_O2_CELLS] {
        core::array::from_fn(|i| self.cells[i].status())
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn current_setpoint(&self) -> Pressure {
        self.current_setpoint
    }

    pub fn setpoints(&self) -> (Pressure, Pressure, Pressure) {
        (self.setpoint_low, self.setpoint_high, self.setpoint_deco)
    }

    pub fn is_bailout(&self) -> bool {
        self.bailout
    }

    pub fn bailout_gas_index(&self) -> GasIndex {
        self.bailout_gas_index
    }

    pub fn diluent_index(&self) -> GasIndex {
        self.diluent_index
    }

    pub fn set_diluent_index(&mut self, idx: GasIndex) {
        self.diluent_index = idx;
    }

    pub fn alarm_pp_o2_high(&self) -> bool {
        self.alarm_pp_o2_high
    }

    pub fn alarm_pp_o2_low(&self) -> bool {
        self.alarm_pp_o2_low
    }

    pub fn alarm_cells_divergent(&self) -> bool {
        self.alarm_cells_divergent
    }

    pub fn alarm_cells_failed(&self) -> bool {
        self.alarm_cells_failed
    }

    pub fn session_pp_o2_range(&self) -> (Pressure, Pressure) {
        (self.pp_o2_min, self.pp_o2_max)
    }

    pub fn pp_o2_average_1min(&self) -> Pressure {
        self.pp_o2_average_1min
    }

    pub fn time_on_loop(&self) -> u32 {
        self.time_on_loop
    }
}
