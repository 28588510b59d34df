use crate::ccr::{CcrManager, CellStatus, LoopMode, NUM_O2_CELLS};
use crate::common::{Celsius, Cns, Depth, GasIndex, MbarPressure, Pressure, Time};
use crate::config::SystemConfig;
use crate::dive::{DiveEvent, DiveManager, DivePhase, ModelSnapshot};
use crate::hal::{ButtonEvent, Hal};
use crate::zhl16::{plan_ascent, AscentPlan, Zhl16Model};

// cooperative cadences off the free-running millisecond clock
const SENSOR_SWEEP_MS: u32 = 20;
const BUTTON_TICK_MS: u32 = 100;
const HEAVY_TICK_MS: u32 = 1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    Surface,
    Dive,
    Gauge,
    Apnea,
    Ccr,
    Scr,
    Bailout,
}

impl OperatingMode {
    pub fn is_rebreather(&self) -> bool {
        matches!(self, Self::Ccr | Self::Scr)
    }

    fn runs_deco_model(&self) -> bool {
        !matches!(self, Self::Gauge | Self::Apnea)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmSeverity {
    Info,
    Warning,
    Critical,
}

/// Modal alarm owned by the computer until the diver acknowledges it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm {
    pub message: &'static str,
    pub severity: AlarmSeverity,
    pub posted_at: u32,
}

/// Read-only state handed to the display collaborator.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub mode: OperatingMode,
    pub phase: DivePhase,
    pub depth: Depth,
    pub max_depth: Depth,
    pub dive_time_seconds: u32,
    pub ndl: Time,
    pub ceiling: Depth,
    pub tts: Time,
    pub gas_index: GasIndex,
    pub cell_statuses: [CellStatus; NUM_O2_CELLS],
    pub voted_pp_o2: Pressure,
    pub setpoint: Pressure,
    pub ascent_rate: f32,
    pub cns: Cns,
    pub current_gf: f32,
    pub ascent_rate_alarm: bool,
    pub deco_ceiling_alarm: bool,
    pub pp_o2_alarm: bool,
    pub emergency_mode: bool,
    pub battery_percent: u8,
    pub alarm: Option<Alarm>,
}

/// The owned aggregate tying the subsystems together. One instance is
/// driven by the main loop through `service`; nothing here is global.
pub struct DiveComputer {
    mode: OperatingMode,
    previous_mode: OperatingMode,

    model: Zhl16Model,
    dive: DiveManager,
    ccr: CcrManager,
    config: SystemConfig,

    depth: Depth,
    temperature: Celsius,
    ceiling: Depth,
    ndl: Time,
    plan: AscentPlan,

    alarm: Option<Alarm>,
    emergency_mode: bool,
    battery_percent: u8,
    dive_time_seconds: u32,

    last_sensor_ms: u32,
    last_button_ms: u32,
    last_heavy_ms: u32,
}

impl DiveComputer {
    pub fn new(config: SystemConfig, surface_pressure: MbarPressure) -> Self {
        let model = Zhl16Model::new(config.deco_config(surface_pressure));

        let mut ccr = CcrManager::new();
        ccr.restore_calibration(&config.cell_calibration);

        let mut dive = DiveManager::new();
        dive.set_sample_interval(config.log_rate.max(1) as u16);
        dive.set_safety_stop_time(config.safety_stop_time);

        Self {
            mode: OperatingMode::Surface,
            previous_mode: OperatingMode::Surface,
            model,
            dive,
            ccr,
            config,
            depth: Depth::zero(),
            temperature: 0.,
            ceiling: Depth::zero(),
            ndl: Time::from_minutes(99.),
            plan: AscentPlan::default(),
            alarm: None,
            emergency_mode: false,
            battery_percent: 0,
            dive_time_seconds: 0,
            last_sensor_ms: 0,
            last_button_ms: 0,
            last_heavy_ms: 0,
        }
    }

    /// One pass of the cooperative main loop: dispatch the ~50 Hz sensor
    /// sweep, the 10 Hz button tick and the 1 Hz heavy tick, then feed the
    /// watchdog.
    pub fn service<H: Hal>(&mut self, hal: &mut H) {
        let now_ms = hal.sys_millis();

        if now_ms.wrapping_sub(self.last_sensor_ms) >= SENSOR_SWEEP_MS {
            self.last_sensor_ms = now_ms;
            self.sensor_sweep(hal, now_ms);
        }

        if now_ms.wrapping_sub(self.last_button_ms) >= BUTTON_TICK_MS {
            self.last_button_ms = now_ms;
            if let Some(event) = hal.button_event() {
                self.handle_button(event, now_ms);
            }
        }

        if now_ms.wrapping_sub(self.last_heavy_ms) >= HEAVY_TICK_MS {
            self.last_heavy_ms = now_ms;
            self.heavy_tick(hal, now_ms);
        }

        hal.watchdog_feed();
    }

    /// Sensor sweep: ambient pressure to depth, cells to vote to measured
    /// ppO2. A failed pressure read latches emergency mode; the model keeps
    /// its last known state while alarms stay live.
    fn sensor_sweep<H: Hal>(&mut self, hal: &mut H, now_ms: u32) {
        let (pressure_mbar, temperature) = match hal.read_pressure_temperature() {
            Ok(reading) => reading,
            Err(_) => {
                self.emergency_mode = true;
                self.post_alarm("SENSOR FAULT", AlarmSeverity::Critical, now_ms);
                return;
            }
        };

        let pressure_mbar = pressure_mbar + self.config.pressure_offset_mbar;
        self.temperature = temperature + self.config.temperature_offset;

        let surface_mbar = self.model.config().surface_pressure as f32;
        let depth_m = ((pressure_mbar - surface_mbar) / 100.).max(0.);
        self.depth = Depth::from_meters(depth_m);

        if !self.emergency_mode {
            self.model.set_depth(self.depth);
        }

        if self.mode.is_rebreather() {
            match hal.read_o2_cells() {
                Ok(cell_mv) => {
                    self.ccr.update_cell_readings(cell_mv);
                    if !self.emergency_mode {
                        let measured = match self.mode {
                            OperatingMode::Scr => {
                                let inspired = self.model.ambient_pressure()
                                    * self.model.gas_table().current_gas().fo2();
                                self.ccr.scr_pp_o2(inspired)
                            }
                            _ => self.ccr.voted_pp_o2(),
                        };
                        self.model.update_measured_pp_o2(measured);
                    }
                }
                Err(_) => {
                    self.post_alarm("CELL READ FAULT", AlarmSeverity::Warning, now_ms);
                }
            }
        }
    }

    /// 1 Hz housekeeping: tissue and toxicity integration, ceiling, NDL or
    /// ascent plan, setpoint schedule, loop alarms, phase FSM and sampling.
    fn heavy_tick<H: Hal>(&mut self, hal: &mut H, now_ms: u32) {
        let now = hal.unix_time();

        if !self.emergency_mode && self.mode.runs_deco_model() {
            // tissues keep integrating at the surface too, so the interval
            // off-gassing credits the next dive
            self.model.update_tissues(Time::from_seconds(1.));
            self.model.update_ox_tox(Time::from_seconds(1.));

            if self.dive.is_diving() {
                self.ceiling = self.model.ceiling();
                if self.ceiling > Depth::zero() {
                    self.plan = plan_ascent(&self.model);
                    self.ndl = Time::zero();
                } else {
                    self.ndl = self.model.ndl();
                    self.plan = AscentPlan::default();
                }
            }
        }

        if self.mode == OperatingMode::Ccr && self.ccr.mode() == LoopMode::AutoSetpoint {
            self.ccr.update_auto_setpoint(self.depth);
        }

        if self.mode.is_rebreather() {
            self.ccr.check_alarms();
            self.ccr.tick_statistics();
            if self.ccr.alarm_cells_failed() {
                self.post_alarm("O2 CELLS FAILED", AlarmSeverity::Critical, now_ms);
            }
        }

        let snapshot = self.model_snapshot();
        match self.dive.update(now, self.depth, self.temperature, &snapshot) {
            Some(DiveEvent::Started) => {
                if self.mode == OperatingMode::Surface {
                    self.mode = OperatingMode::Dive;
                }
            }
            Some(DiveEvent::Ended) => {
                if hal.save_dive(self.dive.profile()).is_err() {
                    self.post_alarm("LOG SAVE FAILED", AlarmSeverity::Warning, now_ms);
                }
                if self.mode == OperatingMode::Dive {
                    self.mode = OperatingMode::Surface;
                }
            }
            None => {}
        }
        self.dive_time_seconds = self.dive.dive_time(now);

        if self.dive.ascent_rate_alarm() {
            self.post_alarm("SLOW DOWN", AlarmSeverity::Warning, now_ms);
        }
        if self.dive.deco_ceiling_alarm() {
            self.post_alarm("DECO CEILING", AlarmSeverity::Critical, now_ms);
        }

        self.battery_percent = hal.battery_percent();
    }

    fn model_snapshot(&self) -> ModelSnapshot {
        let in_deco = self.ceiling > Depth::zero();
        let deco_minutes = if in_deco {
            (self.plan.tts_minutes() as u32).min(u8::MAX as u32) as u8
        } else {
            0
        };

        let (pp_o2_high, pp_o2_low) = if self.mode.is_rebreather() {
            (self.ccr.alarm_pp_o2_high(), self.ccr.alarm_pp_o2_low())
        } else {
            let working = self.model.working_pp_o2();
            let (pp_o2_min, pp_o2_max) = self.model.gas_table().current_gas().pp_o2_window();
            (working > pp_o2_max, working < pp_o2_min)
        };

        ModelSnapshot {
            ceiling: self.ceiling,
            gas_index: self.model.gas_table().current(),
            deco_minutes,
            cns: (self.model.cns() as u32).min(u8::MAX as u32) as u8,
            current_gf: self.model.supersaturation().gf_now,
            otu: self.model.otu(),
            pp_o2_high,
            pp_o2_low,
        }
    }

    pub fn handle_button(&mut self, event: ButtonEvent, now_ms: u32) {
        match event {
            ButtonEvent::Up => {
                if self.dive.is_diving() && !self.mode.is_rebreather() {
                    self.model.gas_table_mut().cycle_gas();
                }
            }
            ButtonEvent::MenuLong => {
                if self.mode == OperatingMode::Ccr {
                    self.switch_mode(OperatingMode::Bailout, now_ms);
                }
            }
            ButtonEvent::EnterLong => {
                self.clear_alarm();
            }
            ButtonEvent::Menu | ButtonEvent::Down | ButtonEvent::Enter => {
                // navigation is the display collaborator's concern
            }
        }
    }

    pub fn switch_mode(&mut self, new_mode: OperatingMode, now_ms: u32) {
        self.previous_mode = self.mode;
        self.mode = new_mode;

        match new_mode {
            OperatingMode::Ccr | OperatingMode::Scr => {
                self.model.set_ccr_mode(true);
                self.model.update_measured_pp_o2(self.ccr.current_setpoint());
                self.ccr.return_to_loop();
            }
            OperatingMode::Bailout => {
                let bailout_gas = self.model.gas_table().first_bailout_gas().unwrap_or(0);
                self.ccr.switch_to_bailout(bailout_gas);
                self.model.switch_to_bailout();
                self.post_alarm("BAILOUT", AlarmSeverity::Warning, now_ms);
            }
            _ => {
                if self.previous_mode.is_rebreather() {
                    self.model.set_ccr_mode(false);
                }
            }
        }
    }

    fn post_alarm(&mut self, message: &'static str, severity: AlarmSeverity, now_ms: u32) {
        let outranked = self
            .alarm
            .map(|active| severity >= active.severity)
            .unwrap_or(true);
        if outranked {
            self.alarm = Some(Alarm {
                message,
                severity,
                posted_at: now_ms,
            });
        }
    }

    pub fn clear_alarm(&mut self) {
        self.alarm = None;
    }

    pub fn snapshot(&self) -> DisplayState {
        DisplayState {
            mode: self.mode,
            phase: self.dive.phase(),
            depth: self.depth,
            max_depth: self.model.max_depth(),
            dive_time_seconds: self.dive_time_seconds,
            ndl: self.ndl,
            ceiling: self.ceiling,
            tts: self.plan.tts,
            gas_index: self.model.gas_table().current(),
            cell_statuses: self.ccr.cell_statuses(),
            voted_pp_o2: self.ccr.voted_pp_o2(),
            setpoint: self.ccr.current_setpoint(),
            ascent_rate: self.dive.ascent_rate(),
            cns: self.model.cns(),
            current_gf: self.model.supersaturation().gf_now,
            ascent_rate_alarm: self.dive.ascent_rate_alarm(),
            deco_ceiling_alarm: self.dive.deco_ceiling_alarm(),
            pp_o2_alarm: self.dive.pp_o2_alarm(),
            emergency_mode: self.emergency_mode,
            battery_percent: self.battery_percent,
            alarm: self.alarm,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency_mode
    }

    pub fn model(&self) -> &Zhl16Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Zhl16Model {
        &mut self.model
    }

    pub fn ccr(&self) -> &CcrManager {
        &self.ccr
    }

    pub fn ccr_mut(&mut self) -> &mut CcrManager {
        &mut self.ccr
    }

    pub fn dive(&self) -> &DiveManager {
        &self.dive
    }

    pub fn dive_mut(&mut self) -> &mut DiveManager {
        &mut self.dive
    }

    pub fn ascent_plan(&self) -> &AscentPlan {
        &self.plan
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
