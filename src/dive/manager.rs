use crate::common::{Celsius, Depth, GasIndex};
use crate::dive::profile::DiveProfile;
use crate::dive::sample::{sample_events, DiveSample};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DIVE_START_DEPTH_M: f32 = 1.2;
const DIVE_START_HOLD_S: u32 = 20;
const DIVE_END_DEPTH_M: f32 = 0.8;
const DIVE_END_HOLD_S: u32 = 300;

// smoothed vertical rate, positive = ascending
const RATE_KEEP: f32 = 0.7;
const RATE_BLEND: f32 = 0.3;
const DESCENT_PHASE_RATE: f32 = -5.0;
const ASCENT_PHASE_RATE: f32 = 3.0;
const DECO_STOP_WINDOW_M: f32 = 3.0;

const SAFETY_STOP_TRIGGER_DEPTH_M: f32 = 10.0;
const SAFETY_STOP_PHASE_MIN_M: f32 = 3.0;
const SAFETY_STOP_PHASE_MAX_M: f32 = 6.0;
const SAFETY_STOP_HOLD_MIN_M: f32 = 4.5;
const SAFETY_STOP_HOLD_MAX_M: f32 = 5.5;

const DEFAULT_MAX_ASCENT_RATE: f32 = 10.0;
const DEFAULT_FAST_ASCENT_RATE: f32 = 18.0;
const DEFAULT_SAFETY_STOP_TIME_S: u16 = 180;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DivePhase {
    Surface,
    Descent,
    Bottom,
    Ascent,
    DecoStop,
    SafetyStop,
    SurfaceInterval,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiveEvent {
    Started,
    Ended,
}

/// Per-tick view of the decompression model consumed by the phase FSM and
/// the sampler; the manager never holds a reference into the model.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct ModelSnapshot {
    pub ceiling: Depth,
    pub gas_index: GasIndex,
    pub deco_minutes: u8,
    pub cns: u8,
    pub current_gf: f32,
    pub otu: f32,
    pub pp_o2_high: bool,
    pub pp_o2_low: bool,
}

/// Dive start/stop detection, phase classification, ascent-rate
/// surveillance, safety-stop bookkeeping and profile recording.
/// `update` is driven at 1 Hz with a wall-clock second counter.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiveManager {
    phase: DivePhase,
    diving: bool,
    dive_start_time: u32,

    start_candidate_since: Option<u32>,
    end_candidate_since: Option<u32>,

    last_depth: Depth,
    last_rate_time: Option<u32>,
    ascent_rate: f32,
    descent_rate: f32,

    avg_depth_sum: f32,
    avg_depth_samples: u32,

    ascent_rate_alarm: bool,
    deco_ceiling_alarm: bool,
    pp_o2_alarm: bool,
    missed_deco_stops: u8,

    safety_stop_required: bool,
    safety_stop_completed: bool,
    safety_stop_timer: u16,
    safety_stop_time: u16,

    surface_interval_start: Option<u32>,
    surface_interval_mins: u16,

    current_dive: DiveProfile,
    next_sample_offset: u32,
    next_dive_number: u32,
    last_sample_gas: GasIndex,

    max_ascent_rate: f32,
    fast_ascent_rate: f32,
    auto_start: bool,
    enforce_safety_stop: bool,
    sample_interval: u16,
}

impl Default for DiveManager {
    fn default() -> Self {
        Self {
            phase: DivePhase::Surface,
            diving: false,
            dive_start_time: 0,
            start_candidate_since: None,
            end_candidate_since: None,
            last_depth: Depth::zero(),
            last_rate_time: None,
            ascent_rate: 0.,
            descent_rate: 0.,
            avg_depth_sum: 0.,
            avg_depth_samples: 0,
            ascent_rate_alarm: false,
            deco_ceiling_alarm: false,
            pp_o2_alarm: false,
            missed_deco_stops: 0,
            safety_stop_required: false,
            safety_stop_completed: false,
            safety_stop_timer: 0,
            safety_stop_time: DEFAULT_SAFETY_STOP_TIME_S,
            surface_interval_start: None,
            surface_interval_mins: 0,
            current_dive: DiveProfile::default(),
            next_sample_offset: 0,
            next_dive_number: 1,
            last_sample_gas: 0,
            max_ascent_rate: DEFAULT_MAX_ASCENT_RATE,
            fast_ascent_rate: DEFAULT_FAST_ASCENT_RATE,
            auto_start: true,
            enforce_safety_stop: true,
            sample_interval: 1,
        }
    }
}

impl DiveManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1 Hz tick. `now` is a monotonic second counter (epoch seconds on the
    /// real device).
    pub fn update(
        &mut self,
        now: u32,
        depth: Depth,
        temperature: Celsius,
        snapshot: &ModelSnapshot,
    ) -> Option<DiveEvent> {
        let mut event = None;

        if self.auto_start {
            if !self.diving && self.check_dive_start(now, depth) {
                self.start_dive(now);
                event = Some(DiveEvent::Started);
            } else if self.diving && self.check_dive_end(now, depth) {
                self.end_dive(now);
                return Some(DiveEvent::Ended);
            }
        }

        if !self.diving {
            if let Some(start) = self.surface_interval_start {
                self.surface_interval_mins = ((now.saturating_sub(start)) / 60) as u16;
            }
            return event;
        }

        self.update_rates(now, depth);

        self.avg_depth_sum += depth.as_meters();
        self.avg_depth_samples += 1;

        self.ascent_rate_alarm = self.ascent_rate > self.fast_ascent_rate;

        let in_violation = snapshot.ceiling > Depth::zero() && depth < snapshot.ceiling;
        if in_violation && !self.deco_ceiling_alarm {
            self.missed_deco_stops = self.missed_deco_stops.saturating_add(1);
            self.current_dive.deco_violations = self.current_dive.deco_violations.saturating_add(1);
        }
        self.deco_ceiling_alarm = in_violation;
        self.pp_o2_alarm = snapshot.pp_o2_high || snapshot.pp_o2_low;

        self.classify_phase(depth, snapshot);

        if self.enforce_safety_stop {
            self.update_safety_stop(depth);
        }

        self.update_aggregates(depth, temperature, snapshot);

        let elapsed = now.saturating_sub(self.dive_start_time);
        if elapsed >= self.next_sample_offset {
            self.record_sample(elapsed, depth, temperature, snapshot);
            self.next_sample_offset = elapsed + self.current_dive.sample_interval as u32;
        }

        event
    }

    pub fn start_dive(&mut self, now: u32) {
        self.diving = true;
        self.dive_start_time = now;
        self.phase = DivePhase::Descent;

        self.current_dive = DiveProfile {
            dive_number: self.next_dive_number,
            start_timestamp: now,
            surface_interval: self.surface_interval_mins,
            sample_interval: self.sample_interval,
            ..DiveProfile::default()
        };
        self.next_dive_number += 1;

        self.next_sample_offset = 0;
        self.avg_depth_sum = 0.;
        self.avg_depth_samples = 0;
        self.ascent_rate = 0.;
        self.descent_rate = 0.;
        self.last_rate_time = None;
        self.missed_deco_stops = 0;
        self.safety_stop_required = false;
        self.safety_stop_completed = false;
        self.safety_stop_timer = 0;
        self.start_candidate_since = None;
        self.end_candidate_since = None;
        self.last_sample_gas = 0;
    }

    pub fn end_dive(&mut self, now: u32) {
        self.diving = false;
        self.phase = DivePhase::SurfaceInterval;
        self.surface_interval_start = Some(now);

        self.current_dive.end_timestamp = now;
        self.current_dive.duration = now.saturating_sub(self.current_dive.start_timestamp);
        if self.avg_depth_samples > 0 {
            self.current_dive.avg_depth =
                Depth::from_meters(self.avg_depth_sum / self.avg_depth_samples as f32);
        }

        self.start_candidate_since = None;
        self.end_candidate_since = None;
        self.ascent_rate_alarm = false;
        self.deco_ceiling_alarm = false;
    }

    fn check_dive_start(&mut self, now: u32, depth: Depth) -> bool {
        if depth.as_meters() >= DIVE_START_DEPTH_M {
            match self.start_candidate_since {
                None => {
                    self.start_candidate_since = Some(now);
                }
                Some(since) if now.saturating_sub(since) >= DIVE_START_HOLD_S => {
                    self.start_candidate_since = None;
                    return true;
                }
                Some(_) => {}
            }
        } else {
            self.start_candidate_since = None;
        }
        false
    }

    fn check_dive_end(&mut self, now: u32, depth: Depth) -> bool {
        if depth.as_meters() <= DIVE_END_DEPTH_M {
            match self.end_candidate_since {
                None => {
                    self.end_candidate_since = Some(now);
                }
                Some(since) if now.saturating_sub(since) >= DIVE_END_HOLD_S => {
                    self.end_candidate_since = None;
                    return true;
                }
                Some(_) => {}
            }
        } else {
            self.end_candidate_since = None;
        }
        false
    }

    fn update_rates(&mut self, now: u32, depth: Depth) {
        let Some(last_time) = self.last_rate_time else {
            self.last_rate_time = Some(now);
            self.last_depth = depth;
            return;
        };

        let minutes = now.saturating_sub(last_time) as f32 / 60.;
        if minutes > 0. {
            let sample = (self.last_depth - depth).as_meters() / minutes;
            self.ascent_rate = RATE_KEEP * self.ascent_rate + RATE_BLEND * sample;
            if self.ascent_rate < 0. {
                self.descent_rate = -self.ascent_rate;
            }
        }

        self.last_depth = depth;
        self.last_rate_time = Some(now);
    }

    fn classify_phase(&mut self, depth: Depth, snapshot: &ModelSnapshot) {
        let depth_m = depth.as_meters();

        self.phase = if self.ascent_rate < DESCENT_PHASE_RATE {
            DivePhase::Descent
        } else if self.ascent_rate > ASCENT_PHASE_RATE {
            if snapshot.ceiling > Depth::zero()
                && depth <= snapshot.ceiling + Depth::from_meters(DECO_STOP_WINDOW_M)
            {
                DivePhase::DecoStop
            } else {
                DivePhase::Ascent
            }
        } else if (SAFETY_STOP_PHASE_MIN_M..=SAFETY_STOP_PHASE_MAX_M).contains(&depth_m)
            && self.safety_stop_required
        {
            DivePhase::SafetyStop
        } else {
            DivePhase::Bottom
        };
    }

    fn update_safety_stop(&mut self, depth: Depth) {
        if self.current_dive.max_depth.as_meters() > SAFETY_STOP_TRIGGER_DEPTH_M
            && !self.safety_stop_completed
        {
            self.safety_stop_required = true;
        }

        if self.safety_stop_required {
            let depth_m = depth.as_meters();
            let in_hold_window =
                (SAFETY_STOP_HOLD_MIN_M..=SAFETY_STOP_HOLD_MAX_M).contains(&depth_m);
            if self.phase == DivePhase::SafetyStop && in_hold_window {
                self.safety_stop_timer += 1;
                if self.safety_stop_timer >= self.safety_stop_time {
                    self.safety_stop_completed = true;
                    self.safety_stop_required = false;
                }
            } else if !in_hold_window {
                self.safety_stop_timer = 0;
            }
        }
    }

    fn update_aggregates(&mut self, depth: Depth, temperature: Celsius, snapshot: &ModelSnapshot) {
        let dive = &mut self.current_dive;
        if depth > dive.max_depth {
            dive.max_depth = depth;
        }
        if temperature < dive.min_temperature || dive.min_temperature == 0. {
            dive.min_temperature = temperature;
        }
        if snapshot.deco_minutes as u16 > dive.max_deco_time {
            dive.max_deco_time = snapshot.deco_minutes as u16;
        }
        if snapshot.current_gf > dive.max_gf {
            dive.max_gf = snapshot.current_gf;
        }
        if snapshot.cns as f32 > dive.max_cns {
            dive.max_cns = snapshot.cns as f32;
        }
        if snapshot.otu > dive.max_otu {
            dive.max_otu = snapshot.otu;
        }
        dive.mark_gas_used(snapshot.gas_index);
    }

    fn record_sample(
        &mut self,
        elapsed: u32,
        depth: Depth,
        temperature: Celsius,
        snapshot: &ModelSnapshot,
    ) {
        let mut events = 0u16;
        if self.ascent_rate_alarm {
            events |= sample_events::ASCENT_RATE;
        }
        if self.deco_ceiling_alarm {
            events |= sample_events::DECO_VIOLATION;
        }
        if snapshot.pp_o2_high {
            events |= sample_events::PP_O2_HIGH;
        }
        if snapshot.pp_o2_low {
            events |= sample_events::PP_O2_LOW;
        }
        if self.phase == DivePhase::SafetyStop {
            events |= sample_events::SAFETY_STOP;
        }
        if !self.current_dive.samples.is_empty() && snapshot.gas_index != self.last_sample_gas {
            events |= sample_events::GAS_SWITCH;
        }
        self.last_sample_gas = snapshot.gas_index;

        self.current_dive.record_sample(DiveSample {
            time: elapsed.min(u16::MAX as u32) as u16,
            depth_cm: (depth.as_meters() * 100.) as i16,
            temperature_dc: (temperature * 10.) as i16,
            gas_index: snapshot.gas_index,
            deco_minutes: snapshot.deco_minutes,
            cns: snapshot.cns,
            events,
        });
    }

    pub fn phase(&self) -> DivePhase {
        self.phase
    }

    pub fn is_diving(&self) -> bool {
        self.diving
    }

    pub fn dive_time(&self, now: u32) -> u32 {
        if self.diving {
            now.saturating_sub(self.dive_start_time)
        } else {
            self.current_dive.duration
        }
    }

    pub fn ascent_rate(&self) -> f32 {
        self.ascent_rate
    }

    pub fn descent_rate(&self) -> f32 {
        self.descent_rate
    }

    pub fn ascent_rate_alarm(&self) -> bool {
        self.ascent_rate_alarm
    }

    pub fn deco_ceiling_alarm(&self) -> bool {
        self.deco_ceiling_alarm
    }

    pub fn pp_o2_alarm(&self) -> bool {
        self.pp_o2_alarm
    }

    pub fn missed_deco_stops(&self) -> u8 {
        self.missed_deco_stops
    }

    pub fn safety_stop_required(&self) -> bool {
        self.safety_stop_required
    }

    pub fn safety_stop_completed(&self) -> bool {
        self.safety_stop_completed
    }

    pub fn safety_stop_timer(&self) -> u16 {
        self.safety_stop_timer
    }

    pub fn surface_interval_mins(&self) -> u16 {
        self.surface_interval_mins
    }

    pub fn profile(&self) -> &DiveProfile {
        &self.current_dive
    }

    pub fn set_sample_interval(&mut self, seconds: u16) {
        self.sample_interval = seconds.max(1);
    }

    pub fn max_ascent_rate(&self) -> f32 {
        self.max_ascent_rate
    }

    pub fn set_max_ascent_rate(&mut self, rate: f32) {
        self.max_ascent_rate = rate;
    }

    pub fn set_fast_ascent_rate(&mut self, rate: f32) {
        self.fast_ascent_rate = rate;
    }

    pub fn set_safety_stop_time(&mut self, seconds: u16) {
        self.safety_stop_time = seconds;
    }

    pub fn set_auto_start(&mut self, auto_start: bool) {
        self.auto_start = auto_start;
    }

    pub fn set_enforce_safety_stop(&mut self, enforce: bool) {
        self.enforce_safety_stop = enforce;
    }

    pub fn set_next_dive_number(&mut self, number: u32) {
        self.next_dive_number = number;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap() -> ModelSnapshot {
        ModelSnapshot::default()
    }

    fn dive_to(dm: &mut DiveManager, now: &mut u32, depth: f32, seconds: u32) {
        for _ in 0..seconds {
            *now += 1;
            dm.update(*now, Depth::from_meters(depth), 20., &snap());
        }
    }

    #[test]
    fn test_start_detection_after_sustained_depth() {
        let mut dm = DiveManager::new();
        let mut now = 0;

        // dipping under briefly does not start a dive
        dive_to(&mut dm, &mut now, 1.5, 10);
        dive_to(&mut dm, &mut now, 0.5, 5);
        assert!(!dm.is_diving());

        // 20 sustained seconds do
        let mut started = 0;
        for _ in 0..25 {
            now += 1;
            if dm.update(now, Depth::from_meters(1.5), 20., &snap()) == Some(DiveEvent::Started) {
                started += 1;
            }
        }
        assert!(dm.is_diving());
        assert_eq!(started, 1);
        assert_eq!(dm.phase(), DivePhase::Descent);
    }

    #[test]
    fn test_end_detection_after_surface_hold() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 1.5, 21);
        assert!(dm.is_diving());
        dive_to(&mut dm, &mut now, 10., 60);

        let mut ended = 0;
        for _ in 0..DIVE_END_HOLD_S + 5 {
            now += 1;
            if dm.update(now, Depth::from_meters(0.4), 20., &snap()) == Some(DiveEvent::Ended) {
                ended += 1;
            }
        }
        assert!(!dm.is_diving());
        assert_eq!(ended, 1);
        assert_eq!(dm.phase(), DivePhase::SurfaceInterval);
        assert_eq!(dm.profile().duration, dm.profile().end_timestamp - dm.profile().start_timestamp);
    }

    #[test]
    fn test_rate_smoothing_and_alarm() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 10., 25);
        assert!(dm.is_diving());

        // settle the filter at constant depth
        dive_to(&mut dm, &mut now, 10., 30);
        assert!(dm.ascent_rate().abs() < 0.1);

        // a 0.3-0.5 m/s climb pushes the smoothed rate past 18 m/min
        for depth in [9.7, 9.4, 9.0, 8.5] {
            now += 1;
            dm.update(now, Depth::from_meters(depth), 20., &snap());
        }
        assert!(dm.ascent_rate_alarm());
        assert!(dm.ascent_rate() > 18.);
    }

    #[test]
    fn test_phase_classification() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 2., 21);

        // fast drop reads as descent
        for depth in [4., 6., 8., 10., 12.] {
            now += 1;
            dm.update(now, Depth::from_meters(depth), 20., &snap());
        }
        assert_eq!(dm.phase(), DivePhase::Descent);
        assert!(dm.descent_rate() > 5.);

        // hold at the bottom
        dive_to(&mut dm, &mut now, 12., 60);
        assert_eq!(dm.phase(), DivePhase::Bottom);

        // steady climb reads as ascent
        let mut depth = 12.;
        for _ in 0..30 {
            now += 1;
            depth -= 0.15;
            dm.update(now, Depth::from_meters(depth), 20., &snap());
        }
        assert_eq!(dm.phase(), DivePhase::Ascent);
    }

    #[test]
    fn test_deco_stop_phase_near_ceiling() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 30., 21);
        dive_to(&mut dm, &mut now, 30., 10);

        let deco_snap = ModelSnapshot {
            ceiling: Depth::from_meters(6.),
            ..ModelSnapshot::default()
        };
        // climbing right above the ceiling classifies as a deco stop
        let mut depth = 9.0;
        for _ in 0..20 {
            now += 1;
            depth = (depth - 0.1f32).max(7.0);
            dm.update(now, Depth::from_meters(depth), 20., &deco_snap);
        }
        assert_eq!(dm.phase(), DivePhase::DecoStop);
    }

    #[test]
    fn test_ceiling_violation_counts_once_per_excursion() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 30., 21);

        let deco_snap = ModelSnapshot {
            ceiling: Depth::from_meters(6.),
            ..ModelSnapshot::default()
        };
        for _ in 0..10 {
            now += 1;
            dm.update(now, Depth::from_meters(4.), 20., &deco_snap);
        }
        assert!(dm.deco_ceiling_alarm());
        assert_eq!(dm.missed_deco_stops(), 1);
        assert_eq!(dm.profile().deco_violations, 1);

        // drop back below, then violate again
        now += 1;
        dm.update(now, Depth::from_meters(8.), 20., &deco_snap);
        assert!(!dm.deco_ceiling_alarm());
        now += 1;
        dm.update(now, Depth::from_meters(4.), 20., &deco_snap);
        assert_eq!(dm.missed_deco_stops(), 2);
    }

    #[test]
    fn test_safety_stop_completion_and_reset() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 18., 21);
        dive_to(&mut dm, &mut now, 18., 30);
        assert!(dm.safety_stop_required());

        // most of the hold done, step out, timer resets
        dive_to(&mut dm, &mut now, 5.0, 170);
        assert_eq!(dm.phase(), DivePhase::SafetyStop);
        assert!(dm.safety_stop_timer() > 150);
        assert!(!dm.safety_stop_completed());

        now += 1;
        dm.update(now, Depth::from_meters(3.9), 20., &snap());
        assert_eq!(dm.safety_stop_timer(), 0);
        assert!(!dm.safety_stop_completed());

        // a fresh full hold completes the stop
        dive_to(&mut dm, &mut now, 5.0, 200);
        assert!(dm.safety_stop_completed());
        assert!(!dm.safety_stop_required());
    }

    #[test]
    fn test_sampling_cadence_and_events() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 10., 21);
        let samples_after_start = dm.profile().samples.len();
        dive_to(&mut dm, &mut now, 10., 60);
        assert_eq!(dm.profile().samples.len(), samples_after_start + 60);

        let sample = dm.profile().samples.last().unwrap();
        assert_eq!(sample.depth_cm, 1000);
        assert_eq!(sample.temperature_dc, 200);
    }

    #[test]
    fn test_aggregates() {
        let mut dm = DiveManager::new();
        let mut now = 0;
        dive_to(&mut dm, &mut now, 10., 21);
        for (depth, temp) in [(20., 18.), (30., 9.5), (25., 12.)] {
            now += 1;
            dm.update(
                now,
                Depth::from_meters(depth),
                temp,
                &ModelSnapshot {
                    cns: 14,
                    deco_minutes: 7,
                    current_gf: 62.,
                    gas_index: 1,
                    ..ModelSnapshot::default()
                },
            );
        }
        let profile = dm.profile();
        assert_eq!(profile.max_depth, Depth::from_meters(30.));
        assert_eq!(profile.min_temperature, 9.5);
        assert_eq!(profile.max_deco_time, 7);
        assert_eq!(profile.max_gf, 62.);
        assert_eq!(profile.max_cns, 14.);
        assert_eq!(profile.gases_used & 0b10, 0b10);
    }
}
