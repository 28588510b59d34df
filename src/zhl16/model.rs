use crate::common::{
    math, AscentRatePerMinute, Cns, Depth, Otu, OxTox, Pressure, Sim, Time,
    ALVEOLI_WATER_VAPOR_PRESSURE,
};
use crate::zhl16::compartment::{Compartment, InspiredPressures};
use crate::zhl16::config::DecoConfig;
use crate::zhl16::gas_table::GasTable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const NUM_COMPARTMENTS: usize = 16;

const NDL_CUT_OFF_MINS: f32 = 99.;

/// Current and surfacing supersaturation percent of the leading compartment.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Supersaturation {
    pub gf_now: f32,
    pub gf_surf: f32,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Zhl16Model {
    config: DecoConfig,
    compartments: [Compartment; NUM_COMPARTMENTS],
    gases: GasTable,
    state: ModelState,
    sim: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct ModelState {
    depth: Depth,
    max_depth: Depth,
    time: Time,
    ccr_mode: bool,
    measured_pp_o2: Pressure,
    ox_tox: OxTox,
    leading_compartment: u8,
    max_loading: f32,
}

impl ModelState {
    fn initial() -> Self {
        Self {
            depth: Depth::zero(),
            max_depth: Depth::zero(),
            time: Time::zero(),
            ccr_mode: false,
            measured_pp_o2: 0.,
            ox_tox: OxTox::default(),
            leading_compartment: 0,
            max_loading: 0.,
        }
    }
}

impl Sim for Zhl16Model {
    fn fork(&self) -> Self {
        Self {
            sim: true,
            ..self.clone()
        }
    }
    fn is_sim(&self) -> bool {
        self.sim
    }
}

impl Zhl16Model {
    /// New model with every compartment in equilibrium with air at the
    /// configured surface pressure.
    pub fn new(config: DecoConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("Config error [{}]: {}", e.field, e.reason);
        }

        let surface_pressure = config.surface_pressure_bar();
        let params = config.variant.params();
        let compartments: [Compartment; NUM_COMPARTMENTS] =
            core::array::from_fn(|i| Compartment::new(i as u8 + 1, params[i], surface_pressure));

        let mut gases = GasTable::new();
        gases.add_gas(0, crate::common::GasMix::air());

        Self {
            config,
            compartments,
            gases,
            state: ModelState::initial(),
            sim: false,
        }
    }

    pub fn config(&self) -> DecoConfig {
        self.config
    }

    pub fn gas_table(&self) -> &GasTable {
        &self.gases
    }

    pub fn gas_table_mut(&mut self) -> &mut GasTable {
        &mut self.gases
    }

    pub fn depth(&self) -> Depth {
        self.state.depth
    }

    pub fn max_depth(&self) -> Depth {
        self.state.max_depth
    }

    pub fn dive_time(&self) -> Time {
        self.state.time
    }

    pub fn ambient_pressure(&self) -> Pressure {
        self.config.surface_pressure_bar() + self.state.depth.as_meters() / 10.
    }

    pub fn is_ccr_mode(&self) -> bool {
        self.state.ccr_mode
    }

    pub fn measured_pp_o2(&self) -> Pressure {
        self.state.measured_pp_o2
    }

    pub fn cns(&self) -> Cns {
        self.state.ox_tox.cns()
    }

    pub fn otu(&self) -> Otu {
        self.state.ox_tox.otu()
    }

    pub fn ox_tox(&self) -> OxTox {
        self.state.ox_tox
    }

    pub fn tissues(&self) -> &[Compartment; NUM_COMPARTMENTS] {
        &self.compartments
    }

    pub fn leading_compartment(&self) -> &Compartment {
        &self.compartments[self.state.leading_compartment as usize]
    }

    pub fn max_loading(&self) -> f32 {
        self.state.max_loading
    }

    pub fn set_depth(&mut self, depth: Depth) {
        self.validate_depth(depth);
        self.state.depth = depth;
        if depth > self.state.max_depth {
            self.state.max_depth = depth;
        }
    }

    /// Engage or drop rebreather inspired-pressure handling.
    pub fn set_ccr_mode(&mut self, enabled: bool) {
        self.state.ccr_mode = enabled;
        if !enabled {
            self.state.measured_pp_o2 = 0.;
        }
    }

    /// Loop ppO2 as measured by the cell vote; only meaningful in CCR mode.
    pub fn update_measured_pp_o2(&mut self, pp_o2: Pressure) {
        self.state.measured_pp_o2 = pp_o2;
    }

    /// Drop the loop and activate the first enabled bailout mix.
    pub fn switch_to_bailout(&mut self) {
        self.state.ccr_mode = false;
        self.state.measured_pp_o2 = 0.;
        if let Some(idx) = self.gases.first_bailout_gas() {
            self.gases.switch_gas(idx);
        }
    }

    /// Integrate tissue loading at the current depth over the segment.
    pub fn update_tissues(&mut self, time: Time) {
        let inspired = self.inspired_inert_pressures();
        let ambient = self.ambient_pressure();

        let mut max_loading = 0.;
        let mut leading = 0;
        for (i, compartment) in self.compartments.iter_mut().enumerate() {
            compartment.recalculate(&inspired, time, ambient);
            if compartment.loading > max_loading {
                max_loading = compartment.loading;
                leading = i;
            }
        }
        self.state.max_loading = max_loading;
        self.state.leading_compartment = leading as u8;
        self.state.time += time;
    }

    /// Accumulate CNS/OTU at the working ppO2; skipped in planner forks.
    pub fn update_ox_tox(&mut self, time: Time) {
        if self.is_sim() {
            return;
        }
        let pp_o2 = self.working_pp_o2();
        self.state.ox_tox.recalculate(pp_o2, time);
    }

    /// ppO2 the diver actually breathes: the cell vote on the loop, the gas
    /// fraction at ambient otherwise.
    pub fn working_pp_o2(&self) -> Pressure {
        if self.state.ccr_mode {
            self.state.measured_pp_o2
        } else {
            self.ambient_pressure() * self.gases.current_gas().fo2()
        }
    }

    /// Linear depth change at the given rate, integrating tissues in 1 s
    /// steps along the way.
    pub fn travel(&mut self, target_depth: Depth, rate: AscentRatePerMinute) {
        self.validate_depth(target_depth);
        let distance = target_depth - self.state.depth;
        let travel_seconds = math::abs(distance.as_meters()) / rate * 60.;
        if travel_seconds < 1. {
            self.set_depth(target_depth);
            return;
        }
        let depth_step = distance / travel_seconds;

        let mut elapsed = 0.;
        while elapsed < travel_seconds {
            elapsed += 1.;
            let mut next = self.state.depth + depth_step;
            if next < Depth::zero() {
                next = Depth::zero();
            }
            self.set_depth(if elapsed >= travel_seconds {
                target_depth
            } else {
                next
            });
            self.update_tissues(Time::from_seconds(1.));
            self.update_ox_tox(Time::from_seconds(1.));
        }
    }

    /// Shallowest depth the diver may ascend to, rounded up to the stop grid.
    pub fn ceiling(&self) -> Depth {
        let surface_pressure = self.config.surface_pressure_bar();
        let gf = self.current_gf_fraction(self.state.depth);

        let mut ceiling_m: f32 = 0.;
        for compartment in self.compartments.iter() {
            if compartment.total_inert_pressure() <= 0. {
                continue;
            }
            let tolerated = compartment.tolerated_ambient_pressure(gf);
            let compartment_ceiling = (tolerated - surface_pressure) * 10.;
            if compartment_ceiling > ceiling_m {
                ceiling_m = compartment_ceiling;
            }
        }

        if ceiling_m <= 0. {
            return Depth::zero();
        }

        let stop_interval = self.config.last_stop_depth.as_meters();
        Depth::from_meters(math::ceil(ceiling_m / stop_interval) * stop_interval)
    }

    pub fn in_deco(&self) -> bool {
        self.ceiling() > Depth::zero()
    }

    /// Minutes of further bottom time before a stop becomes required;
    /// closed-form Schreiner inversion toward the gf-high surface m-value.
    pub fn ndl(&self) -> Time {
        if self.in_deco() {
            return Time::zero();
        }

        let surface_pressure = self.config.surface_pressure_bar();
        let (_, gf_high) = self.config.gf;
        let gf = gf_high as f32 / 100.;
        let inspired = self.inspired_inert_pressures();

        let mut ndl_minutes = NDL_CUT_OFF_MINS;
        for compartment in self.compartments.iter() {
            let (half_time_n2, a_n2, b_n2) = compartment.n2_params();
            if let Some(minutes) = Self::minutes_to_m_value(
                compartment.p_n2,
                inspired.n2,
                half_time_n2,
                Compartment::tolerated_inert_pressure(a_n2, b_n2, surface_pressure, gf),
            ) {
                ndl_minutes = ndl_minutes.min(minutes);
            }

            if inspired.he > 0. {
                let (half_time_he, a_he, b_he) = compartment.he_params();
                if let Some(minutes) = Self::minutes_to_m_value(
                    compartment.p_he,
                    inspired.he,
                    half_time_he,
                    Compartment::tolerated_inert_pressure(a_he, b_he, surface_pressure, gf),
                ) {
                    ndl_minutes = ndl_minutes.min(minutes);
                }
            }
        }

        Time::from_minutes(ndl_minutes)
    }

    /// GF at current compartment state; gf_now against current ambient,
    /// gf_surf against the surface.
    pub fn supersaturation(&self) -> Supersaturation {
        let surface_pressure = self.config.surface_pressure_bar();
        let ambient = self.ambient_pressure();

        let mut acc = Supersaturation::default();
        for compartment in self.compartments.iter() {
            let p_total = compartment.total_inert_pressure();
            let gf_now = Self::gradient_percent(p_total, compartment.m_value(ambient), ambient);
            let gf_surf = Self::gradient_percent(
                p_total,
                compartment.m_value(surface_pressure),
                surface_pressure,
            );
            if gf_now > acc.gf_now {
                acc.gf_now = gf_now;
            }
            if gf_surf > acc.gf_surf {
                acc.gf_surf = gf_surf;
            }
        }

        acc
    }

    /// Inspired inert pressures for the active mode. On the loop the inert
    /// budget is ambient minus the measured ppO2, split by the diluent's
    /// inert ratio; open circuit follows the alveolar gas fractions.
    pub fn inspired_inert_pressures(&self) -> InspiredPressures {
        let ambient = self.ambient_pressure();
        let gas = self.gases.current_gas();
        let (fn2, fhe) = gas.inert_fractions();

        if self.state.ccr_mode {
            let inert_budget = (ambient - self.state.measured_pp_o2).max(0.);
            let total_inert = fn2 + fhe;
            if total_inert <= 0. {
                return InspiredPressures::default();
            }
            InspiredPressures {
                n2: inert_budget * (fn2 / total_inert),
                he: inert_budget * (fhe / total_inert),
            }
        } else {
            let alveolar = ambient - ALVEOLI_WATER_VAPOR_PRESSURE;
            InspiredPressures {
                n2: alveolar * fn2,
                he: alveolar * fhe,
            }
        }
    }

    /// GF allowed at the given depth: gf_low at max depth blending linearly
    /// to gf_high at the surface.
    pub fn current_gf_fraction(&self, depth: Depth) -> f32 {
        let (gf_low, gf_high) = self.config.gf;
        let (gf_low, gf_high) = (gf_low as f32 / 100., gf_high as f32 / 100.);

        let max_depth = self.state.max_depth.as_meters();
        if depth <= Depth::zero() || max_depth <= 0. {
            return gf_high;
        }
        let depth_m = depth.as_meters().min(max_depth);
        gf_low + (gf_high - gf_low) * (max_depth - depth_m) / max_depth
    }

    fn minutes_to_m_value(
        p: Pressure,
        p_inspired: Pressure,
        half_time: f32,
        m_value: Pressure,
    ) -> Option<f32> {
        // bound exists only while on-gassing toward a load above the m-value
        if p >= m_value || p_inspired <= m_value {
            return None;
        }
        let k = core::f32::consts::LN_2 / half_time;
        Some(-math::ln((m_value - p_inspired) / (p - p_inspired)) / k)
    }

    fn gradient_percent(p_total: Pressure, m_value: Pressure, ambient: Pressure) -> f32 {
        let gradient = 100. * (p_total - ambient) / (m_value - ambient);
        gradient.max(0.)
    }

    fn validate_depth(&self, depth: Depth) {
        if depth < Depth::zero() {
            panic!("Invalid depth [{depth}]");
        }
    }
}
