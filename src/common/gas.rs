use crate::common::global_types::{MbarPressure, Pressure};
use crate::common::{math, Depth};
use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// alveolar water vapor pressure assuming 47 mm Hg at 37C (Buhlmann's value)
pub const ALVEOLI_WATER_VAPOR_PRESSURE: Pressure = 0.0627;

pub const DEFAULT_PP_O2_MIN: Pressure = 0.16;
pub const DEFAULT_PP_O2_MAX: Pressure = 1.4;

const FRACTION_SUM_TOLERANCE: f32 = 1e-3;
const GAS_NAME_CAPACITY: usize = 16;

/// A breathing mix with its operating window and role flags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasMix {
    name: String<GAS_NAME_CAPACITY>,
    fo2: Pressure,
    fn2: Pressure,
    fhe: Pressure,
    pp_o2_min: Pressure,
    pp_o2_max: Pressure,
    enabled: bool,
    diluent: bool,
    bailout: bool,
}

#[derive(Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartialPressures {
    pub o2: Pressure,
    pub n2: Pressure,
    pub he: Pressure,
}

impl core::fmt::Display for GasMix {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.0}/{:.0}", self.fo2 * 100., self.fhe * 100.)
    }
}

impl GasMix {
    /// init a new mix from fractions (eg. 0.21, 0.79, 0. for air)
    pub fn new(name: &str, fo2: Pressure, fn2: Pressure, fhe: Pressure) -> Self {
        if !(0. ..=1.).contains(&fo2) {
            panic!("Invalid O2 fraction");
        }
        if !(0. ..=1.).contains(&fn2) {
            panic!("Invalid N2 fraction");
        }
        if !(0. ..=1.).contains(&fhe) {
            panic!("Invalid He fraction");
        }
        let sum = fo2 + fn2 + fhe;
        if math::abs(sum - 1.) > FRACTION_SUM_TOLERANCE {
            panic!("Invalid gas fractions, must sum to 1");
        }

        let mut stored_name: String<GAS_NAME_CAPACITY> = String::new();
        let trimmed = if name.len() > GAS_NAME_CAPACITY {
            &name[..GAS_NAME_CAPACITY]
        } else {
            name
        };
        let _ = stored_name.push_str(trimmed);

        Self {
            name: stored_name,
            fo2,
            fn2,
            fhe,
            pp_o2_min: DEFAULT_PP_O2_MIN,
            pp_o2_max: DEFAULT_PP_O2_MAX,
            enabled: true,
            diluent: false,
            bailout: false,
        }
    }

    pub fn air() -> Self {
        Self::new("Air", 0.21, 0.79, 0.)
    }

    pub fn with_pp_o2_window(mut self, pp_o2_min: Pressure, pp_o2_max: Pressure) -> Self {
        self.pp_o2_min = pp_o2_min;
        self.pp_o2_max = pp_o2_max;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn as_diluent(mut self) -> Self {
        self.diluent = true;
        self
    }

    pub fn as_bailout(mut self) -> Self {
        self.bailout = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fo2(&self) -> Pressure {
        self.fo2
    }

    pub fn fn2(&self) -> Pressure {
        self.fn2
    }

    pub fn fhe(&self) -> Pressure {
        self.fhe
    }

    pub fn inert_fractions(&self) -> (Pressure, Pressure) {
        (self.fn2, self.fhe)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_diluent(&self) -> bool {
        self.diluent
    }

    pub fn is_bailout(&self) -> bool {
        self.bailout
    }

    pub fn pp_o2_window(&self) -> (Pressure, Pressure) {
        (self.pp_o2_min, self.pp_o2_max)
    }

    /// gas partial pressures at ambient pressure
    pub fn partial_pressures(
        &self,
        depth: Depth,
        surface_pressure: MbarPressure,
    ) -> PartialPressures {
        let gas_pressure = ambient_pressure(depth, surface_pressure);
        self.pressures_compound(gas_pressure)
    }

    /// gas partial pressures in alveoli taking into account alveolar water vapor pressure
    pub fn inspired_partial_pressures(
        &self,
        depth: Depth,
        surface_pressure: MbarPressure,
    ) -> PartialPressures {
        let gas_pressure = ambient_pressure(depth, surface_pressure) - ALVEOLI_WATER_VAPOR_PRESSURE;
        self.pressures_compound(gas_pressure)
    }

    fn pressures_compound(&self, gas_pressure: Pressure) -> PartialPressures {
        PartialPressures {
            o2: self.fo2 * gas_pressure,
            n2: self.fn2 * gas_pressure,
            he: self.fhe * gas_pressure,
        }
    }

    /// ppO2 at depth; the quantity the gas window and best-gas scan operate on
    pub fn pp_o2_at(&self, depth: Depth, surface_pressure: MbarPressure) -> Pressure {
        self.fo2 * ambient_pressure(depth, surface_pressure)
    }

    /// MOD derived from this mix's configured ppO2 ceiling
    pub fn max_operating_depth(&self) -> Depth {
        Depth::from_meters(10. * ((self.pp_o2_max / self.fo2) - 1.))
    }

    /// END relative to air at the given depth
    pub fn equivalent_narcotic_depth(&self, depth: Depth, surface_pressure: MbarPressure) -> Depth {
        let pp_n2 = self.fn2 * ambient_pressure(depth, surface_pressure);
        let end = 10. * ((pp_n2 / 0.79) - 1.);
        if end < 0. {
            return Depth::zero();
        }
        Depth::from_meters(end)
    }
}

pub(crate) fn ambient_pressure(depth: Depth, surface_pressure: MbarPressure) -> Pressure {
    (surface_pressure as Pressure / 1000.) + (depth.as_meters() / 10.)
}
