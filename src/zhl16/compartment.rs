use crate::common::{math, Pressure, Time, ALVEOLI_WATER_VAPOR_PRESSURE};
use crate::zhl16::zhl_values::ZhlParams;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const LN_2: f32 = core::f32::consts::LN_2;
const AIR_N2_FRACTION: f32 = 0.79;
// He tolerance coefficients derived from N2 until a dedicated He table lands
const HE_A_FACTOR: f32 = 1.5;
const HE_B_FACTOR: f32 = 0.9;

/// Inspired inert-gas partial pressures driving a tissue update.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InspiredPressures {
    pub n2: Pressure,
    pub he: Pressure,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Compartment {
    pub no: u8,
    half_time_n2: f32,
    a_n2: Pressure,
    b_n2: Pressure,
    half_time_he: f32,
    a_he: Pressure,
    b_he: Pressure,
    pub p_n2: Pressure,
    pub p_he: Pressure,
    pub loading: f32,
}

impl Compartment {
    /// New compartment in equilibrium with air at the given surface pressure (bar).
    pub fn new(no: u8, params: ZhlParams, surface_pressure: Pressure) -> Self {
        let (half_time_n2, a_n2, b_n2, half_time_he) = params;
        let mut compartment = Self {
            no,
            half_time_n2,
            a_n2,
            b_n2,
            half_time_he,
            a_he: a_n2 * HE_A_FACTOR,
            b_he: b_n2 * HE_B_FACTOR,
            p_n2: (surface_pressure - ALVEOLI_WATER_VAPOR_PRESSURE) * AIR_N2_FRACTION,
            p_he: 0.,
            loading: 0.,
        };
        compartment.update_loading(surface_pressure);

        compartment
    }

    /// Schreiner update of both inert gases over the segment, then refresh
    /// the loading percent against the ambient pressure.
    pub fn recalculate(
        &mut self,
        inspired: &InspiredPressures,
        time: Time,
        ambient_pressure: Pressure,
    ) {
        let minutes = time.as_minutes();
        self.p_n2 = Self::schreiner(self.p_n2, inspired.n2, self.half_time_n2, minutes);
        self.p_he = Self::schreiner(self.p_he, inspired.he, self.half_time_he, minutes);
        self.update_loading(ambient_pressure);
    }

    fn schreiner(p: Pressure, p_inspired: Pressure, half_time: f32, minutes: f32) -> Pressure {
        p_inspired + (p - p_inspired) * math::exp(-(LN_2 / half_time) * minutes)
    }

    pub fn total_inert_pressure(&self) -> Pressure {
        self.p_n2 + self.p_he
    }

    /// Tolerance coefficients weighted by the current inert loadings.
    pub fn weighted_params(&self) -> (Pressure, Pressure) {
        let p_total = self.total_inert_pressure();
        if p_total <= 0. {
            return (self.a_n2, self.b_n2);
        }
        let a = (self.a_n2 * self.p_n2 + self.a_he * self.p_he) / p_total;
        let b = (self.b_n2 * self.p_n2 + self.b_he * self.p_he) / p_total;
        (a, b)
    }

    pub fn m_value(&self, ambient_pressure: Pressure) -> Pressure {
        let (a, b) = self.weighted_params();
        a + ambient_pressure / b
    }

    /// Ambient pressure this compartment tolerates at the given gradient
    /// factor (fraction).
    pub fn tolerated_ambient_pressure(&self, gf: f32) -> Pressure {
        let (a, b) = self.weighted_params();
        (self.total_inert_pressure() - a * gf) / (1. / b - gf + 1.)
    }

    /// Highest total inert pressure tolerated at the given ambient pressure
    /// and gradient factor; inverse of `tolerated_ambient_pressure` with
    /// per-gas coefficients, used by the NDL inversion.
    pub fn tolerated_inert_pressure(
        a: Pressure,
        b: Pressure,
        ambient_pressure: Pressure,
        gf: f32,
    ) -> Pressure {
        a * gf + ambient_pressure * (1. / b + 1. - gf)
    }

    pub fn n2_params(&self) -> (f32, Pressure, Pressure) {
        (self.half_time_n2, self.a_n2, self.b_n2)
    }

    pub fn he_params(&self) -> (f32, Pressure, Pressure) {
        (self.half_time_he, self.a_he, self.b_he)
    }

    fn update_loading(&mut self, ambient_pressure: Pressure) {
        self.loading = 100. * self.total_inert_pressure() / self.m_value(ambient_pressure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zhl16::zhl_values::ZHL_16B_VALUES;

    fn comp_1() -> Compartment {
        Compartment::new(1, ZHL_16B_VALUES[0], 1.013)
    }

    #[test]
    fn test_constructor() {
        let cpt = comp_1();
        assert!((cpt.p_n2 - (1.013 - 0.0627) * 0.79).abs() < 1e-6);
        assert_eq!(cpt.p_he, 0.);
        assert!(cpt.loading > 0.);
        // He coefficients derived from N2
        let (_, a_he, b_he) = cpt.he_params();
        assert!((a_he - 1.2599 * 1.5).abs() < 1e-6);
        assert!((b_he - 0.5050 * 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_ongassing_converges_by_half_times() {
        let mut cpt = comp_1();
        let inspired = InspiredPressures { n2: 3.0, he: 0. };
        let start = cpt.p_n2;

        // one half-time closes half the gap
        cpt.recalculate(&inspired, Time::from_minutes(4.), 4.0);
        let expected = inspired.n2 + (start - inspired.n2) * 0.5;
        assert!((cpt.p_n2 - expected).abs() < expected * 0.01);

        // ten more half-times converge on the inspired pressure
        cpt.recalculate(&inspired, Time::from_minutes(40.), 4.0);
        assert!((cpt.p_n2 - inspired.n2).abs() < 0.01);
    }

    #[test]
    fn test_weighted_params_pure_n2() {
        let cpt = comp_1();
        let (a, b) = cpt.weighted_params();
        assert_eq!((a, b), (1.2599, 0.5050));
    }

    #[test]
    fn test_weighted_params_mixed() {
        let mut cpt = comp_1();
        cpt.p_n2 = 1.0;
        cpt.p_he = 1.0;
        let (a, b) = cpt.weighted_params();
        assert!((a - (1.2599 + 1.2599 * 1.5) / 2.).abs() < 1e-6);
        assert!((b - (0.5050 + 0.5050 * 0.9) / 2.).abs() < 1e-6);
    }

    #[test]
    fn test_tolerated_ambient_pressure_roundtrip() {
        let mut cpt = comp_1();
        cpt.p_n2 = 2.5;
        let gf = 0.85;
        let tolerated = cpt.tolerated_ambient_pressure(gf);
        let (a, b) = cpt.weighted_params();
        let back = Compartment::tolerated_inert_pressure(a, b, tolerated, gf);
        assert!((back - cpt.total_inert_pressure()).abs() < 1e-4);
    }
}
