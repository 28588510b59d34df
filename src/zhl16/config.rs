use crate::common::{
    AscentRatePerMinute, ConfigValidationErr, Depth, GradientFactor, GradientFactors, MbarPressure,
};
use crate::zhl16::ZhlVariant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const GF_RANGE_ERR_MSG: &str = "GF values have to be in 1-100 range";
const GF_ORDER_ERR_MSG: &str = "GFLow can't be higher than GFHigh";
const SURFACE_PRESSURE_ERR_MSG: &str = "Surface pressure must be in milibars in 500-1500 range";
const ASCENT_RATE_ERR_MSG: &str = "Ascent rate must be in 1-30 m/min range";
const DESCENT_RATE_ERR_MSG: &str = "Descent rate must be in 1-30 m/min range";
const LAST_STOP_DEPTH_ERR_MSG: &str = "Last stop depth must be in 3-9 m range";
const ALTITUDE_LEVEL_ERR_MSG: &str = "Altitude level must be in 0-4 range";

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoConfig {
    pub gf: GradientFactors,
    pub surface_pressure: MbarPressure,
    pub variant: ZhlVariant,
    pub last_stop_depth: Depth,
    pub ascent_rate: AscentRatePerMinute,
    pub descent_rate: AscentRatePerMinute,
    pub safety_stop_required: bool,
    pub safety_stop_depth: Depth,
    pub safety_stop_time: u16,
    pub altitude_level: u8,
    pub conservatism: bool,
}

impl Default for DecoConfig {
    fn default() -> Self {
        Self {
            gf: (30, 85),
            surface_pressure: 1013,
            variant: ZhlVariant::B,
            last_stop_depth: Depth::from_meters(3.),
            ascent_rate: 10.,
            descent_rate: 20.,
            safety_stop_required: true,
            safety_stop_depth: Depth::from_meters(5.),
            safety_stop_time: 180,
            altitude_level: 0,
            conservatism: false,
        }
    }
}

impl DecoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gradient_factors<T: Into<GradientFactor>>(mut self, gf_low: T, gf_high: T) -> Self {
        self.gf = (gf_low.into(), gf_high.into());
        self
    }

    pub fn with_surface_pressure<T: Into<MbarPressure>>(mut self, surface_pressure: T) -> Self {
        self.surface_pressure = surface_pressure.into();
        self
    }

    pub fn with_variant(mut self, variant: ZhlVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_last_stop_depth(mut self, last_stop_depth: Depth) -> Self {
        self.last_stop_depth = last_stop_depth;
        self
    }

    pub fn with_ascent_rate<T: Into<AscentRatePerMinute>>(mut self, ascent_rate: T) -> Self {
        self.ascent_rate = ascent_rate.into();
        self
    }

    pub fn with_descent_rate<T: Into<AscentRatePerMinute>>(mut self, descent_rate: T) -> Self {
        self.descent_rate = descent_rate.into();
        self
    }

    pub fn with_safety_stop(mut self, depth: Depth, time_seconds: u16, required: bool) -> Self {
        self.safety_stop_depth = depth;
        self.safety_stop_time = time_seconds;
        self.safety_stop_required = required;
        self
    }

    pub fn with_altitude_level(mut self, altitude_level: u8) -> Self {
        self.altitude_level = altitude_level;
        self
    }

    pub fn with_conservatism(mut self, conservatism: bool) -> Self {
        self.conservatism = conservatism;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigValidationErr> {
        self.validate_gradient_factors()?;
        self.validate_surface_pressure()?;
        self.validate_rates()?;
        self.validate_last_stop_depth()?;
        self.validate_altitude_level()?;

        Ok(())
    }

    pub fn surface_pressure_bar(&self) -> f32 {
        self.surface_pressure as f32 / 1000.
    }

    fn validate_gradient_factors(&self) -> Result<(), ConfigValidationErr> {
        let (gf_low, gf_high) = self.gf;
        let gf_range = 1..=100;

        if !gf_range.contains(&gf_low) || !gf_range.contains(&gf_high) {
            return Err(ConfigValidationErr::new("gf", GF_RANGE_ERR_MSG));
        }

        if gf_low > gf_high {
            return Err(ConfigValidationErr::new("gf", GF_ORDER_ERR_MSG));
        }

        Ok(())
    }

    fn validate_surface_pressure(&self) -> Result<(), ConfigValidationErr> {
        let mbar_pressure_range = 500..=1500;
        if !mbar_pressure_range.contains(&self.surface_pressure) {
            return Err(ConfigValidationErr::new(
                "surface_pressure",
                SURFACE_PRESSURE_ERR_MSG,
            ));
        }

        Ok(())
    }

    fn validate_rates(&self) -> Result<(), ConfigValidationErr> {
        let rate_range = 1.0..=30.0;
        if !rate_range.contains(&self.ascent_rate) {
            return Err(ConfigValidationErr::new("ascent_rate", ASCENT_RATE_ERR_MSG));
        }
        if !rate_range.contains(&self.descent_rate) {
            return Err(ConfigValidationErr::new(
                "descent_rate",
                DESCENT_RATE_ERR_MSG,
            ));
        }

        Ok(())
    }

    fn validate_last_stop_depth(&self) -> Result<(), ConfigValidationErr> {
        let last_stop_range = Depth::from_meters(3.)..=Depth::from_meters(9.);
        if !last_stop_range.contains(&self.last_stop_depth) {
            return Err(ConfigValidationErr::new(
                "last_stop_depth",
                LAST_STOP_DEPTH_ERR_MSG,
            ));
        }

        Ok(())
    }

    fn validate_altitude_level(&self) -> Result<(), ConfigValidationErr> {
        if self.altitude_level > 4 {
            return Err(ConfigValidationErr::new(
                "altitude_level",
                ALTITUDE_LEVEL_ERR_MSG,
            ));
        }

        Ok(())
    }
}
