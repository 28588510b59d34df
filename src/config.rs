use crate::common::{AscentRatePerMinute, Depth, GradientFactors, MbarPressure};
use crate::zhl16::{DecoConfig, ZhlVariant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Persisted device configuration; everything the user can change from the
/// settings menus.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemConfig {
    pub metric_units: bool,
    pub celsius: bool,

    pub brightness: u8,
    pub contrast: u8,
    pub backlight_timeout: u16,

    pub audible_alarms: bool,
    pub alarm_volume: u8,
    pub vibration_alerts: bool,

    /// seconds between profile samples
    pub log_rate: u8,

    pub pressure_offset_mbar: f32,
    pub temperature_offset: f32,
    pub cell_calibration: [f32; 3],

    pub gf: GradientFactors,
    pub ascent_rate: AscentRatePerMinute,
    pub safety_stop_depth: f32,
    pub safety_stop_time: u16,
    pub variant: ZhlVariant,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            metric_units: true,
            celsius: true,
            brightness: 80,
            contrast: 50,
            backlight_timeout: 30,
            audible_alarms: true,
            alarm_volume: 80,
            vibration_alerts: false,
            log_rate: 1,
            pressure_offset_mbar: 0.,
            temperature_offset: 0.,
            cell_calibration: [crate::ccr::DEFAULT_CELL_CALIBRATION; 3],
            gf: (30, 85),
            ascent_rate: 10.,
            safety_stop_depth: 5.,
            safety_stop_time: 180,
            variant: ZhlVariant::B,
        }
    }
}

impl SystemConfig {
    /// Model configuration for a dive starting at the given surface pressure.
    pub fn deco_config(&self, surface_pressure: MbarPressure) -> DecoConfig {
        DecoConfig::new()
            .with_gradient_factors(self.gf.0, self.gf.1)
            .with_surface_pressure(surface_pressure)
            .with_variant(self.variant)
            .with_ascent_rate(self.ascent_rate)
            .with_safety_stop(
                Depth::from_meters(self.safety_stop_depth),
                self.safety_stop_time,
                true,
            )
    }
}
