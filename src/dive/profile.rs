use crate::common::{Celsius, Depth};
use crate::dive::sample::DiveSample;
use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One hour at the default 1 Hz cadence.
pub const MAX_DIVE_SAMPLES: usize = 3600;

/// Logbook record of a single dive: fixed header plus the sample stream.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiveProfile {
    pub dive_number: u32,
    pub start_timestamp: u32,
    pub end_timestamp: u32,

    pub max_depth: Depth,
    pub avg_depth: Depth,
    /// seconds
    pub duration: u32,
    /// zero-as-unset
    pub min_temperature: Celsius,
    /// minutes of surface interval before this dive
    pub surface_interval: u16,

    pub deco_violations: u8,
    /// minutes
    pub max_deco_time: u16,
    pub max_gf: f32,
    pub max_cns: f32,
    pub max_otu: f32,

    /// bitmap over gas table indices
    pub gases_used: u16,
    /// litres per minute at the surface
    pub sac_rate: f32,

    /// seconds between samples; doubles on every in-place compression
    pub sample_interval: u16,
    pub samples: Vec<DiveSample, MAX_DIVE_SAMPLES>,
}

impl Default for DiveProfile {
    fn default() -> Self {
        Self {
            dive_number: 0,
            start_timestamp: 0,
            end_timestamp: 0,
            max_depth: Depth::zero(),
            avg_depth: Depth::zero(),
            duration: 0,
            min_temperature: 0.,
            surface_interval: 0,
            deco_violations: 0,
            max_deco_time: 0,
            max_gf: 0.,
            max_cns: 0.,
            max_otu: 0.,
            gases_used: 0,
            sac_rate: 0.,
            sample_interval: 1,
            samples: Vec::new(),
        }
    }
}

impl DiveProfile {
    /// Append a sample, compressing in place first when the buffer is full.
    pub fn record_sample(&mut self, sample: DiveSample) {
        if self.samples.is_full() {
            self.compress_samples();
        }
        let _ = self.samples.push(sample);
    }

    /// Keep every second sample in place, doubling the effective cadence of
    /// the remaining recording. Sample time offsets are not re-stamped.
    pub fn compress_samples(&mut self) {
        let len = self.samples.len();
        let mut kept = 0;
        let mut i = 0;
        while i < len {
            self.samples[kept] = self.samples[i];
            kept += 1;
            i += 2;
        }
        self.samples.truncate(kept);
        self.sample_interval = self.sample_interval.saturating_mul(2);
    }

    /// Surface air consumption from cylinder pressure drop over the dive.
    pub fn compute_sac(
        &mut self,
        start_pressure_bar: f32,
        end_pressure_bar: f32,
        cylinder_litres: f32,
    ) -> f32 {
        let minutes = self.duration as f32 / 60.;
        if minutes <= 0. {
            return 0.;
        }
        let consumed_litres = (start_pressure_bar - end_pressure_bar) * cylinder_litres;
        let avg_ata = 1. + self.avg_depth.as_meters() / 10.;
        self.sac_rate = consumed_litres / (avg_ata * minutes);
        self.sac_rate
    }

    pub fn mark_gas_used(&mut self, gas_index: u8) {
        if gas_index < 16 {
            self.gases_used |= 1 << gas_index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(time: u16) -> DiveSample {
        DiveSample {
            time,
            depth_cm: 1000,
            ..DiveSample::default()
        }
    }

    #[test]
    fn test_compression_halves_and_keeps_first() {
        let mut profile = DiveProfile::default();
        for t in 0..100u16 {
            profile.record_sample(sample_at(t));
        }
        profile.compress_samples();
        assert_eq!(profile.samples.len(), 50);
        assert_eq!(profile.samples[0].time, 0);
        assert_eq!(profile.samples[1].time, 2);
        assert_eq!(profile.samples[49].time, 98);
        assert_eq!(profile.sample_interval, 2);
    }

    #[test]
    fn test_overflow_triggers_compression() {
        let mut profile = DiveProfile::default();
        for t in 0..MAX_DIVE_SAMPLES as u16 {
            profile.record_sample(sample_at(t));
        }
        assert_eq!(profile.samples.len(), MAX_DIVE_SAMPLES);
        profile.record_sample(sample_at(MAX_DIVE_SAMPLES as u16));
        assert_eq!(profile.samples.len(), MAX_DIVE_SAMPLES / 2 + 1);
        assert_eq!(profile.samples[0].time, 0);
        assert_eq!(profile.sample_interval, 2);
    }

    #[test]
    fn test_sac_rate() {
        let mut profile = DiveProfile {
            duration: 40 * 60,
            avg_depth: Depth::from_meters(20.),
            ..DiveProfile::default()
        };
        // 200 -> 100 bar on a 12l cylinder over 40 min at 3 ata
        let sac = profile.compute_sac(200., 100., 12.);
        assert!((sac - 10.).abs() < 1e-4);
    }

    #[test]
    fn test_gases_used_bitmap() {
        let mut profile = DiveProfile::default();
        profile.mark_gas_used(0);
        profile.mark_gas_used(3);
        profile.mark_gas_used(3);
        assert_eq!(profile.gases_used, 0b1001);
    }
}
