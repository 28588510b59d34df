use crate::common::cns_table::CNS_SINGLE_EXPOSURE_LIMITS;
use crate::common::{math, Cns, Otu, Pressure, Time};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const CNS_ELIMINATION_HALF_TIME_MINUTES: f32 = 90.;
// no CNS uptake and no OTU accumulation below this ppO2
const OX_TOX_THRESHOLD_PP_O2: Pressure = 0.5;

#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OxTox {
    cns: Cns,
    otu: Otu,
}

impl OxTox {
    pub fn cns(&self) -> Cns {
        self.cns
    }

    pub fn otu(&self) -> Otu {
        self.otu
    }

    /// Accumulate toxicity for a segment spent at the given ppO2.
    /// CNS follows the NOAA step rates and eliminates with a 90-minute
    /// half-time below 0.5 bar; OTU never decays in-dive.
    pub fn recalculate(&mut self, pp_o2: Pressure, time: Time) {
        let minutes = time.as_minutes();

        match Self::cns_rate_percent_per_min(pp_o2) {
            Some(rate) => self.cns += rate * minutes,
            None => {
                self.cns /= math::powf(2., minutes / CNS_ELIMINATION_HALF_TIME_MINUTES);
            }
        }
        self.cns = self.cns.clamp(0., 100.);

        if pp_o2 > OX_TOX_THRESHOLD_PP_O2 {
            self.otu += math::powf((pp_o2 - 0.5) / 0.5, 5. / 6.) * minutes;
        }
    }

    // NOAA CNS uptake rate by ppO2 band; None below the 0.5 bar floor
    fn cns_rate_percent_per_min(pp_o2: Pressure) -> Option<f32> {
        if pp_o2 <= OX_TOX_THRESHOLD_PP_O2 {
            return None;
        }
        for (upper_bound, limit_minutes) in CNS_SINGLE_EXPOSURE_LIMITS {
            if pp_o2 <= upper_bound {
                return Some(100. / limit_minutes);
            }
        }
        None
    }
}
