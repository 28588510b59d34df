use crate::common::{Depth, GasIndex, GasMix, MbarPressure, Pressure};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MAX_GASES: usize = 10;

/// Indexed table of breathing mixes; slots above `num_gases` are inert
/// placeholders.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GasTable {
    gases: [GasMix; MAX_GASES],
    num_gases: u8,
    current: GasIndex,
}

impl Default for GasTable {
    fn default() -> Self {
        Self {
            gases: core::array::from_fn(|_| GasMix::air().with_enabled(false)),
            num_gases: 0,
            current: 0,
        }
    }
}

impl GasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mix at the given slot, extending the table length as needed.
    pub fn add_gas(&mut self, idx: GasIndex, mix: GasMix) {
        if idx as usize >= MAX_GASES {
            panic!("Invalid gas index [{idx}]");
        }
        self.gases[idx as usize] = mix;
        if idx >= self.num_gases {
            self.num_gases = idx + 1;
        }
    }

    /// Activate a gas; refused for disabled slots.
    pub fn switch_gas(&mut self, idx: GasIndex) -> bool {
        if idx >= self.num_gases || !self.gases[idx as usize].is_enabled() {
            return false;
        }
        self.current = idx;
        true
    }

    /// Next enabled gas after the current one, wrapping; used by the gas
    /// cycle button.
    pub fn cycle_gas(&mut self) -> GasIndex {
        if self.num_gases > 0 {
            for offset in 1..=self.num_gases {
                let idx = (self.current + offset) % self.num_gases;
                if self.gases[idx as usize].is_enabled() {
                    self.current = idx;
                    break;
                }
            }
        }
        self.current
    }

    /// Enabled gas whose ppO2 at depth sits inside its configured window and
    /// is highest there; ties go to the lower index.
    pub fn best_gas_for(&self, depth: Depth, surface_pressure: MbarPressure) -> Option<GasIndex> {
        let mut best: Option<GasIndex> = None;
        let mut best_pp_o2: Pressure = 0.;

        for idx in 0..self.num_gases {
            let gas = &self.gases[idx as usize];
            if !gas.is_enabled() {
                continue;
            }
            let pp_o2 = gas.pp_o2_at(depth, surface_pressure);
            let (pp_o2_min, pp_o2_max) = gas.pp_o2_window();
            if pp_o2 < pp_o2_min || pp_o2 > pp_o2_max {
                continue;
            }
            if pp_o2 > best_pp_o2 {
                best_pp_o2 = pp_o2;
                best = Some(idx);
            }
        }

        best
    }

    /// First enabled bailout mix, if any.
    pub fn first_bailout_gas(&self) -> Option<GasIndex> {
        (0..self.num_gases)
            .find(|&idx| {
                let gas = &self.gases[idx as usize];
                gas.is_enabled() && gas.is_bailout()
            })
            .map(|idx| idx as GasIndex)
    }

    pub fn current(&self) -> GasIndex {
        self.current
    }

    pub fn current_gas(&self) -> &GasMix {
        &self.gases[self.current as usize]
    }

    pub fn gas(&self, idx: GasIndex) -> Option<&GasMix> {
        if idx >= self.num_gases {
            return None;
        }
        Some(&self.gases[idx as usize])
    }

    pub fn len(&self) -> usize {
        self.num_gases as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_gases == 0
    }
}
