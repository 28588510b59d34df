#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type ZhlParam = f32;
// N2 half-time, N2 a coefficient, N2 b coefficient, He half-time
pub type ZhlParams = (ZhlParam, ZhlParam, ZhlParam, ZhlParam);

/// Coefficient table selection; C tightens the N2 a-coefficients of the
/// middle compartments.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ZhlVariant {
    B,
    C,
}

impl ZhlVariant {
    pub fn params(&self) -> &'static [ZhlParams; 16] {
        match self {
            Self::B => &ZHL_16B_VALUES,
            Self::C => &ZHL_16C_VALUES,
        }
    }
}

pub const ZHL_16B_VALUES: [ZhlParams; 16] = [
    (4., 1.2599, 0.5050, 1.51),
    (8., 1.0000, 0.6514, 3.02),
    (12.5, 0.8618, 0.7222, 4.72),
    (18.5, 0.7562, 0.7825, 6.99),
    (27., 0.6667, 0.8126, 10.21),
    (38.3, 0.5933, 0.8434, 14.48),
    (54.3, 0.5282, 0.8693, 20.53),
    (77., 0.4701, 0.8910, 29.11),
    (109., 0.4187, 0.9092, 41.20),
    (146., 0.3798, 0.9222, 55.19),
    (187., 0.3497, 0.9319, 70.69),
    (239., 0.3223, 0.9403, 90.34),
    (305., 0.2971, 0.9477, 115.29),
    (390., 0.2737, 0.9544, 147.42),
    (498., 0.2523, 0.9602, 188.24),
    (635., 0.2327, 0.9653, 240.03),
];

pub const ZHL_16C_VALUES: [ZhlParams; 16] = [
    (4., 1.2599, 0.5050, 1.51),
    (8., 1.0000, 0.6514, 3.02),
    (12.5, 0.8618, 0.7222, 4.72),
    (18.5, 0.7562, 0.7825, 6.99),
    (27., 0.6200, 0.8126, 10.21),
    (38.3, 0.5043, 0.8434, 14.48),
    (54.3, 0.4410, 0.8693, 20.53),
    (77., 0.4000, 0.8910, 29.11),
    (109., 0.3750, 0.9092, 41.20),
    (146., 0.3500, 0.9222, 55.19),
    (187., 0.3295, 0.9319, 70.69),
    (239., 0.3065, 0.9403, 90.34),
    (305., 0.2835, 0.9477, 115.29),
    (390., 0.2610, 0.9544, 147.42),
    (498., 0.2480, 0.9602, 188.24),
    (635., 0.2327, 0.9653, 240.03),
];
