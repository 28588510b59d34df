mod cns_table;
mod depth;
mod error;
mod gas;
pub(crate) mod math;
mod global_types;
mod ox_tox;
mod sim;
mod time;

pub use cns_table::{CnsLimitRow, CNS_SINGLE_EXPOSURE_LIMITS};
pub use depth::{Depth, Unit, Units};
pub use error::{ConfigValidationErr, SensorFault, StorageFault};
pub use gas::{GasMix, PartialPressures, ALVEOLI_WATER_VAPOR_PRESSURE};
pub use global_types::{
    AscentRatePerMinute, Celsius, Cns, DepthType, GasIndex, GradientFactor, GradientFactors,
    MbarPressure, Millivolts, Otu, Pressure,
};
pub use ox_tox::OxTox;
pub use sim::Sim;
pub use time::Time;
