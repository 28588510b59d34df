mod compartment;
mod config;
mod gas_table;
mod model;
mod planner;
mod zhl_values;

pub use compartment::{Compartment, InspiredPressures};
pub use config::DecoConfig;
pub use gas_table::{GasTable, MAX_GASES};
pub use model::{Supersaturation, Zhl16Model, NUM_COMPARTMENTS};
pub use planner::{plan_ascent, AscentPlan, DecoStop, MAX_DECO_STOPS};
pub use zhl_values::{ZhlParams, ZhlVariant, ZHL_16B_VALUES, ZHL_16C_VALUES};
