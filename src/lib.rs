#![cfg_attr(feature = "no-std", no_std)]

mod ccr;
mod common;
mod computer;
mod config;
mod dive;
mod hal;
mod zhl16;

pub use ccr::{
    CcrManager, CellStatus, LoopMode, O2Cell, CELL_MV_WINDOW, DEFAULT_CELL_CALIBRATION,
    NUM_O2_CELLS,
};

pub use common::{
    AscentRatePerMinute, Celsius, Cns, ConfigValidationErr, Depth, DepthType, GasIndex, GasMix,
    GradientFactor, GradientFactors, MbarPressure, Millivolts, Otu, OxTox, PartialPressures,
    Pressure, SensorFault, Sim, StorageFault, Time, Unit, Units,
};

pub use computer::{Alarm, AlarmSeverity, DisplayState, DiveComputer, OperatingMode};
pub use config::SystemConfig;
pub use dive::{
    sample_events, DiveEvent, DiveManager, DivePhase, DiveProfile, DiveSample, ModelSnapshot,
    MAX_DIVE_SAMPLES, SAMPLE_WIRE_BYTES,
};
pub use hal::{ButtonEvent, Hal};
pub use zhl16::{
    plan_ascent, AscentPlan, Compartment, DecoConfig, DecoStop, GasTable, InspiredPressures,
    Supersaturation, Zhl16Model, ZhlVariant, MAX_DECO_STOPS, MAX_GASES, NUM_COMPARTMENTS,
};
