use crate::common::{Celsius, Millivolts, SensorFault, StorageFault};
use crate::dive::DiveProfile;

/// Debounced button events; debounce and the long-press threshold are owned
/// by the hardware layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    Menu,
    Up,
    Down,
    Enter,
    MenuLong,
    EnterLong,
}

/// The hardware collaborator as seen by the core. Every sensor read uses a
/// bounded polling timeout on the real device; a timeout surfaces as a
/// `SensorFault`.
pub trait Hal {
    /// (pressure in mbar, temperature in C)
    fn read_pressure_temperature(&mut self) -> Result<(f32, Celsius), SensorFault>;

    /// Raw cell millivolts; polled only in rebreather modes.
    fn read_o2_cells(&mut self) -> Result<[Millivolts; 3], SensorFault>;

    fn button_event(&mut self) -> Option<ButtonEvent>;

    /// Free-running millisecond clock driving the cooperative scheduler.
    fn sys_millis(&mut self) -> u32;

    /// Epoch seconds from the RTC.
    fn unix_time(&mut self) -> u32;

    fn watchdog_feed(&mut self);

    fn battery_percent(&mut self) -> u8;

    /// Persist a finished dive to the logbook.
    fn save_dive(&mut self, profile: &DiveProfile) -> Result<(), StorageFault>;
}
