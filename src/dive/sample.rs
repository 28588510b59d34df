#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const SAMPLE_WIRE_BYTES: usize = 11;

/// Event bits recorded alongside each profile sample.
pub mod sample_events {
    pub const ASCENT_RATE: u16 = 1 << 0;
    pub const DECO_VIOLATION: u16 = 1 << 1;
    pub const GAS_SWITCH: u16 = 1 << 2;
    pub const PP_O2_HIGH: u16 = 1 << 3;
    pub const PP_O2_LOW: u16 = 1 << 4;
    pub const SAFETY_STOP: u16 = 1 << 5;
    pub const BOOKMARK: u16 = 1 << 6;
}

/// One packed profile sample, written little-endian field by field on the
/// wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiveSample {
    /// seconds since dive start
    pub time: u16,
    /// depth in centimeters
    pub depth_cm: i16,
    /// temperature in 0.1 C
    pub temperature_dc: i16,
    pub gas_index: u8,
    /// remaining deco minutes
    pub deco_minutes: u8,
    /// CNS percent
    pub cns: u8,
    pub events: u16,
}

impl DiveSample {
    pub fn to_le_bytes(&self) -> [u8; SAMPLE_WIRE_BYTES] {
        let mut buf = [0u8; SAMPLE_WIRE_BYTES];
        buf[0..2].copy_from_slice(&self.time.to_le_bytes());
        buf[2..4].copy_from_slice(&self.depth_cm.to_le_bytes());
        buf[4..6].copy_from_slice(&self.temperature_dc.to_le_bytes());
        buf[6] = self.gas_index;
        buf[7] = self.deco_minutes;
        buf[8] = self.cns;
        buf[9..11].copy_from_slice(&self.events.to_le_bytes());
        buf
    }

    pub fn from_le_bytes(buf: &[u8; SAMPLE_WIRE_BYTES]) -> Self {
        Self {
            time: u16::from_le_bytes([buf[0], buf[1]]),
            depth_cm: i16::from_le_bytes([buf[2], buf[3]]),
            temperature_dc: i16::from_le_bytes([buf[4], buf[5]]),
            gas_index: buf[6],
            deco_minutes: buf[7],
            cns: buf[8],
            events: u16::from_le_bytes([buf[9], buf[10]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout() {
        let sample = DiveSample {
            time: 0x0201,
            depth_cm: 1850,
            temperature_dc: -15,
            gas_index: 2,
            deco_minutes: 7,
            cns: 12,
            events: sample_events::ASCENT_RATE | sample_events::SAFETY_STOP,
        };
        let bytes = sample.to_le_bytes();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 0x02);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), 1850);
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), -15);
        assert_eq!(bytes[6], 2);
        assert_eq!(bytes[7], 7);
        assert_eq!(bytes[8], 12);
        assert_eq!(bytes[9], 0b0010_0001);
        assert_eq!(bytes[10], 0);
        assert_eq!(DiveSample::from_le_bytes(&bytes), sample);
    }
}
