use crate::common::Pressure;

// (ppO2 upper bound, NOAA single exposure limit in minutes)
pub type CnsLimitRow = (Pressure, f32);

pub const CNS_SINGLE_EXPOSURE_LIMITS: [CnsLimitRow; 12] = [
    (0.6, 720.),
    (0.7, 570.),
    (0.8, 450.),
    (0.9, 360.),
    (1.0, 300.),
    (1.1, 240.),
    (1.2, 210.),
    (1.3, 180.),
    (1.4, 150.),
    (1.5, 120.),
    (1.6, 45.),
    (f32::INFINITY, 6.),
];
