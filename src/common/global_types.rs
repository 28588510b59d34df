pub type Pressure = f32;
pub type DepthType = f32;
pub type GradientFactor = u8;
pub type GradientFactors = (u8, u8);
pub type MbarPressure = i32;
pub type AscentRatePerMinute = f32;
pub type Cns = f32;
pub type Otu = f32;
pub type Millivolts = f32;
pub type Celsius = f32;
pub type GasIndex = u8;
