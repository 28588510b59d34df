use core::{
    fmt,
    ops::{Add, AddAssign, Div, Mul, Sub},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::DepthType;

pub enum Units {
    Metric,
    Imperial,
}

pub trait Unit<T = f32>: Sized {
    fn from_units(val: T, units: Units) -> Self;
    fn to_units(&self, units: Units) -> T;
    fn base_unit(&self) -> T;
}

#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Depth {
    m: DepthType,
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, r"{}m \ {}ft", self.as_meters(), self.as_feet())
    }
}

impl PartialEq<Self> for Depth {
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m
    }
}

impl PartialOrd<Self> for Depth {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        self.m.partial_cmp(&other.m)
    }
}

impl Add<Self> for Depth {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self { m: self.m + rhs.m }
    }
}

impl Sub<Self> for Depth {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self { m: self.m - rhs.m }
    }
}

impl Mul<DepthType> for Depth {
    type Output = Self;

    fn mul(self, rhs: DepthType) -> Self::Output {
        Self { m: self.m * rhs }
    }
}

impl Div<Self> for Depth {
    type Output = DepthType;

    fn div(self, rhs: Self) -> Self::Output {
        self.m / rhs.m
    }
}

impl Div<DepthType> for Depth {
    type Output = Self;

    fn div(self, rhs: DepthType) -> Self::Output {
        Self { m: self.m / rhs }
    }
}

impl AddAssign for Depth {
    fn add_assign(&mut self, rhs: Self) {
        *self = Self { m: self.m + rhs.m }
    }
}

impl Unit for Depth {
    fn from_units(val: DepthType, units: Units) -> Self {
        match units {
            Units::Metric => Self::from_meters(val),
            Units::Imperial => Self::from_feet(val),
        }
    }
    fn to_units(&self, units: Units) -> DepthType {
        match units {
            Units::Metric => self.as_meters(),
            Units::Imperial => self.as_feet(),
        }
    }
    fn base_unit(&self) -> DepthType {
        self.m
    }
}

impl Depth {
    pub fn zero() -> Self {
        Self { m: 0. }
    }
    pub fn from_meters<T: Into<DepthType>>(val: T) -> Self {
        Self { m: val.into() }
    }
    pub fn from_feet<T: Into<DepthType>>(val: T) -> Self {
        Self {
            m: Self::ft_to_m(val.into()),
        }
    }
    pub fn as_meters(&self) -> DepthType {
        self.m
    }
    pub fn as_feet(&self) -> DepthType {
        Self::m_to_ft(self.m)
    }
    fn m_to_ft(m: DepthType) -> DepthType {
        m * 3.28084
    }
    fn ft_to_m(ft: DepthType) -> DepthType {
        ft * 0.3048
    }
}
