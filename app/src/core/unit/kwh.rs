use std::{
    fmt::Display,
    ops::{Add, AddAssign, Mul},
};

use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloWattHours(pub f64);

impl Display for KiloWattHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kWh", self.0)
    }
}

impl From<&KiloWattHours> for f64 {
    fn from(value: &KiloWattHours) -> Self {
        value.0
    }
}

impl From<f64> for KiloWattHours {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Add for KiloWattHours {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        KiloWattHours(self.0 + rhs.0)
    }
}

impl AddAssign for KiloWattHours {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<f64> for KiloWattHours {
    type Output = f64;

    fn mul(self, rhs: f64) -> Self::Output {
        self.0 * rhs
    }
}
