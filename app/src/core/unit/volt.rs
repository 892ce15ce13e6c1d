use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volt(pub f64);

impl Display for Volt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} V", self.0)
    }
}

impl From<f64> for Volt {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
