use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ampere(pub f64);

impl Display for Ampere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} A", self.0)
    }
}

impl From<f64> for Ampere {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
